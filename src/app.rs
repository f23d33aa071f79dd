use std::cell::{Cell, RefCell};
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject};
use objc2::{define_class, msg_send, sel, DefinedClass, MainThreadOnly};
use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy, NSApplicationDelegate};
use objc2_core_graphics::CGMainDisplayID;
use objc2_foundation::{MainThreadMarker, NSNotification, NSObject, NSObjectProtocol, NSTimer};

use crate::capture::DisplayCapture;
use crate::config::Settings;
use crate::export::SystemClipboard;
use crate::hotkey::HotkeyManager;
use crate::overlay::OverlayWindow;
use crate::scheduler::DeferredAction;
use crate::session::{CaptureSession, Notification};
use crate::statusbar::StatusBar;

pub struct AppDelegateIvars {
    status_bar: RefCell<Option<StatusBar>>,
    hotkey_manager: RefCell<Option<HotkeyManager>>,
    overlay: OverlayWindow,
    display: RefCell<DisplayCapture>,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "CropnoteAppDelegate"]
    #[ivars = AppDelegateIvars]
    pub struct AppDelegate;

    unsafe impl NSObjectProtocol for AppDelegate {}

    unsafe impl NSApplicationDelegate for AppDelegate {
        #[unsafe(method(applicationDidFinishLaunching:))]
        fn application_did_finish_launching(&self, _notification: &NSNotification) {
            let mtm = MainThreadMarker::from(self);

            *self.ivars().status_bar.borrow_mut() = Some(StatusBar::new(mtm));

            match HotkeyManager::new() {
                Ok(manager) => *self.ivars().hotkey_manager.borrow_mut() = Some(manager),
                Err(e) => log::warn!("Global hotkey unavailable: {}", e),
            }

            if !self.ivars().display.borrow().has_permission() {
                log::warn!("[CAPTURE] Screen recording permission not granted yet");
            }

            // Hotkeys and deferred actions are polled from one 100ms timer.
            let target: &AnyObject = unsafe { &*(self as *const Self as *const AnyObject) };
            unsafe {
                NSTimer::scheduledTimerWithTimeInterval_target_selector_userInfo_repeats(
                    0.1,
                    target,
                    sel!(tick:),
                    None,
                    true,
                );
            }

            log::info!("cropnote started. Use Ctrl+Shift+A to capture.");
        }
    }

    impl AppDelegate {
        #[unsafe(method(tick:))]
        fn tick(&self, _timer: &NSObject) {
            let pressed = self
                .ivars()
                .hotkey_manager
                .borrow()
                .as_ref()
                .is_some_and(HotkeyManager::capture_pressed);
            if pressed {
                log::debug!("Capture hotkey pressed");
                self.trigger_capture();
            }

            for action in self.ivars().overlay.view.tick(Instant::now()) {
                if action == DeferredAction::Recapture {
                    self.capture_now();
                }
            }
        }

        #[unsafe(method(captureScreenshot:))]
        fn capture_screenshot(&self, _sender: &AnyObject) {
            self.trigger_capture();
        }
    }
);

impl AppDelegate {
    fn new(mtm: MainThreadMarker, overlay: OverlayWindow) -> Retained<Self> {
        let this = mtm.alloc().set_ivars(AppDelegateIvars {
            status_bar: RefCell::new(None),
            hotkey_manager: RefCell::new(None),
            overlay,
            display: RefCell::new(DisplayCapture::new(CGMainDisplayID())),
        });
        unsafe { msg_send![super(this), init] }
    }

    /// Capture right away, or after the overlay has left the screen if it is up.
    fn trigger_capture(&self) {
        let overlay = &self.ivars().overlay;
        if overlay.is_visible() {
            overlay.hide();
            overlay.view.request_recapture(Instant::now());
        } else {
            self.capture_now();
        }
    }

    fn capture_now(&self) {
        let mtm = MainThreadMarker::from(self);
        let overlay = &self.ivars().overlay;
        let mut display = self.ivars().display.borrow_mut();
        if let Err(e) = overlay.capture_and_show(&mut *display, mtm) {
            log::error!("[CAPTURE] {}", e);
            if overlay.view.is_active() {
                overlay.view.reset();
            }
        }
    }
}

/// Run the status-bar app until quit.
pub fn run(settings: Settings) -> ExitCode {
    let Some(mtm) = MainThreadMarker::new() else {
        log::error!("cropnote must be started on the main thread");
        return ExitCode::FAILURE;
    };

    let clipboard = match SystemClipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            log::error!("[EXPORT] {}", e);
            return ExitCode::FAILURE;
        }
    };

    let copied = Rc::new(Cell::new(false));
    let feedback = copied.clone();
    let session = CaptureSession::new(settings, Box::new(clipboard), move |notification| {
        match notification {
            Notification::Copied => feedback.set(true),
            Notification::CopiedFeedbackEnded => feedback.set(false),
            other => log::debug!("[SESSION] {:?}", other),
        }
    });

    let Some(overlay) = OverlayWindow::new(mtm, session, copied) else {
        log::error!("[CAPTURE] No main screen");
        return ExitCode::FAILURE;
    };

    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

    let delegate = AppDelegate::new(mtm, overlay);
    let delegate_proto: &ProtocolObject<dyn NSApplicationDelegate> = ProtocolObject::from_ref(&*delegate);
    app.setDelegate(Some(delegate_proto));

    app.run();
    ExitCode::SUCCESS
}
