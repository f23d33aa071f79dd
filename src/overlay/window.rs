use std::cell::Cell;
use std::rc::Rc;

use objc2::rc::Retained;
use objc2::{define_class, msg_send, MainThreadOnly};
use objc2_app_kit::{NSApplication, NSBackingStoreType, NSColor, NSScreen, NSWindow, NSWindowStyleMask};
use objc2_core_graphics::kCGOverlayWindowLevel;
use objc2_foundation::MainThreadMarker;

use super::view::OverlayView;
use crate::capture::{CaptureError, CaptureSource};
use crate::geometry::Size;
use crate::session::CaptureSession;

// Borderless windows refuse key status unless told otherwise.
pub struct KeyableWindowIvars {}

define_class!(
    #[unsafe(super(NSWindow))]
    #[thread_kind = MainThreadOnly]
    #[name = "CropnoteKeyableWindow"]
    #[ivars = KeyableWindowIvars]
    pub struct KeyableWindow;

    impl KeyableWindow {
        #[unsafe(method(canBecomeKeyWindow))]
        fn can_become_key_window(&self) -> bool {
            true
        }

        #[unsafe(method(canBecomeMainWindow))]
        fn can_become_main_window(&self) -> bool {
            true
        }
    }
);

/// Full-screen window hosting the selection and annotation view.
pub struct OverlayWindow {
    pub window: Retained<KeyableWindow>,
    pub view: Retained<OverlayView>,
}

impl OverlayWindow {
    pub fn new(mtm: MainThreadMarker, session: CaptureSession, copied: Rc<Cell<bool>>) -> Option<Self> {
        let screen = NSScreen::mainScreen(mtm)?;
        let frame = screen.frame();

        let this = mtm.alloc().set_ivars(KeyableWindowIvars {});
        let window: Retained<KeyableWindow> = unsafe {
            msg_send![
                super(this),
                initWithContentRect: frame,
                styleMask: NSWindowStyleMask::Borderless,
                backing: NSBackingStoreType::Buffered,
                defer: false
            ]
        };

        window.setLevel(kCGOverlayWindowLevel as _);
        window.setOpaque(false);
        window.setBackgroundColor(Some(&NSColor::clearColor()));
        window.setHasShadow(false);
        window.setIgnoresMouseEvents(false);
        window.setAcceptsMouseMovedEvents(true);
        unsafe { window.setReleasedWhenClosed(false) };

        let view = OverlayView::new(mtm, frame, session, copied);
        window.setContentView(Some(&view));

        Some(OverlayWindow { window, view })
    }

    pub fn is_visible(&self) -> bool {
        self.window.isVisible()
    }

    /// Capture the main screen and put the overlay in front of it.
    pub fn capture_and_show(&self, source: &mut dyn CaptureSource, mtm: MainThreadMarker) -> Result<(), CaptureError> {
        let screen = NSScreen::mainScreen(mtm).ok_or(CaptureError::NoDisplay)?;
        let frame = screen.frame();

        self.view.start_capture(source, Size::new(frame.size.width, frame.size.height))?;
        self.window.setFrame_display(frame, true);

        // Activate first so the initial click reaches the view.
        #[allow(deprecated)]
        NSApplication::sharedApplication(mtm).activateIgnoringOtherApps(true);

        self.window.makeKeyAndOrderFront(None);
        self.window.makeFirstResponder(Some(&*self.view));
        Ok(())
    }

    pub fn hide(&self) {
        self.window.orderOut(None);
    }
}
