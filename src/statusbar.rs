use objc2::rc::Retained;
use objc2::runtime::Sel;
use objc2_app_kit::{NSMenu, NSMenuItem, NSStatusBar, NSStatusItem, NSVariableStatusItemLength};
use objc2_foundation::{MainThreadMarker, NSString};

pub struct StatusBar {
    _status_item: Retained<NSStatusItem>,
}

impl StatusBar {
    pub fn new(mtm: MainThreadMarker) -> Self {
        let status_bar = NSStatusBar::systemStatusBar();
        let status_item = status_bar.statusItemWithLength(NSVariableStatusItemLength);

        if let Some(button) = status_item.button(mtm) {
            button.setTitle(&NSString::from_str("\u{2702}")); // ✂
        }

        let menu = NSMenu::new(mtm);

        // Routed through the responder chain to the app delegate.
        let capture_item = unsafe {
            NSMenuItem::initWithTitle_action_keyEquivalent(
                mtm.alloc(),
                &NSString::from_str("Capture"),
                Some(Sel::register(c"captureScreenshot:")),
                &NSString::from_str(""),
            )
        };
        menu.addItem(&capture_item);

        menu.addItem(&NSMenuItem::separatorItem(mtm));

        let quit_item = unsafe {
            NSMenuItem::initWithTitle_action_keyEquivalent(
                mtm.alloc(),
                &NSString::from_str("Quit"),
                Some(Sel::register(c"terminate:")),
                &NSString::from_str("q"),
            )
        };
        menu.addItem(&quit_item);

        status_item.setMenu(Some(&menu));

        StatusBar { _status_item: status_item }
    }
}
