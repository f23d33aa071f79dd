use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

pub struct HotkeyManager {
    _manager: GlobalHotKeyManager,
    capture_hotkey_id: u32,
}

impl HotkeyManager {
    /// Register Ctrl+Shift+A as the capture shortcut.
    pub fn new() -> Result<Self, global_hotkey::Error> {
        let manager = GlobalHotKeyManager::new()?;

        let capture_hotkey = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyA);
        manager.register(capture_hotkey)?;

        log::info!("Global hotkey registered: Ctrl+Shift+A (id={})", capture_hotkey.id());

        Ok(HotkeyManager { _manager: manager, capture_hotkey_id: capture_hotkey.id() })
    }

    /// True if the capture shortcut was pressed since the last poll.
    pub fn capture_pressed(&self) -> bool {
        let mut pressed = false;
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.id() == self.capture_hotkey_id && event.state() == HotKeyState::Pressed {
                pressed = true;
            }
        }
        pressed
    }
}
