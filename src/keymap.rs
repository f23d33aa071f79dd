//! Host key codes to session commands.

/// Something the user asked the session to do from the keyboard or a button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Confirm,
    Cancel,
    Undo,
    Redo,
    ClearAll,
    Copy,
    /// Pick the annotation colour at this palette index.
    SelectColor(usize),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub command: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { command: false, shift: false };
    pub const COMMAND: Modifiers = Modifiers { command: true, shift: false };
    pub const COMMAND_SHIFT: Modifiers = Modifiers { command: true, shift: true };
}

// macOS virtual key codes (kVK_*).
pub const KEY_C: u16 = 8;
pub const KEY_Z: u16 = 6;
pub const KEY_R: u16 = 15;
pub const KEY_RETURN: u16 = 36;
pub const KEY_DELETE: u16 = 51;
pub const KEY_ESCAPE: u16 = 53;
pub const KEY_KEYPAD_ENTER: u16 = 76;

/// Digit row 1 through 8, in palette order.
const DIGIT_KEYS: [u16; 8] = [18, 19, 20, 21, 23, 22, 26, 28];

pub fn command_for_key(key_code: u16, modifiers: Modifiers) -> Option<Command> {
    match (key_code, modifiers.command, modifiers.shift) {
        (KEY_ESCAPE, _, _) => Some(Command::Cancel),
        (KEY_RETURN | KEY_KEYPAD_ENTER, false, _) => Some(Command::Confirm),
        (KEY_Z, true, false) => Some(Command::Undo),
        (KEY_Z, true, true) => Some(Command::Redo),
        (KEY_DELETE, false, _) => Some(Command::Undo),
        (KEY_R, true, _) => Some(Command::ClearAll),
        (KEY_C, true, false) => Some(Command::Copy),
        (code, false, false) => DIGIT_KEYS.iter().position(|&k| k == code).map(Command::SelectColor),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_the_editing_shortcuts() {
        assert_eq!(command_for_key(KEY_ESCAPE, Modifiers::NONE), Some(Command::Cancel));
        assert_eq!(command_for_key(KEY_ESCAPE, Modifiers::COMMAND), Some(Command::Cancel));
        assert_eq!(command_for_key(KEY_RETURN, Modifiers::NONE), Some(Command::Confirm));
        assert_eq!(command_for_key(KEY_KEYPAD_ENTER, Modifiers::NONE), Some(Command::Confirm));
        assert_eq!(command_for_key(KEY_Z, Modifiers::COMMAND), Some(Command::Undo));
        assert_eq!(command_for_key(KEY_Z, Modifiers::COMMAND_SHIFT), Some(Command::Redo));
        assert_eq!(command_for_key(KEY_DELETE, Modifiers::NONE), Some(Command::Undo));
        assert_eq!(command_for_key(KEY_R, Modifiers::COMMAND), Some(Command::ClearAll));
        assert_eq!(command_for_key(KEY_C, Modifiers::COMMAND), Some(Command::Copy));
    }

    #[test]
    fn plain_letters_do_nothing() {
        assert_eq!(command_for_key(KEY_Z, Modifiers::NONE), None);
        assert_eq!(command_for_key(KEY_R, Modifiers::NONE), None);
        assert_eq!(command_for_key(KEY_C, Modifiers::NONE), None);
        assert_eq!(command_for_key(0, Modifiers::COMMAND), None);
    }

    #[test]
    fn digits_pick_palette_entries() {
        assert_eq!(command_for_key(18, Modifiers::NONE), Some(Command::SelectColor(0)));
        assert_eq!(command_for_key(22, Modifiers::NONE), Some(Command::SelectColor(5)));
        assert_eq!(command_for_key(28, Modifiers::NONE), Some(Command::SelectColor(7)));
        assert_eq!(command_for_key(18, Modifiers::COMMAND), None);
    }
}
