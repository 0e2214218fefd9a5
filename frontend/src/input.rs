//! Host keyboard to keypad mapping.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a host keypress means to the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeypadAction {
    /// Queue a scancode in the 8279 FIFO and raise RST5.5.
    Key(u8),
    /// The RESET key, wired straight to the CPU reset line.
    Reset,
    /// The VECT INTR key, wired to RST7.5.
    VectorInterrupt,
    /// Leave the emulator.
    Quit,
    /// Break into the debugger.
    Break,
}

pub fn translate(event: &KeyEvent) -> Option<KeypadAction> {
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') => Some(KeypadAction::Break),
            _ => None,
        };
    }
    match event.code {
        KeyCode::Char(c) => char_action(c),
        _ => None,
    }
}

/// Translate one character the way the keypad legend reads. Also used for
/// `-i` startup injection.
pub fn char_action(c: char) -> Option<KeypadAction> {
    match c {
        '0'..='9' => Some(KeypadAction::Key(c as u8 - b'0')),
        'A'..='F' => Some(KeypadAction::Key(c as u8 - b'A' + 0x0A)),
        'a'..='f' => Some(KeypadAction::Key(c as u8 - b'a' + 0x0A)),
        '.' => Some(KeypadAction::Key(0x10)), // Exec
        ',' => Some(KeypadAction::Key(0x11)), // Next
        'G' | 'g' => Some(KeypadAction::Key(0x12)), // Go
        'M' | 'm' => Some(KeypadAction::Key(0x13)), // Substitute Memory
        'X' | 'x' => Some(KeypadAction::Key(0x14)), // Examine Registers
        'S' | 's' => Some(KeypadAction::Key(0x15)), // Single Step
        'R' | 'r' => Some(KeypadAction::Reset),
        'I' | 'i' => Some(KeypadAction::VectorInterrupt),
        'Q' | 'q' => Some(KeypadAction::Quit),
        _ => None,
    }
}
