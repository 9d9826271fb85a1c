use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::sftp_logic::BrowserAction;

/// Ctrl+C leaves from any screen, including text entry.
pub fn is_force_quit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}

/// `q` quits wherever it is not being typed into a field.
pub fn is_quit(key: &KeyEvent) -> bool {
    key.modifiers.difference(KeyModifiers::SHIFT).is_empty() && key.code == KeyCode::Char('q')
}

pub fn browser_action(key: &KeyEvent) -> Option<BrowserAction> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => BrowserAction::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => BrowserAction::MoveDown,
        KeyCode::PageUp => BrowserAction::PageUp,
        KeyCode::PageDown => BrowserAction::PageDown,
        KeyCode::Home | KeyCode::Char('g') => BrowserAction::Top,
        KeyCode::End | KeyCode::Char('G') => BrowserAction::Bottom,
        KeyCode::Char(' ') => BrowserAction::ToggleSelection,
        KeyCode::Enter => BrowserAction::Activate,
        KeyCode::Right | KeyCode::Char('l') => BrowserAction::EnterDirectory,
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Backspace => BrowserAction::GoParent,
        KeyCode::Tab | KeyCode::BackTab => BrowserAction::SwitchFocus,
        KeyCode::Char('r') => BrowserAction::Refresh,
        KeyCode::Char('c') => BrowserAction::Copy,
        _ => return None,
    };
    Some(action)
}

/// Printable input for text fields; control chords are not text.
pub fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            Some(c)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn vim_and_arrow_keys_share_actions() {
        assert_eq!(browser_action(&key(KeyCode::Char('j'))), Some(BrowserAction::MoveDown));
        assert_eq!(browser_action(&key(KeyCode::Down)), Some(BrowserAction::MoveDown));
        assert_eq!(browser_action(&key(KeyCode::Char('h'))), Some(BrowserAction::GoParent));
        assert_eq!(browser_action(&key(KeyCode::Backspace)), Some(BrowserAction::GoParent));
        assert_eq!(browser_action(&key(KeyCode::Right)), Some(BrowserAction::EnterDirectory));
        assert_eq!(browser_action(&key(KeyCode::Char(' '))), Some(BrowserAction::ToggleSelection));
        assert_eq!(browser_action(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ctrl_c_is_not_copy() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(is_force_quit(&ctrl_c));
        assert_eq!(browser_action(&ctrl_c), None);
        assert_eq!(typed_char(&ctrl_c), None);
        assert_eq!(browser_action(&key(KeyCode::Char('c'))), Some(BrowserAction::Copy));
    }

    #[test]
    fn shifted_letters_are_typed() {
        let shifted = KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT);
        assert_eq!(typed_char(&shifted), Some('P'));
        assert!(is_quit(&key(KeyCode::Char('q'))));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));
    }
}
