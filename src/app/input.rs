use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A key press reduced to what the session cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Other,
}

impl From<KeyEvent> for Key {
    fn from(key: KeyEvent) -> Self {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char(c) if ctrl => Key::Ctrl(c.to_ascii_lowercase()),
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Esc,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            _ => Key::Other,
        }
    }
}

/// Single-line text field with a character cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars, `0..=len`
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    /// Apply an editing key. Returns `false` for keys a text field does not use.
    pub fn handle(&mut self, key: Key) -> bool {
        match key {
            Key::Char(c) => self.insert(c),
            Key::Backspace => self.backspace(),
            Key::Delete => self.delete(),
            Key::Left => self.cursor = self.cursor.saturating_sub(1),
            Key::Right => self.cursor = (self.cursor + 1).min(self.value.chars().count()),
            Key::Home | Key::Ctrl('a') => self.cursor = 0,
            Key::End | Key::Ctrl('e') => self.cursor = self.value.chars().count(),
            Key::Ctrl('w') => {
                let before: String = self.value.chars().take(self.cursor).collect();
                let kept = before.trim_end().rfind(' ').map(|i| i + 1).unwrap_or(0);
                let rest: String = self.value.chars().skip(self.cursor).collect();
                self.value = format!("{}{}", &before[..kept], rest);
                self.cursor = before[..kept].chars().count();
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_event() {
        let ctrl_o = KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL);
        assert_eq!(Key::from(ctrl_o), Key::Ctrl('o'));

        let shift_g = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(Key::from(shift_g), Key::Char('G'));

        let f1 = KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(Key::from(f1), Key::Other);
    }

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut input = TextInput::new();
        for c in "née".chars() {
            input.handle(Key::Char(c));
        }
        assert_eq!(input.value(), "née");
        input.handle(Key::Left);
        input.handle(Key::Backspace);
        assert_eq!(input.value(), "ne");
        assert_eq!(input.cursor(), 1);
        input.handle(Key::Char('a'));
        assert_eq!(input.value(), "nae");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut input = TextInput::with_value("ab");
        input.handle(Key::Right);
        assert_eq!(input.cursor(), 2);
        input.handle(Key::Home);
        input.handle(Key::Backspace);
        assert_eq!(input.value(), "ab");
        input.handle(Key::Delete);
        assert_eq!(input.value(), "b");
    }

    #[test]
    fn test_delete_word() {
        let mut input = TextInput::with_value("daily notes draft");
        input.handle(Key::Ctrl('w'));
        assert_eq!(input.value(), "daily notes ");
        input.handle(Key::Ctrl('w'));
        assert_eq!(input.value(), "daily ");
    }

    #[test]
    fn test_unused_keys_are_reported() {
        let mut input = TextInput::new();
        assert!(!input.handle(Key::Enter));
        assert!(!input.handle(Key::Esc));
        assert!(!input.handle(Key::Up));
    }
}
