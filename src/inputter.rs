use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor backing a column's filter input.
///
/// The cursor counts characters, not bytes.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
    /// The text differs from what it was before the key press.
    pub changed: bool,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        let before = self.current_input.clone();
        let mut result = match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => self.home(),
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => self.end(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.clear_line(),
            (kc, km) => self.key(kc, km),
        };
        result.changed = !self.canceled && before != self.current_input;
        trace!("Input {:?} -> {:?}", key.code, result.input);
        result
    }

    /// Replaces the text and puts the cursor at its end.
    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = s.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
            changed: false,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    /// The part of the text that fits `width` characters, scrolled so the
    /// cursor stays visible, and the cursor offset within it.
    pub fn visible(&self, width: usize) -> (String, usize) {
        if width == 0 {
            return (String::new(), 0);
        }
        let skip = (self.curser_pos + 1).saturating_sub(width);
        let text = self
            .current_input
            .chars()
            .skip(skip)
            .take(width)
            .collect();
        (text, self.curser_pos - skip)
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let idx = self.getbytepos();
            self.current_input.remove(idx);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            let idx = self.getbytepos();
            self.current_input.remove(idx);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.curser_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.curser_pos = self.current_input.chars().count();
        self.get()
    }

    fn clear_line(&mut self) -> InputResult {
        self.current_input.clear();
        self.curser_pos = 0;
        self.get()
    }

    fn key(&mut self, code: KeyCode, modifier: KeyModifiers) -> InputResult {
        if modifier.contains(KeyModifiers::CONTROL) || modifier.contains(KeyModifiers::ALT) {
            return self.get();
        }
        if let Some(chr) = code.as_char() {
            let idx = self.getbytepos();
            self.current_input.insert(idx, chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut Inputter, code: KeyCode) -> InputResult {
        input.read(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn edits_in_the_middle_of_multibyte_text() {
        let mut input = Inputter::default();
        input.set("zürich");
        assert_eq!(input.get().curser_pos, 6);
        press(&mut input, KeyCode::Home);
        press(&mut input, KeyCode::Right);
        press(&mut input, KeyCode::Right);
        let result = press(&mut input, KeyCode::Backspace);
        assert_eq!(result.input, "zrich");
        assert!(result.changed);
        let result = press(&mut input, KeyCode::Char('ü'));
        assert_eq!(result.input, "zürich");
        assert_eq!(result.curser_pos, 2);
    }

    #[test]
    fn cursor_moves_do_not_count_as_changes() {
        let mut input = Inputter::default();
        input.set("abc");
        assert!(!press(&mut input, KeyCode::Left).changed);
        assert!(!press(&mut input, KeyCode::Enter).changed);
        assert!(input.get().finished);
    }

    #[test]
    fn escape_cancels_and_clears() {
        let mut input = Inputter::default();
        input.set("abc");
        let result = press(&mut input, KeyCode::Esc);
        assert!(result.canceled);
        assert!(result.finished);
        assert!(!result.changed);
        assert!(result.input.is_empty());
    }

    #[test]
    fn visible_window_follows_cursor() {
        let mut input = Inputter::default();
        input.set("abcdef");
        assert_eq!(input.visible(4), ("def".to_string(), 3));
        press(&mut input, KeyCode::Home);
        assert_eq!(input.visible(4), ("abcd".to_string(), 0));
    }
}
