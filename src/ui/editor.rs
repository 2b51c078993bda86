use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    None,
    Submit(String),
    /// Ctrl+C: cancel the active run.
    Interrupt,
    Quit,
    ScrollUp,
    ScrollDown,
}

/// Single-line prompt buffer with submit history.
#[derive(Debug, Default)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    stash: Option<String>,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Byte offset of the cursor, always on a char boundary.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_str(&mut self, value: &str) {
        self.leave_history();
        let value: String = value.chars().filter(|ch| *ch != '\n' && *ch != '\r').collect();
        self.buffer.insert_str(self.cursor, &value);
        self.cursor += value.len();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.leave_history();
        let start = self.prev_boundary();
        self.buffer.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.buffer.len() {
            return;
        }
        self.leave_history();
        let end = self.next_boundary();
        self.buffer.replace_range(self.cursor..end, "");
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary();
    }

    pub fn move_right(&mut self) {
        self.cursor = self.next_boundary();
    }

    /// Take the trimmed buffer, recording it in history. Blank input yields `None`.
    pub fn submit(&mut self) -> Option<String> {
        let value = self.buffer.trim().to_string();
        if value.is_empty() {
            return None;
        }
        if self.history.last() != Some(&value) {
            self.history.push(value.clone());
        }
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
        self.stash = None;
        Some(value)
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => {
                self.stash = Some(self.buffer.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(index) => index - 1,
        };
        self.history_index = Some(index);
        self.set_buffer(self.history[index].clone());
    }

    pub fn history_down(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.set_buffer(self.history[index + 1].clone());
        } else {
            self.history_index = None;
            let stash = self.stash.take().unwrap_or_default();
            self.set_buffer(stash);
        }
    }

    pub fn apply_event(&mut self, event: Event) -> InputAction {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.apply_key(key),
            Event::Paste(text) => {
                self.insert_str(&text);
                InputAction::None
            }
            _ => InputAction::None,
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> InputAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => InputAction::Interrupt,
            KeyCode::Char('d') if ctrl => InputAction::Quit,
            KeyCode::Char('u') if ctrl => {
                self.set_buffer(String::new());
                InputAction::None
            }
            KeyCode::Char(ch) if !ctrl => {
                let mut encoded = [0u8; 4];
                self.insert_str(ch.encode_utf8(&mut encoded));
                InputAction::None
            }
            KeyCode::Enter => match self.submit() {
                Some(value) => InputAction::Submit(value),
                None => InputAction::None,
            },
            KeyCode::Backspace => {
                self.backspace();
                InputAction::None
            }
            KeyCode::Delete => {
                self.delete();
                InputAction::None
            }
            KeyCode::Left => {
                self.move_left();
                InputAction::None
            }
            KeyCode::Right => {
                self.move_right();
                InputAction::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                InputAction::None
            }
            KeyCode::End => {
                self.cursor = self.buffer.len();
                InputAction::None
            }
            KeyCode::Up => {
                self.history_up();
                InputAction::None
            }
            KeyCode::Down => {
                self.history_down();
                InputAction::None
            }
            KeyCode::PageUp => InputAction::ScrollUp,
            KeyCode::PageDown => InputAction::ScrollDown,
            _ => InputAction::None,
        }
    }

    fn set_buffer(&mut self, value: String) {
        self.buffer = value;
        self.cursor = self.buffer.len();
    }

    fn leave_history(&mut self) {
        self.history_index = None;
        self.stash = None;
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|ch| self.cursor + ch.len_utf8())
            .unwrap_or(self.buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_typing_and_submit() {
        let mut editor = InputEditor::new();
        for ch in "hi there ".chars() {
            editor.apply_key(key(KeyCode::Char(ch)));
        }
        assert_eq!(
            editor.apply_key(key(KeyCode::Enter)),
            InputAction::Submit("hi there".to_string())
        );
        assert_eq!(editor.buffer(), "");
        assert_eq!(editor.apply_key(key(KeyCode::Enter)), InputAction::None);
    }

    #[test]
    fn test_backspace_and_delete_respect_multibyte_chars() {
        let mut editor = InputEditor::new();
        editor.insert_str("añb");
        editor.move_left();
        editor.backspace();
        assert_eq!(editor.buffer(), "ab");
        assert_eq!(editor.cursor(), 1);
        editor.delete();
        assert_eq!(editor.buffer(), "a");
    }

    #[test]
    fn test_pasted_newlines_are_dropped() {
        let mut editor = InputEditor::new();
        editor.apply_event(Event::Paste("one\r\ntwo".to_string()));
        assert_eq!(editor.buffer(), "onetwo");
    }

    #[test]
    fn test_history_navigation_restores_draft() {
        let mut editor = InputEditor::new();
        editor.insert_str("first");
        editor.submit();
        editor.insert_str("second");
        editor.submit();
        editor.insert_str("draft");

        editor.history_up();
        assert_eq!(editor.buffer(), "second");
        editor.history_up();
        assert_eq!(editor.buffer(), "first");
        editor.history_up();
        assert_eq!(editor.buffer(), "first");
        editor.history_down();
        assert_eq!(editor.buffer(), "second");
        editor.history_down();
        assert_eq!(editor.buffer(), "draft");
    }

    #[test]
    fn test_control_keys_map_to_actions() {
        let mut editor = InputEditor::new();
        assert_eq!(editor.apply_key(ctrl('c')), InputAction::Interrupt);
        assert_eq!(editor.apply_key(ctrl('d')), InputAction::Quit);
        assert_eq!(editor.apply_key(key(KeyCode::PageUp)), InputAction::ScrollUp);
        editor.insert_str("junk");
        editor.apply_key(ctrl('u'));
        assert_eq!(editor.buffer(), "");
    }
}
