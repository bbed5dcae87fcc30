use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

/// Single-line editable buffer with a prompt and a character limit.
///
/// The cursor is a char index into the value, `0..=len`.
#[derive(Debug, Clone)]
pub struct TextInput {
    pub prompt: String,
    pub prompt_style: Style,
    pub text_style: Style,
    pub cursor_style: Style,
    /// Visible columns for the value; 0 means unbounded
    pub width: u16,
    /// Maximum number of chars; 0 means unlimited
    pub char_limit: usize,
    value: Vec<char>,
    cursor: usize,
}

impl Default for TextInput {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            prompt_style: Style::default(),
            text_style: Style::default(),
            cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            width: 0,
            char_limit: 0,
            value: Vec::new(),
            cursor: 0,
        }
    }
}

impl TextInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_styles(mut self, prompt: Style, text: Style, cursor: Style) -> Self {
        self.prompt_style = prompt;
        self.text_style = text;
        self.cursor_style = cursor;
        self
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn with_limit(mut self, char_limit: usize) -> Self {
        self.char_limit = char_limit;
        self
    }

    pub fn value(&self) -> String {
        self.value.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the value, truncated to the char limit. The cursor is clamped.
    pub fn set_value(&mut self, value: &str) {
        let mut chars: Vec<char> = value.chars().filter(|c| !c.is_control()).collect();
        if self.char_limit > 0 {
            chars.truncate(self.char_limit);
        }
        self.value = chars;
        self.cursor = self.cursor.min(self.value.len());
    }

    pub fn cursor_start(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.value.len();
    }

    pub fn reset(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn insert(&mut self, c: char) {
        if self.char_limit > 0 && self.value.len() >= self.char_limit {
            return;
        }
        self.value.insert(self.cursor, c);
        self.cursor += 1;
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.value.remove(self.cursor);
        }
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    fn delete_word_before_cursor(&mut self) {
        let mut start = self.cursor;
        while start > 0 && self.value[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.value[start - 1].is_whitespace() {
            start -= 1;
        }
        self.value.drain(start..self.cursor);
        self.cursor = start;
    }

    fn word_left(&mut self) {
        while self.cursor > 0 && self.value[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
        while self.cursor > 0 && !self.value[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
    }

    fn word_right(&mut self) {
        let len = self.value.len();
        while self.cursor < len && self.value[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
        while self.cursor < len && !self.value[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
    }

    /// Editing and cursor keys. Returns false for keys it doesn't know.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('a') if ctrl => self.cursor_start(),
            KeyCode::Char('e') if ctrl => self.cursor_end(),
            KeyCode::Char('b') if ctrl => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('f') if ctrl => self.cursor = (self.cursor + 1).min(self.value.len()),
            KeyCode::Char('h') if ctrl => self.delete_before_cursor(),
            KeyCode::Char('d') if ctrl => self.delete_at_cursor(),
            KeyCode::Char('w') if ctrl => self.delete_word_before_cursor(),
            KeyCode::Char('u') if ctrl => {
                self.value.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char('k') if ctrl => self.value.truncate(self.cursor),
            KeyCode::Char('b') if alt => self.word_left(),
            KeyCode::Char('f') if alt => self.word_right(),
            KeyCode::Char(c) if !ctrl && !alt => self.insert(c),
            KeyCode::Backspace if alt => self.delete_word_before_cursor(),
            KeyCode::Backspace => self.delete_before_cursor(),
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Left if ctrl => self.word_left(),
            KeyCode::Right if ctrl => self.word_right(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.value.len()),
            KeyCode::Home => self.cursor_start(),
            KeyCode::End => self.cursor_end(),
            _ => return false,
        }
        true
    }

    /// Window of the value that keeps the cursor visible within `width`.
    fn visible_range(&self) -> (usize, usize) {
        if self.width == 0 {
            return (0, self.value.len());
        }
        let width = self.width as usize;
        let char_width = |c: &char| c.width().unwrap_or(0);

        // Walk back from the cursor; the cursor cell itself takes one column
        let mut start = self.cursor;
        let mut used = 1;
        while start > 0 {
            let w = char_width(&self.value[start - 1]);
            if used + w > width {
                break;
            }
            used += w;
            start -= 1;
        }

        let mut end = self.cursor;
        if end < self.value.len() {
            // the char under the cursor shares the cursor cell
            used -= 1;
        }
        while end < self.value.len() {
            let w = char_width(&self.value[end]);
            if used + w > width {
                break;
            }
            used += w;
            end += 1;
        }
        (start, end)
    }

    /// Prompt, value and cursor as one line.
    pub fn view(&self) -> Line<'static> {
        let (start, end) = self.visible_range();
        let mut spans = vec![Span::styled(self.prompt.clone(), self.prompt_style)];

        let before: String = self.value[start..self.cursor].iter().collect();
        if !before.is_empty() {
            spans.push(Span::styled(before, self.text_style));
        }

        if self.cursor < end {
            spans.push(Span::styled(
                self.value[self.cursor].to_string(),
                self.cursor_style,
            ));
            let after: String = self.value[self.cursor + 1..end].iter().collect();
            if !after.is_empty() {
                spans.push(Span::styled(after, self.text_style));
            }
        } else {
            spans.push(Span::styled(" ", self.cursor_style));
        }

        Line::from(spans)
    }
}
