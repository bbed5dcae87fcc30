use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Text};
use ratatui::widgets::Paragraph;

/// Scrollable region over pre-rendered lines.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
    /// Index of the first visible line
    pub y_offset: usize,
    lines: Vec<Line<'static>>,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Replace the content, keeping the scroll position when it still fits.
    pub fn set_content(&mut self, text: Text<'static>) {
        self.lines = text.lines;
        self.y_offset = self.y_offset.min(self.max_offset());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.y_offset = 0;
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height as usize)
    }

    pub fn at_top(&self) -> bool {
        self.y_offset == 0
    }

    pub fn at_bottom(&self) -> bool {
        self.y_offset >= self.max_offset()
    }

    /// Fraction of the content scrolled past, 0.0 at the top and 1.0 at the
    /// bottom. Content that fits on one screen counts as fully scrolled.
    pub fn scroll_percent(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            return 1.0;
        }
        self.y_offset as f64 / max as f64
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.y_offset = self.y_offset.saturating_add(lines).min(self.max_offset());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.y_offset = self.y_offset.saturating_sub(lines);
    }

    pub fn goto_top(&mut self) {
        self.y_offset = 0;
    }

    pub fn goto_bottom(&mut self) {
        self.y_offset = self.max_offset();
    }

    fn half_page(&self) -> usize {
        (self.height as usize / 2).max(1)
    }

    fn page(&self) -> usize {
        (self.height as usize).max(1)
    }

    /// Built-in scrolling keys. Returns false for keys it doesn't know.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down if !ctrl => self.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up if !ctrl => self.scroll_up(1),
            KeyCode::Char('d') if ctrl => self.scroll_down(self.half_page()),
            KeyCode::Char('u') if ctrl => self.scroll_up(self.half_page()),
            KeyCode::Char('d') => self.scroll_down(self.half_page()),
            KeyCode::Char('u') => self.scroll_up(self.half_page()),
            KeyCode::Char('f') | KeyCode::Char(' ') | KeyCode::PageDown => {
                self.scroll_down(self.page())
            }
            KeyCode::Char('b') | KeyCode::PageUp => self.scroll_up(self.page()),
            KeyCode::Char('g') | KeyCode::Home => self.goto_top(),
            KeyCode::Char('G') | KeyCode::End => self.goto_bottom(),
            _ => return false,
        }
        true
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let end = (self.y_offset + area.height as usize).min(self.lines.len());
        let start = self.y_offset.min(end);
        let visible: Vec<Line<'static>> = self.lines[start..end].to_vec();
        f.render_widget(Paragraph::new(Text::from(visible)), area);
    }
}
