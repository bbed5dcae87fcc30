//! The document pager: a scrollable rendered body with a one-line footer, and
//! a note editor that takes over the footer.
//!
//! [`PagerModel::update`] consumes one [`PagerEvent`] at a time and answers
//! with the [`Command`]s to run in the background. It never blocks and never
//! does I/O itself; command results come back later as further events.

pub mod footer;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Paragraph;

use crate::document::Document;
use crate::error::TerminalSizeError;
use crate::markdown_renderer::{RenderRequest, RenderedContent, StyleSelector, render_width};
use crate::note_store::{SaveNoteRequest, SavedNote};
use crate::theme::{Appearance, FUSCHIA, GRAY, YELLOW_GREEN};
use crate::widget::text_input::TextInput;
use crate::widget::viewport::Viewport;

pub const STATUS_BAR_HEIGHT: u16 = 1;
pub const NOTE_CHARACTER_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

impl TerminalSize {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug)]
pub enum PagerEvent {
    Key(KeyEvent),
    Resize(Result<TerminalSize, TerminalSizeError>),
    ContentRendered(RenderedContent),
    NoteSaved(SavedNote),
}

/// Background work requested by the pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Render(RenderRequest),
    SaveNote(SaveNoteRequest),
}

/// The edit buffer only exists while a note is being edited.
#[derive(Debug, Clone)]
pub enum Mode {
    Browse,
    EditNote(TextInput),
}

#[derive(Debug)]
pub struct PagerModel {
    mode: Mode,
    style: StyleSelector,
    appearance: Appearance,
    width: u16,
    height: u16,
    viewport: Viewport,
    document: Option<Document>,
    /// Bumped on every render request; only the latest result is applied
    generation: u64,
}

impl PagerModel {
    pub fn new(style: StyleSelector, appearance: Appearance) -> Self {
        Self {
            mode: Mode::Browse,
            style,
            appearance,
            width: 0,
            height: 0,
            viewport: Viewport::default(),
            document: None,
            generation: 0,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_editing_note(&self) -> bool {
        matches!(self.mode, Mode::EditNote(_))
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn size(&self) -> TerminalSize {
        TerminalSize::new(self.width, self.height)
    }

    /// Current edit buffer, if a note is being edited.
    pub fn note_input(&self) -> Option<&TextInput> {
        match &self.mode {
            Mode::EditNote(input) => Some(input),
            Mode::Browse => None,
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.viewport.width = width;
        self.viewport.height = height.saturating_sub(STATUS_BAR_HEIGHT);
        if let Mode::EditNote(input) = &mut self.mode {
            input.width = footer::note_input_width(width);
        }
    }

    /// Start a view session. A document still loaded from a previous session
    /// is dropped; callers that need it back should [`unload`](Self::unload)
    /// first.
    pub fn open(&mut self, document: Document) -> Vec<Command> {
        if let Some(previous) = self.unload() {
            warn!("Opening document {} dropped document {}", document.id, previous.id);
        }
        info!("Opening document {}", document.id);
        self.document = Some(document);
        self.render_command().into_iter().collect()
    }

    /// End the view session and hand the document back.
    pub fn unload(&mut self) -> Option<Document> {
        self.mode = Mode::Browse;
        self.viewport.clear();
        self.document.take()
    }

    pub fn update(&mut self, event: PagerEvent) -> Vec<Command> {
        match event {
            PagerEvent::Key(key) => self.handle_key(key),
            PagerEvent::Resize(Ok(size)) => {
                self.set_size(size.width, size.height);
                self.render_command().into_iter().collect()
            }
            PagerEvent::Resize(Err(e)) => {
                // The shell reports this one
                debug!("Ignoring failed resize: {e}");
                Vec::new()
            }
            PagerEvent::ContentRendered(content) => {
                self.apply_rendered(content);
                Vec::new()
            }
            PagerEvent::NoteSaved(saved) => {
                debug!("Note for document {} saved", saved.id);
                Vec::new()
            }
        }
    }

    fn render_command(&mut self) -> Option<Command> {
        let document = self.document.as_ref()?;
        self.generation += 1;
        Some(Command::Render(RenderRequest {
            document_id: document.id,
            generation: self.generation,
            markdown: document.body.clone(),
            width: render_width(self.viewport.width),
            style: self.style.clone(),
        }))
    }

    fn apply_rendered(&mut self, content: RenderedContent) {
        let Some(document) = &self.document else {
            debug!("Dropping rendered content, no document loaded");
            return;
        };
        if content.document_id != document.id || content.generation != self.generation {
            debug!(
                "Dropping stale render for document {} (generation {}, current {})",
                content.document_id, content.generation, self.generation
            );
            return;
        }
        self.viewport.set_content(content.text);
    }

    fn new_note_input(&self) -> TextInput {
        let field = Style::default().fg(GRAY).bg(YELLOW_GREEN);
        TextInput::new(footer::NOTE_PROMPT_TEXT)
            .with_styles(field, field, Style::default().fg(GRAY).bg(FUSCHIA))
            .with_width(footer::note_input_width(self.width))
            .with_limit(NOTE_CHARACTER_LIMIT)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        match &mut self.mode {
            Mode::EditNote(input) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc if plain => {
                    self.mode = Mode::Browse;
                    Vec::new()
                }
                KeyCode::Enter => {
                    let value = input.value();
                    self.mode = Mode::Browse;
                    self.commit_note(value).into_iter().collect()
                }
                _ => {
                    input.handle_key(key);
                    Vec::new()
                }
            },
            Mode::Browse => match key.code {
                KeyCode::Char('n') if plain => {
                    self.start_note_edit();
                    Vec::new()
                }
                // Quitting belongs to the shell
                KeyCode::Char('q') | KeyCode::Esc if plain => Vec::new(),
                _ => {
                    self.viewport.handle_key(key);
                    Vec::new()
                }
            },
        }
    }

    fn start_note_edit(&mut self) {
        let Some(document) = &self.document else {
            return;
        };
        if !document.kind.accepts_notes() {
            debug!("Document {} doesn't take notes", document.id);
            return;
        }

        // Leaving EditNote always drops the buffer, so a new edit starts from
        // the saved note
        let mut input = self.new_note_input();
        input.set_value(&document.note);
        input.cursor_end();
        self.mode = Mode::EditNote(input);
    }

    /// Apply the note locally and ask for it to be persisted. The local
    /// change stays even if saving fails later.
    fn commit_note(&mut self, value: String) -> Option<Command> {
        let document = self.document.as_mut()?;
        if value == document.note {
            return None;
        }
        document.note = value;
        Some(Command::SaveNote(SaveNoteRequest {
            id: document.id,
            note: document.note.clone(),
        }))
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let [body, footer_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .areas(area);

        self.viewport.render(f, body);

        let line = match &self.mode {
            Mode::EditNote(input) => footer::note_prompt(input),
            Mode::Browse => footer::status_bar(
                area.width,
                self.document.as_ref().map_or("", |doc| doc.note.as_str()),
                self.viewport.scroll_percent(),
                self.appearance,
            ),
        };
        f.render_widget(Paragraph::new(line), footer_area);
    }
}
