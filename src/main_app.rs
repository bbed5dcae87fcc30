use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, error, info};
use ratatui::{Frame, Terminal, backend::Backend};

use crate::document::Document;
use crate::error::TerminalSizeError;
use crate::event_source::EventSource;
use crate::pager::{Command, PagerEvent, PagerModel, TerminalSize};
use crate::tasks::{TaskEvent, TaskRunner};
use crate::theme::Appearance;
use crate::widget::hud_message::HudMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// The shell around the pager: quitting, task plumbing and error display.
pub struct App {
    pager: PagerModel,
    tasks: TaskRunner,
    appearance: Appearance,
    hud_message: Option<HudMessage>,
}

impl App {
    pub fn new(pager: PagerModel, tasks: TaskRunner, appearance: Appearance) -> Self {
        Self {
            pager,
            tasks,
            appearance,
            hud_message: None,
        }
    }

    pub fn pager(&self) -> &PagerModel {
        &self.pager
    }

    pub fn hud_message(&self) -> Option<&HudMessage> {
        self.hud_message.as_ref()
    }

    pub fn open_document(&mut self, document: Document) {
        let commands = self.pager.open(document);
        self.run_commands(commands);
    }

    /// End the session and take the document back.
    pub fn close(&mut self) -> Option<Document> {
        self.pager.unload()
    }

    fn run_commands(&self, commands: Vec<Command>) {
        self.tasks.submit_all(commands);
    }

    fn update_pager(&mut self, event: PagerEvent) {
        let commands = self.pager.update(event);
        self.run_commands(commands);
    }

    fn show_hud(&mut self, hud: HudMessage) {
        self.hud_message = Some(hud);
    }

    pub fn handle_event(&mut self, event: Event) -> Option<AppAction> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(width, height) => {
                self.handle_resize(Ok(TerminalSize::new(width, height)));
                None
            }
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppAction::Quit);
        }

        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        if !self.pager.is_editing_note()
            && plain
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        {
            return Some(AppAction::Quit);
        }

        self.update_pager(PagerEvent::Key(key));
        None
    }

    pub fn handle_resize(&mut self, size: io::Result<TerminalSize>) {
        let size = size.map_err(TerminalSizeError::from);
        if let Err(e) = &size {
            error!("{e}");
            self.show_hud(HudMessage::error(e.to_string()));
        }
        self.update_pager(PagerEvent::Resize(size));
    }

    pub fn handle_task_event(&mut self, event: TaskEvent) {
        if let TaskEvent::NoteSaved(saved) = &event {
            info!("Saved note for document {}", saved.id);
            self.show_hud(HudMessage::info("Note saved"));
        }

        match event.into_pager_event() {
            Ok(event) => self.update_pager(event),
            Err(e) => {
                error!("Background task failed: {e}");
                self.show_hud(HudMessage::error(e.to_string()));
            }
        }
    }

    /// Apply every finished task. Returns true if anything arrived.
    pub fn poll_tasks(&mut self) -> bool {
        let mut any = false;
        while let Some(event) = self.tasks.try_next() {
            self.handle_task_event(event);
            any = true;
        }
        any
    }

    /// Block up to `timeout` for the next finished task and apply it.
    pub fn wait_for_task(&mut self, timeout: Duration) -> bool {
        match self.tasks.wait_next(timeout) {
            Some(event) => {
                self.handle_task_event(event);
                true
            }
            None => false,
        }
    }

    /// Drop an expired HUD message. Returns true if one was dropped.
    pub fn update_hud_message(&mut self) -> bool {
        if self.hud_message.as_ref().is_some_and(HudMessage::is_expired) {
            self.hud_message = None;
            return true;
        }
        false
    }

    pub fn draw(&self, f: &mut Frame) {
        let area = f.area();
        self.pager.render(f, area);
        if let Some(hud) = &self.hud_message {
            hud.render(f, area, self.appearance);
        }
    }
}

/// Current size of `terminal` as the pager sees it.
pub fn terminal_size<B: Backend>(terminal: &Terminal<B>) -> io::Result<TerminalSize>
where
    B::Error: std::error::Error + Send + Sync + 'static,
{
    terminal
        .size()
        .map(|size| TerminalSize::new(size.width, size.height))
        .map_err(io::Error::other)
}

pub fn run_app_with_event_source<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);

    app.handle_resize(terminal_size(terminal));

    let mut first_render = true;
    loop {
        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            if app.handle_event(event) == Some(AppAction::Quit) {
                should_quit = true;
                break;
            }
        }

        let mut needs_redraw = events_processed > 0 || first_render;
        first_render = false;

        if app.poll_tasks() {
            needs_redraw = true;
        }
        if app.update_hud_message() {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            debug!("Leaving event loop");
            return Ok(());
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let _ = event_source.poll(tick_rate);
        }
    }
}
