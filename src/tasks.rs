//! Background execution of pager commands.
//!
//! Renders and note saves each have one long-lived worker thread fed by a
//! flume queue, so commands of a kind run in the order they were submitted.
//! Every command posts exactly one [`TaskEvent`] back. Nothing here touches
//! the pager; the event loop feeds results in as [`PagerEvent`]s.

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, warn};

use crate::error::{SaveNoteError, TaskError};
use crate::markdown_renderer::{MarkdownRenderer, RenderedContent};
use crate::note_store::{NoteStore, SavedNote, save_note};
use crate::pager::{Command, PagerEvent};

#[derive(Debug)]
pub enum TaskEvent {
    ContentRendered(RenderedContent),
    NoteSaved(SavedNote),
    Failed(TaskError),
}

impl TaskEvent {
    /// Successful results become pager input; failures are for the shell.
    pub fn into_pager_event(self) -> Result<PagerEvent, TaskError> {
        match self {
            TaskEvent::ContentRendered(content) => Ok(PagerEvent::ContentRendered(content)),
            TaskEvent::NoteSaved(saved) => Ok(PagerEvent::NoteSaved(saved)),
            TaskEvent::Failed(error) => Err(error),
        }
    }
}

pub struct TaskRunner {
    has_note_store: bool,
    render_tx: Sender<Command>,
    save_tx: Sender<Command>,
    event_tx: Sender<TaskEvent>,
    event_rx: Receiver<TaskEvent>,
}

impl TaskRunner {
    pub fn new(renderer: MarkdownRenderer, note_store: Option<Arc<dyn NoteStore>>) -> Self {
        let (event_tx, event_rx) = flume::unbounded();
        let has_note_store = note_store.is_some();

        // A render never waits behind a slow save, and saves never overtake
        // each other
        let (render_tx, render_rx) = flume::unbounded();
        let (save_tx, save_rx) = flume::unbounded();
        for (rx, store) in [(render_rx, note_store.clone()), (save_rx, note_store)] {
            let renderer = renderer.clone();
            let tx = event_tx.clone();
            std::thread::spawn(move || {
                command_worker(&renderer, store.as_deref(), rx, tx);
            });
        }

        Self {
            has_note_store,
            render_tx,
            save_tx,
            event_tx,
            event_rx,
        }
    }

    pub fn has_note_store(&self) -> bool {
        self.has_note_store
    }

    pub fn submit_all(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.submit(command);
        }
    }

    /// Queue `command` on its worker.
    pub fn submit(&self, command: Command) {
        let queue = match &command {
            Command::Render(_) => &self.render_tx,
            Command::SaveNote(_) if !self.has_note_store => {
                // Nothing to call, so no worker either
                self.send(TaskEvent::Failed(SaveNoteError::NoStore.into()));
                return;
            }
            Command::SaveNote(_) => &self.save_tx,
        };

        if let Err(e) = queue.send(command) {
            warn!("Task worker is gone: {e}");
        }
    }

    fn send(&self, event: TaskEvent) {
        if let Err(e) = self.event_tx.send(event) {
            warn!("Failed to queue task event: {e}");
        }
    }

    /// Next finished task, without blocking.
    pub fn try_next(&self) -> Option<TaskEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Next finished task, waiting up to `timeout`.
    pub fn wait_next(&self, timeout: Duration) -> Option<TaskEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// Runs queued commands until the runner is dropped.
fn command_worker(
    renderer: &MarkdownRenderer,
    note_store: Option<&dyn NoteStore>,
    commands: Receiver<Command>,
    events: Sender<TaskEvent>,
) {
    for command in commands {
        let event = run_command(renderer, note_store, command);
        if events.send(event).is_err() {
            debug!("Task finished after the event loop went away");
            break;
        }
    }
}

/// Execute one command on the calling thread.
pub fn run_command(
    renderer: &MarkdownRenderer,
    note_store: Option<&dyn NoteStore>,
    command: Command,
) -> TaskEvent {
    match command {
        Command::Render(request) => {
            debug!(
                "Rendering document {} at width {} (generation {})",
                request.document_id, request.width, request.generation
            );
            match renderer.render(&request) {
                Ok(content) => TaskEvent::ContentRendered(content),
                Err(e) => TaskEvent::Failed(e.into()),
            }
        }
        Command::SaveNote(request) => match save_note(note_store, request) {
            Ok(saved) => TaskEvent::NoteSaved(saved),
            Err(e) => TaskEvent::Failed(e.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use crate::error::RenderError;
    use crate::markdown_renderer::{RenderConfig, RenderRequest, StyleSelector};
    use crate::note_store::{FileNoteStore, SaveNoteRequest};
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    fn render_command(markdown: &str, style: StyleSelector) -> Command {
        Command::Render(RenderRequest {
            document_id: DocumentId(7),
            generation: 3,
            markdown: markdown.to_string(),
            width: 80,
            style,
        })
    }

    fn save_command(note: &str) -> Command {
        Command::SaveNote(SaveNoteRequest {
            id: DocumentId(7),
            note: note.to_string(),
        })
    }

    #[test]
    fn render_posts_content_with_its_generation() {
        let runner = TaskRunner::new(MarkdownRenderer::default(), None);
        runner.submit(render_command("# Hi", StyleSelector::Auto));

        match runner.wait_next(WAIT) {
            Some(TaskEvent::ContentRendered(content)) => {
                assert_eq!(content.document_id, DocumentId(7));
                assert_eq!(content.generation, 3);
                assert_eq!(content.text.lines.len(), 1);
            }
            other => panic!("unexpected task event {other:?}"),
        }
        assert!(runner.try_next().is_none());
    }

    #[test]
    fn missing_style_file_fails_the_render() {
        let runner = TaskRunner::new(MarkdownRenderer::default(), None);
        let style = StyleSelector::Path("/nonexistent/glimmer/style.yaml".into());
        runner.submit(render_command("text", style));

        match runner.wait_next(WAIT) {
            Some(TaskEvent::Failed(TaskError::Render(RenderError::StyleRead { .. }))) => {}
            other => panic!("unexpected task event {other:?}"),
        }
    }

    #[test]
    fn save_without_store_fails_immediately() {
        let runner = TaskRunner::new(MarkdownRenderer::default(), None);
        assert!(!runner.has_note_store());
        runner.submit(save_command("draft"));

        // Posted synchronously, no worker involved
        match runner.try_next() {
            Some(TaskEvent::Failed(TaskError::SaveNote(SaveNoteError::NoStore))) => {}
            other => panic!("unexpected task event {other:?}"),
        }
    }

    #[test]
    fn save_reaches_the_store() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileNoteStore::open(&dir.path().join("notes.json")).unwrap());
        let runner = TaskRunner::new(MarkdownRenderer::default(), Some(store.clone()));
        runner.submit(save_command("draft"));

        match runner.wait_next(WAIT) {
            Some(TaskEvent::NoteSaved(saved)) => {
                assert_eq!(saved.id, DocumentId(7));
                assert_eq!(saved.note, "draft");
            }
            other => panic!("unexpected task event {other:?}"),
        }
        assert_eq!(store.note(DocumentId(7)).as_deref(), Some("draft"));
    }

    #[test]
    fn each_command_posts_one_event() {
        let runner = TaskRunner::new(MarkdownRenderer::default(), None);
        runner.submit_all([
            render_command("one", StyleSelector::Auto),
            render_command("two", StyleSelector::Auto),
            save_command("draft"),
        ]);

        let events: Vec<TaskEvent> = (0..3).filter_map(|_| runner.wait_next(WAIT)).collect();
        assert_eq!(events.len(), 3);
        assert!(runner.wait_next(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn saves_reach_the_store_in_submission_order() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileNoteStore::open(&dir.path().join("notes.json")).unwrap());
        let runner = TaskRunner::new(MarkdownRenderer::default(), Some(store.clone()));

        for round in 0..10 {
            runner.submit_all((0..20).map(|i| save_command(&format!("r{round} v{i}"))));

            let saved: Vec<String> = (0..20)
                .filter_map(|_| match runner.wait_next(WAIT) {
                    Some(TaskEvent::NoteSaved(saved)) => Some(saved.note),
                    _ => None,
                })
                .collect();
            let expected: Vec<String> = (0..20).map(|i| format!("r{round} v{i}")).collect();
            assert_eq!(saved, expected);

            let last = format!("r{round} v19");
            assert_eq!(store.note(DocumentId(7)).as_deref(), Some(last.as_str()));
            let reopened = FileNoteStore::open(store.path()).unwrap();
            assert_eq!(reopened.note(DocumentId(7)).as_deref(), Some(last.as_str()));
        }
    }

    #[test]
    fn styling_can_be_disabled() {
        let renderer = MarkdownRenderer::new(RenderConfig {
            disable_styling: true,
            ..RenderConfig::default()
        });
        let event = run_command(&renderer, None, render_command("# Hi\n  text  ", StyleSelector::Auto));
        let TaskEvent::ContentRendered(content) = event else {
            panic!("expected rendered content");
        };
        let lines: Vec<String> = content.text.lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(lines, vec!["# Hi".to_string(), "  text  ".to_string()]);
    }

    #[test]
    fn failures_stay_out_of_the_pager() {
        let event = TaskEvent::Failed(SaveNoteError::NoStore.into());
        assert!(event.into_pager_event().is_err());
    }
}
