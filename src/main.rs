use std::fs::{self, File};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use glimmer::document::{Document, DocumentId, DocumentKind};
use glimmer::event_source::KeyboardEventSource;
use glimmer::main_app::{App, run_app_with_event_source, terminal_size};
use glimmer::markdown_renderer::{MarkdownRenderer, RenderConfig, StyleSelector};
use glimmer::note_store::{FileNoteStore, NoteStore};
use glimmer::pager::PagerModel;
use glimmer::panic_handler::{TerminalGuard, initialize_panic_handler};
use glimmer::settings::load_settings;
use glimmer::tasks::TaskRunner;
use glimmer::theme::Appearance;

const DISABLE_STYLING_ENV: &str = "GLIMMER_DISABLE_STYLING";

#[derive(Parser, Debug)]
#[command(name = "glimmer", version, about = "Read markdown in the terminal and keep notes on it")]
struct Args {
    /// Markdown file to open
    file: PathBuf,

    /// "auto" or a path to a base16 YAML scheme
    #[arg(short, long)]
    style: Option<String>,

    /// JSON file the notes are kept in
    #[arg(long, conflicts_with = "no_notes")]
    notes_file: Option<PathBuf>,

    /// Don't load or save notes
    #[arg(long)]
    no_notes: bool,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

fn styling_disabled() -> bool {
    std::env::var(DISABLE_STYLING_ENV)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn open_note_store(args: &Args, notes_path: Option<PathBuf>) -> Option<Arc<dyn NoteStore>> {
    if args.no_notes {
        return None;
    }
    let path = args.notes_file.clone().or(notes_path)?;
    match FileNoteStore::open(&path) {
        Ok(store) => {
            info!("Using notes file {path:?}");
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!("Notes disabled: {e:#}");
            None
        }
    }
}

fn load_document(path: &Path, note_store: Option<&dyn NoteStore>) -> Result<Document> {
    let body = fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let id = DocumentId::from_path(&absolute);

    let mut document = Document::new(id, body, DocumentKind::Local);
    if let Some(note) = note_store.and_then(|store| store.note(id)) {
        document = document.with_note(note);
    }
    Ok(document)
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        if args.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        Config::default(),
        File::create("glimmer.log")?,
    )?;

    info!("Starting glimmer");

    let settings = load_settings();
    let style = StyleSelector::parse(args.style.as_deref().unwrap_or(&settings.style));
    let note_store = open_note_store(&args, settings.notes_path());
    let document = load_document(&args.file, note_store.as_deref())?;

    let appearance = Appearance::detect();
    let config = RenderConfig {
        appearance,
        disable_styling: styling_disabled(),
    };

    initialize_panic_handler();
    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let tasks = TaskRunner::new(MarkdownRenderer::new(config), note_store);
    let mut app = App::new(PagerModel::new(style, appearance), tasks, appearance);
    // Size the pager first so the opening render already has the real width
    app.handle_resize(terminal_size(&terminal));
    app.open_document(document);

    let mut event_source = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    if let Some(document) = app.close() {
        info!("Closed document {}", document.id);
    }
    drop(guard);
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down glimmer");
    Ok(())
}
