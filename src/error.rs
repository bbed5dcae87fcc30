use std::path::PathBuf;

use crate::document::DocumentId;

/// Styling engine failures. The viewport keeps its previous content.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("can't read style file {path}: {source}")]
    StyleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid style file {path}: {source}")]
    StyleParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid color {value:?} for {field} in style {scheme}")]
    StyleColor {
        scheme: String,
        field: &'static str,
        value: String,
    },
}

/// Note persistence failures. The optimistic local edit stays in place.
#[derive(Debug, thiserror::Error)]
pub enum SaveNoteError {
    #[error("can't set note; no note store configured")]
    NoStore,

    #[error("failed to save note for document {id}: {source}")]
    Store {
        id: DocumentId,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("could not determine terminal size: {0}")]
pub struct TerminalSizeError(#[from] pub std::io::Error);

/// Errors delivered by background tasks to the event loop.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    SaveNote(#[from] SaveNoteError),
}
