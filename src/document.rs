use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Stable identifier of a document in the note store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// Derive an id from a file path: the first eight bytes of the md5 digest
    /// of the absolute path.
    pub fn from_path(path: &Path) -> Self {
        let path_str = path.to_string_lossy();
        let digest = md5::compute(path_str.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.0[..8]);
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A file opened from the local disk
    #[default]
    Local,
    /// A document kept in the user's note store
    Stashed,
    /// Read-only announcements; these can't carry a note
    News,
}

impl DocumentKind {
    pub fn accepts_notes(&self) -> bool {
        !matches!(self, DocumentKind::News)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    /// Raw markdown, before any styling
    pub body: String,
    pub note: String,
    pub kind: DocumentKind,
}

impl Document {
    pub fn new(id: DocumentId, body: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            id,
            body: body.into(),
            note: String::new(),
            kind,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}
