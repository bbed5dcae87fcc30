use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::document::DocumentId;
use crate::error::SaveNoteError;

/// Persistence for document notes.
pub trait NoteStore: Send + Sync {
    fn set_note(&self, id: DocumentId, note: &str) -> Result<()>;

    fn note(&self, id: DocumentId) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveNoteRequest {
    pub id: DocumentId,
    pub note: String,
}

/// Confirmation that a note reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedNote {
    pub id: DocumentId,
    pub note: String,
}

/// Single attempt, no retries. Without a store this fails before touching
/// anything.
pub fn save_note(
    store: Option<&dyn NoteStore>,
    request: SaveNoteRequest,
) -> std::result::Result<SavedNote, SaveNoteError> {
    let Some(store) = store else {
        return Err(SaveNoteError::NoStore);
    };
    store
        .set_note(request.id, &request.note)
        .map_err(|source| SaveNoteError::Store {
            id: request.id,
            source,
        })?;
    Ok(SavedNote {
        id: request.id,
        note: request.note,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNote {
    note: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NoteFile {
    #[serde(default)]
    notes: BTreeMap<String, StoredNote>,
}

/// Notes kept in a JSON file, written through on every change.
#[derive(Debug)]
pub struct FileNoteStore {
    path: PathBuf,
    notes: Mutex<NoteFile>,
}

impl FileNoteStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let notes = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read notes file {path:?}"))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse notes file {path:?}"))?
        } else {
            NoteFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            notes: Mutex::new(notes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, notes: &NoteFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create notes directory {parent:?}"))?;
            }
        }
        let content = serde_json::to_string_pretty(notes)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write notes file {:?}", self.path))?;
        debug!("Saved {} notes to {:?}", notes.notes.len(), self.path);
        Ok(())
    }
}

impl NoteStore for FileNoteStore {
    fn set_note(&self, id: DocumentId, note: &str) -> Result<()> {
        let mut notes = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
        let key = id.to_string();
        let previous = if note.is_empty() {
            notes.notes.remove(&key)
        } else {
            notes.notes.insert(
                key.clone(),
                StoredNote {
                    note: note.to_string(),
                    updated_at: Utc::now(),
                },
            )
        };

        if let Err(e) = self.write(&notes) {
            error!("Failed to persist note for document {id}: {e:#}");
            // Keep memory and disk in agreement
            match previous {
                Some(previous) => {
                    notes.notes.insert(key, previous);
                }
                None => {
                    notes.notes.remove(&key);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn note(&self, id: DocumentId) -> Option<String> {
        let notes = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
        notes.notes.get(&id.to_string()).map(|stored| stored.note.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FailingStore;

    impl NoteStore for FailingStore {
        fn set_note(&self, _id: DocumentId, _note: &str) -> Result<()> {
            anyhow::bail!("store is read-only")
        }

        fn note(&self, _id: DocumentId) -> Option<String> {
            None
        }
    }

    fn request(id: u64, note: &str) -> SaveNoteRequest {
        SaveNoteRequest {
            id: DocumentId(id),
            note: note.to_string(),
        }
    }

    #[test]
    fn save_without_store_fails_with_no_store() {
        let err = save_note(None, request(7, "draft")).unwrap_err();
        assert!(matches!(err, SaveNoteError::NoStore));
        assert!(err.to_string().contains("no note store"));
    }

    #[test]
    fn save_reports_store_failures() {
        let store = FailingStore;
        let err = save_note(Some(&store), request(7, "draft")).unwrap_err();
        match err {
            SaveNoteError::Store { id, source } => {
                assert_eq!(id, DocumentId(7));
                assert!(source.to_string().contains("read-only"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn file_store_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("notes.json");

        let store = FileNoteStore::open(&path).unwrap();
        let saved = save_note(Some(&store), request(7, "draft")).unwrap();
        assert_eq!(
            saved,
            SavedNote {
                id: DocumentId(7),
                note: "draft".to_string()
            }
        );
        assert!(path.exists());

        let reopened = FileNoteStore::open(&path).unwrap();
        assert_eq!(reopened.note(DocumentId(7)).as_deref(), Some("draft"));
        assert_eq!(reopened.note(DocumentId(8)), None);
    }

    #[test]
    fn empty_note_removes_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");

        let store = FileNoteStore::open(&path).unwrap();
        store.set_note(DocumentId(1), "keep").unwrap();
        store.set_note(DocumentId(1), "").unwrap();
        assert_eq!(store.note(DocumentId(1)), None);

        let reopened = FileNoteStore::open(&path).unwrap();
        assert_eq!(reopened.note(DocumentId(1)), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(FileNoteStore::open(&path).is_err());
    }
}
