use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, trace};
use tempfile::NamedTempFile;

use crate::{heading, note_file_name, NkError, Result};

/// Reads and writes notes as individual files under a storage root.
#[derive(Debug, Clone)]
pub struct NoteStorage {
    /// Directory where notes are stored
    notes_dir: PathBuf,
}

impl NoteStorage {
    pub fn new(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
        }
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Saves a note named after its first line and the current local time.
    ///
    /// # Returns
    ///
    /// The file name the note was stored under
    pub fn save_note(&self, content: &str) -> Result<String> {
        self.save_note_at(content, Local::now().naive_local())
    }

    /// Saves a note as if it was created at `created`.
    ///
    /// The note is written to a temporary file first and then moved into
    /// place, so a failed save never leaves a partial note behind. An
    /// existing note with the same name is never overwritten.
    pub fn save_note_at(&self, content: &str, created: NaiveDateTime) -> Result<String> {
        self.ensure_notes_dir()?;

        let name = note_file_name(heading(content), created);
        let file_path = self.notes_dir.join(&name);
        debug!("Saving note to {}", file_path.display());

        let mut temp_file = NamedTempFile::new_in(&self.notes_dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NkError::Io(e)
        })?;

        trace!("Writing {} bytes to temporary file", content.len());
        temp_file.write_all(content.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NkError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            NkError::Io(e)
        })?;

        temp_file.persist_noclobber(&file_path).map_err(|e| {
            error!(
                "Failed to persist note {}: {}",
                file_path.display(),
                e.error
            );
            NkError::Io(e.error)
        })?;

        info!("Note saved: {}", name);
        Ok(name)
    }

    /// Loads the content of a stored note by its exact file name
    pub fn load_note(&self, name: &str) -> Result<String> {
        if !is_plain_file_name(name) {
            return Err(NkError::InvalidNoteName {
                name: name.to_string(),
            });
        }

        let file_path = self.notes_dir.join(name);
        debug!("Loading note from {}", file_path.display());

        fs::read_to_string(&file_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                debug!("Note not found: {}", name);
                NkError::NoteNotFound {
                    name: name.to_string(),
                }
            } else {
                error!("Failed reading note {}: {}", file_path.display(), e);
                NkError::Io(e)
            }
        })
    }

    fn ensure_notes_dir(&self) -> Result<()> {
        if self.notes_dir.is_dir() {
            return Ok(());
        }

        debug!("Creating notes directory: {}", self.notes_dir.display());
        fs::create_dir_all(&self.notes_dir).map_err(|e| {
            error!("Failed to create notes directory: {}", e);
            NkError::DirectoryError {
                path: self.notes_dir.clone(),
            }
        })
    }
}

/// A name that stays inside the storage root
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
