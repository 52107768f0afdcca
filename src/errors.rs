//! Error types for the notekeeper service.
//!
//! This module defines the error enum shared by the note store, the chat
//! client and the two long-running loops.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the notekeeper service.
#[derive(Error, Debug)]
pub enum NkError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level failures talking to the chat provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Note was not found in the storage root.
    #[error("Note not found: {name}")]
    NoteNotFound { name: String },

    /// The requested name cannot refer to a stored note.
    #[error("Invalid note name: {name:?}")]
    InvalidNoteName { name: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The chat provider answered, but rejected the request.
    #[error("Telegram {method} failed: {message}")]
    Telegram { method: String, message: String },

    /// One of the long-running loops ended abnormally.
    #[error("Background task failed: {message}")]
    TaskFailed { message: String },
}

impl NkError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        NkError::ConfigError {
            message: message.into(),
        }
    }

    /// True for errors caused by the note store rather than the chat provider.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            NkError::Io(_)
                | NkError::NoteNotFound { .. }
                | NkError::InvalidNoteName { .. }
                | NkError::DirectoryError { .. }
        )
    }
}
