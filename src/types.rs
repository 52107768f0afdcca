//! Core data structures shared across the notekeeper service.
//!
//! This module contains the result alias, identifier aliases and the small
//! summary types the loops report through.
use chrono::{DateTime, Utc};
use clap::Subcommand;

use crate::NkError;

/// A specialized Result type for notekeeper operations.
pub type Result<T> = std::result::Result<T, NkError>;

/// Opaque chat identifier assigned by the chat provider.
pub type ChatId = i64;

/// Opaque message identifier, unique within a chat.
pub type MessageId = i64;

/// What the update loop decided to do with a single inbound update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update carried no message, nothing to answer
    Ignored,
    /// The chat is not on the allow-list
    Unauthorized,
    /// The message had no text
    Empty,
    /// The note store failed to write the note
    SaveFailed,
    /// The note was written and a reminder was handed to the scheduler
    Saved {
        /// File name the note was stored under
        note_name: String,
    },
}

/// States of the reminder scheduler event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next event
    Waiting,
    /// Inserting a freshly created reminder
    DrainingInbound,
    /// Firing due reminders
    Sweeping,
    /// Cancellation observed, the loop is exiting
    ShuttingDown,
}

/// Snapshot of the reminder scheduler
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    /// Current state of the loop
    pub state: SchedulerState,
    /// Number of reminders waiting in the queue
    pub queued: usize,
    /// Reminder notifications delivered so far
    pub reminders_sent: u64,
    /// Reminders retired after their last interval
    pub reminders_retired: u64,
    /// Reminders dropped because the notification could not be sent
    pub reminders_dropped: u64,
    /// When the last sweep ran
    pub last_sweep: Option<DateTime<Utc>>,
}

/// Available subcommands for the notekeeper binary
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the bot (default)
    Run,

    /// Print a stored note
    Show {
        /// Exact file name of the note, e.g. 2024-05-01T10-00-00_buy-milk.md
        name: String,
    },

    /// Validate the configuration and print the effective settings
    Check,
}
