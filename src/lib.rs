//! Telegram note keeper library
//!
//! This library saves chat messages as Markdown notes and reminds the sender
//! about each note at increasing intervals until the last interval passes.

mod cli;
mod config;
mod errors;
mod helper;
mod note;
mod reminder;
mod reminder_queue;
mod reminder_scheduler;
mod storage;
mod telegram;
mod types;
mod update_handler;

#[cfg(test)]
mod test_utils;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use reminder::*;
pub use reminder_queue::*;
pub use reminder_scheduler::*;
pub use storage::*;
pub use telegram::*;
pub use types::*;
pub use update_handler::*;
