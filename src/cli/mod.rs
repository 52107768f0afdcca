//! CLI module for the notekeeper binary

mod app;
mod args;

pub use app::*;
pub use args::*;
