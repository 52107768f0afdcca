use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Command-line arguments of the notekeeper binary
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "Saves Telegram messages as notes and reminds you about them"
)]
pub struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[clap(long, value_parser)]
    pub env_file: Option<PathBuf>,

    /// Directory where notes are stored (overrides NOTES_DIR)
    #[clap(long, value_parser)]
    pub notes_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// What to do, defaults to running the bot
    #[clap(subcommand)]
    pub command: Option<Commands>,
}
