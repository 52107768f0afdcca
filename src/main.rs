use std::path::Path;

use clap::Parser;
use log::{error, info};

use notekeeper::{parse_bool, App, Cli, Commands};

pub fn initialize_logger(debug: bool) {
    let default_filter = if debug { "info,notekeeper=debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

/// Load `.env` (or the given file) into the process environment.
/// A missing default `.env` is fine; a broken one is not.
fn load_env_file(path: Option<&Path>) -> Result<(), dotenvy::Error> {
    match path {
        Some(path) => dotenvy::from_path(path),
        None => match dotenvy::dotenv() {
            Ok(_) => Ok(()),
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(e),
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = load_env_file(cli.env_file.as_deref()) {
        eprintln!("notekeeper: failed to load environment file: {e}");
        std::process::exit(1);
    }

    let debug_mode = std::env::var("BOT_DEBUG_MODE")
        .ok()
        .and_then(|v| parse_bool(&v).ok())
        .unwrap_or(false);
    initialize_logger(cli.verbose || debug_mode);

    info!("Application starting up");

    let app = App::new(cli.notes_dir);
    if let Err(e) = app.run(cli.command.unwrap_or(Commands::Run)).await {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Application shutting down");
}
