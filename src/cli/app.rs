//! Process supervisor for the notekeeper binary
//!
//! Wires the configuration, the chat client and the two long-running loops
//! together and tears them down on Ctrl+C.
use std::{path::PathBuf, sync::Arc};

use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    ChatApi, Commands, Config, NkError, NoteStorage, ReminderScheduler, Result, SchedulerStatus,
    TelegramApi, UpdateHandler, DEFAULT_NOTES_DIR,
};

/// CLI Application handler - runs the bot or one of the helper commands
pub struct App {
    /// Notes directory given on the command line
    notes_dir: Option<PathBuf>,
}

impl App {
    pub fn new(notes_dir: Option<PathBuf>) -> Self {
        Self { notes_dir }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Run => {
                let config = self.load_config()?;
                let status = self.serve(config).await?;
                info!(
                    "Sent {} reminders, retired {}, dropped {}",
                    status.reminders_sent, status.reminders_retired, status.reminders_dropped
                );
            }

            Commands::Show { name } => {
                let content = self.storage().load_note(&name)?;
                println!("{content}");
            }

            Commands::Check => {
                let config = self.load_config()?;
                println!("{config}");
            }
        }

        Ok(())
    }

    fn load_config(&self) -> Result<Config> {
        let config = Config::from_env()?;
        Ok(match &self.notes_dir {
            Some(dir) => config.with_notes_dir(dir.clone()),
            None => config,
        })
    }

    /// Storage for the helper commands, which do not need the bot settings
    fn storage(&self) -> NoteStorage {
        let dir = self
            .notes_dir
            .clone()
            .or_else(|| std::env::var_os("NOTES_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NOTES_DIR));
        NoteStorage::new(dir)
    }

    /// Connect to Telegram and run until Ctrl+C.
    async fn serve(&self, config: Config) -> Result<SchedulerStatus> {
        info!("Loaded configuration: {:?}", config);

        let api = TelegramApi::new(&config.bot_token, config.debug)?;
        let me = api.get_me().await?;
        info!(
            "Authorized on account {}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );

        let cancel = CancellationToken::new();
        let cancel_on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down...");
                cancel_on_signal.cancel();
            }
        });

        info!("Start listening for updates. Press Ctrl+C to stop");
        run_service(&config, Arc::new(api), cancel).await
    }
}

/// Run the update loop and the reminder scheduler until `cancel` fires.
///
/// Returns the scheduler's final status.
pub async fn run_service(
    config: &Config,
    chat: Arc<dyn ChatApi>,
    cancel: CancellationToken,
) -> Result<SchedulerStatus> {
    let (reminders_tx, reminders_rx) = mpsc::channel(config.channel_capacity);

    let scheduler = ReminderScheduler::new(config, Arc::clone(&chat), reminders_rx);
    let handler = UpdateHandler::new(config, chat, reminders_tx);

    let mut scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));
    let mut update_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { handler.run(cancel).await })
    };

    // Whichever loop ends first takes the other one down with it.
    let joined = tokio::select! {
        updates = &mut update_task => {
            if let Err(e) = updates {
                error!("Update loop failed: {}", e);
            }
            cancel.cancel();
            scheduler_task.await
        }
        scheduler = &mut scheduler_task => {
            if !cancel.is_cancelled() {
                warn!("Reminder scheduler ended early, stopping the update loop");
            }
            cancel.cancel();
            if let Err(e) = update_task.await {
                error!("Update loop failed: {}", e);
            }
            scheduler
        }
    };

    let status = joined.map_err(|e| {
        error!("Reminder scheduler failed: {}", e);
        NkError::TaskFailed {
            message: format!("reminder scheduler: {e}"),
        }
    })?;

    info!("All loops stopped, {} reminders were still queued", status.queued);
    Ok(status)
}
