// src/update_handler.rs - turns incoming chat messages into notes and reminders
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use log::{debug, error, info, trace, warn};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::{
    ChatApi, ChatId, Config, MessageId, NoteStorage, OutgoingMessage, Reminder, TelegramUpdate,
    UpdateOutcome, FETCH_RETRY_DELAY,
};

pub const UNAUTHORIZED_REPLY: &str = "Sorry, you are not allowed to use this bot 😢";
pub const EMPTY_REPLY: &str = "Nothing to remind you about.";
pub const SAVE_FAILED_REPLY: &str = "Failed to save note 😢 Try sending the message again.";
pub const SAVED_REPLY: &str = "Message saved! We will remind you about it 😉";

/// Handles inbound updates: checks the sender, saves the note and hands a
/// new reminder to the scheduler.
pub struct UpdateHandler {
    chat: Arc<dyn ChatApi>,
    storage: NoteStorage,
    allowed_chats: HashSet<ChatId>,
    first_interval: TimeDelta,
    long_poll_timeout_secs: u64,

    /// New reminders for the scheduler
    reminders: mpsc::Sender<Reminder>,
}

impl UpdateHandler {
    pub fn new(
        config: &Config,
        chat: Arc<dyn ChatApi>,
        reminders: mpsc::Sender<Reminder>,
    ) -> Self {
        Self {
            chat,
            storage: NoteStorage::new(config.notes_dir.clone()),
            allowed_chats: config.allowed_chats.clone(),
            first_interval: config.first_interval(),
            long_poll_timeout_secs: config.long_poll_timeout_secs,
            reminders,
        }
    }

    /// Long-poll the chat provider until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("Start listening for updates");
        let mut offset: Option<i64> = None;

        loop {
            let fetched = tokio::select! {
                () = cancel.cancelled() => break,
                fetched = self.chat.get_updates(offset, self.long_poll_timeout_secs) => fetched,
            };

            match fetched {
                Ok(updates) => {
                    trace!("Fetched {} updates", updates.len());
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch updates: {}", e);
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(FETCH_RETRY_DELAY) => {}
                    }
                }
            }
        }

        info!("Update loop stopped");
    }

    /// Decide what to do with one update and answer it.
    ///
    /// Every update that carries a message gets exactly one reply, threaded
    /// to the original message.
    pub async fn handle_update(&self, update: TelegramUpdate) -> UpdateOutcome {
        let Some(message) = update.message else {
            trace!("Update {} has no message, skipping", update.update_id);
            return UpdateOutcome::Ignored;
        };

        let chat_id = message.chat.id;
        let message_id = message.message_id;
        debug!("{}-{}: Start handling update", chat_id, message_id);

        let (outcome, reply) = if !self.allowed_chats.contains(&chat_id) {
            warn!("{}-{}: Chat not authorized to use bot", chat_id, message_id);
            (UpdateOutcome::Unauthorized, UNAUTHORIZED_REPLY)
        } else {
            match message.text.as_deref() {
                None | Some("") => {
                    info!("{}-{}: Empty message", chat_id, message_id);
                    (UpdateOutcome::Empty, EMPTY_REPLY)
                }
                Some(text) => match self.storage.save_note(text) {
                    Ok(note_name) => {
                        let reminder =
                            Reminder::new(chat_id, message_id, Utc::now(), self.first_interval);
                        self.schedule(reminder).await;
                        info!("{}-{}: Note saved as {}", chat_id, message_id, note_name);
                        (UpdateOutcome::Saved { note_name }, SAVED_REPLY)
                    }
                    Err(e) => {
                        error!("{}-{}: Failed to save note: {}", chat_id, message_id, e);
                        (UpdateOutcome::SaveFailed, SAVE_FAILED_REPLY)
                    }
                },
            }
        };

        self.reply(chat_id, message_id, reply).await;
        outcome
    }

    /// Hand a reminder to the scheduler, waiting if its inbox is full.
    async fn schedule(&self, reminder: Reminder) {
        let (chat_id, message_id) = (reminder.chat_id, reminder.message_id);

        let result = match self.reminders.try_send(reminder) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(reminder)) => {
                warn!(
                    "{}-{}: Reminder queue is full, waiting for the scheduler",
                    chat_id, message_id
                );
                self.reminders.send(reminder).await.map_err(|_| ())
            }
            Err(TrySendError::Closed(_)) => Err(()),
        };

        if result.is_err() {
            warn!(
                "{}-{}: Scheduler is not running, reminder dropped",
                chat_id, message_id
            );
        }
    }

    async fn reply(&self, chat_id: ChatId, message_id: MessageId, text: &str) {
        let message = OutgoingMessage::new(chat_id, text).reply_to(message_id);
        if let Err(e) = self.chat.send_message(&message).await {
            warn!("{}-{}: Failed to send reply: {}", chat_id, message_id, e);
        }
    }
}
