//! Shared helpers for unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    ChatApi, ChatId, Config, MessageId, NkError, OutgoingMessage, Result, TelegramChat, TelegramMessage,
    TelegramUpdate,
};

/// Chat provider that serves scripted fetches and records every call.
#[derive(Default)]
pub(crate) struct RecordingChat {
    fetches: Mutex<VecDeque<Result<Vec<TelegramUpdate>>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    sent: Mutex<Vec<OutgoingMessage>>,
    fail_sends: AtomicBool,
}

impl RecordingChat {
    pub(crate) fn push_updates(&self, batch: Vec<TelegramUpdate>) {
        self.fetches.lock().unwrap().push_back(Ok(batch));
    }

    /// Queue a fetch that fails
    pub(crate) fn push_fetch_error(&self, message: &str) {
        self.fetches.lock().unwrap().push_back(Err(NkError::Telegram {
            method: "getUpdates".to_string(),
            message: message.to_string(),
        }));
    }

    /// Offsets passed to every get_updates call so far
    pub(crate) fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }

    pub(crate) fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn get_updates(
        &self,
        offset: Option<i64>,
        _timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        self.offsets.lock().unwrap().push(offset);
        let fetch = self.fetches.lock().unwrap().pop_front();
        match fetch {
            Some(fetch) => fetch,
            None => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(NkError::Telegram {
                method: "sendMessage".to_string(),
                message: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// An update carrying a message with the given text
pub(crate) fn text_update(
    update_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    text: Option<&str>,
) -> TelegramUpdate {
    TelegramUpdate {
        update_id,
        message: Some(TelegramMessage {
            message_id,
            from: None,
            chat: TelegramChat {
                id: chat_id,
                chat_type: "private".to_string(),
            },
            text: text.map(str::to_string),
            date: 1_714_550_400,
        }),
    }
}

/// Config allowing chat 42, reminding after one hour and one day
pub(crate) fn test_config(notes_dir: &Path) -> Config {
    Config::from_lookup(|key| match key {
        "TELEGRAM_APITOKEN" => Some("TEST_TOKEN".to_string()),
        "ALLOWED_CHATS" => Some("42".to_string()),
        "REMINDER_INTERVALS" => Some("1h,1d".to_string()),
        _ => None,
    })
    .unwrap()
    .with_notes_dir(notes_dir.to_path_buf())
}
