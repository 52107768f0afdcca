//! Telegram Bot API client.
//!
//! Only the three calls the bot needs are covered: `getMe` to check the token
//! at startup, `getUpdates` (long polling) for inbound messages and
//! `sendMessage` for replies and reminders. The rest of the crate talks to the
//! chat provider through the [`ChatApi`] trait.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};

use crate::{ChatId, MessageId, NkError, Result};

pub const TELEGRAM_API_ROOT: &str = "https://api.telegram.org";

/// Telegram rejects messages longer than this
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Must outlive the long-poll timeout
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

// ── Wire types ──────────────────────────────────────────────────

/// A Telegram Update object (subset of fields we need).
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    /// Unique identifier for this update.
    pub update_id: i64,
    /// New incoming message (present when the update is a message).
    pub message: Option<TelegramMessage>,
}

/// A Telegram Message object (subset of fields we need).
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: MessageId,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    /// Absent for photos, stickers and the like.
    pub text: Option<String>,
    /// Unix timestamp.
    pub date: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// Envelope every Bot API response comes in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// A message to send. Serializes as the `sendMessage` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<MessageId>,
}

impl OutgoingMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to_message_id: None,
        }
    }

    /// Thread the message as a reply to `message_id`
    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }
}

// ── Chat provider seam ──────────────────────────────────────────

/// What the loops need from the chat provider.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetch updates starting at `offset`, waiting up to `timeout_secs` for one to arrive.
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64)
        -> Result<Vec<TelegramUpdate>>;

    /// Deliver a message.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<()>;
}

// ── HTTP client ─────────────────────────────────────────────────

/// Bot API client over HTTPS.
pub struct TelegramApi {
    client: Client,
    base_url: String,
    /// Log request and response payloads
    debug: bool,
}

impl TelegramApi {
    pub fn new(bot_token: &str, debug: bool) -> Result<Self> {
        Self::with_api_root(TELEGRAM_API_ROOT, bot_token, debug)
    }

    /// Client against a different API root, e.g. a local Bot API server.
    pub fn with_api_root(api_root: &str, bot_token: &str, debug: bool) -> Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_root.trim_end_matches('/'), bot_token),
            debug,
        })
    }

    /// Check the token and return the bot's own account.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let request = self.client.get(self.method_url("getMe"));
        self.execute("getMe", request).await
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn execute<T: DeserializeOwned>(&self, method: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if self.debug {
            debug!("Telegram {} -> HTTP {}: {}", method, status, body);
        }

        let telegram_error = |message: String| NkError::Telegram {
            method: method.to_string(),
            message,
        };

        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(telegram_error(format!("HTTP {status}: {body}")));
            }
            Err(e) => return Err(NkError::Serialization(e)),
        };

        if !parsed.ok || !status.is_success() {
            return Err(telegram_error(
                parsed
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }

        parsed
            .result
            .ok_or_else(|| telegram_error("response has no result".to_string()))
    }
}

#[async_trait]
impl ChatApi for TelegramApi {
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        let mut params: Vec<(&str, String)> = vec![("timeout", timeout_secs.to_string())];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        let request = self.client.get(self.method_url("getUpdates")).query(&params);
        self.execute("getUpdates", request).await
    }

    /// Messages over Telegram's length limit go out in several parts; only
    /// the first part is threaded as a reply.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        for (i, chunk) in split_message(&message.text, MAX_MESSAGE_CHARS)
            .into_iter()
            .enumerate()
        {
            let body = OutgoingMessage {
                chat_id: message.chat_id,
                text: chunk,
                reply_to_message_id: if i == 0 {
                    message.reply_to_message_id
                } else {
                    None
                },
            };

            if self.debug {
                debug!("Telegram sendMessage <- {}", serde_json::to_string(&body)?);
            }

            let request = self.client.post(self.method_url("sendMessage")).json(&body);
            let _: IgnoredAny = self.execute("sendMessage", request).await?;
        }

        Ok(())
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring to
/// break after a newline.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let limit = match remaining.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => byte_idx,
            None => {
                chunks.push(remaining.to_string());
                break;
            }
        };

        let split_at = remaining[..limit]
            .rfind('\n')
            .map(|pos| pos + 1)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }

    chunks
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TOKEN: &str = "TEST_TOKEN";

    fn api_for(server: &MockServer) -> TelegramApi {
        TelegramApi::with_api_root(&server.uri(), TOKEN, true).unwrap()
    }

    #[test]
    fn deserialize_update_with_text_message() {
        let json = r#"{
            "update_id": 123456789,
            "message": {
                "message_id": 42,
                "from": {"id": 100, "is_bot": false, "first_name": "John", "username": "johndoe"},
                "chat": {"id": 100, "type": "private"},
                "text": "Buy milk",
                "date": 1707900000,
                "entities": []
            }
        }"#;

        let update: TelegramUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 123456789);
        let msg = update.message.unwrap();
        assert_eq!(msg.message_id, 42);
        assert_eq!(msg.chat.id, 100);
        assert_eq!(msg.text.as_deref(), Some("Buy milk"));
        assert_eq!(msg.from.unwrap().username.as_deref(), Some("johndoe"));
    }

    #[test]
    fn deserialize_update_without_message_or_text() {
        let update: TelegramUpdate = serde_json::from_str(r#"{"update_id": 999}"#).unwrap();
        assert!(update.message.is_none());

        let json = r#"{
            "update_id": 1,
            "message": {"message_id": 1, "chat": {"id": 1, "type": "group"}, "date": 1707900000}
        }"#;
        let update: TelegramUpdate = serde_json::from_str(json).unwrap();
        let msg = update.message.unwrap();
        assert!(msg.text.is_none());
        assert!(msg.from.is_none());
    }

    #[test]
    fn outgoing_message_omits_missing_reply() {
        let plain = serde_json::to_value(OutgoingMessage::new(5, "hi")).unwrap();
        assert_eq!(plain, json!({"chat_id": 5, "text": "hi"}));

        let reply = serde_json::to_value(OutgoingMessage::new(5, "hi").reply_to(9)).unwrap();
        assert_eq!(
            reply,
            json!({"chat_id": 5, "text": "hi", "reply_to_message_id": 9})
        );
    }

    #[test]
    fn split_message_short_text_unchanged() {
        assert_eq!(split_message("Hello", 4096), vec!["Hello".to_string()]);
        assert_eq!(split_message("", 4096), vec![String::new()]);
    }

    #[test]
    fn split_message_prefers_newlines_and_keeps_content() {
        let text = "Line 1\nLine 2\nLine 3";
        let chunks = split_message(text, 10);
        assert_eq!(chunks[0], "Line 1\n");
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn split_message_never_cuts_a_character() {
        let text = "ж".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[tokio::test]
    async fn get_updates_passes_offset_and_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .and(query_param("offset", "5"))
            .and(query_param("timeout", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [{
                    "update_id": 5,
                    "message": {
                        "message_id": 11,
                        "chat": {"id": 42, "type": "private"},
                        "text": "note",
                        "date": 1707900000
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = api_for(&server).get_updates(Some(5), 30).await.unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 42);
    }

    #[tokio::test]
    async fn send_message_posts_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_json(json!({
                "chat_id": 42,
                "text": "Message saved!",
                "reply_to_message_id": 11
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"message_id": 12, "chat": {"id": 42, "type": "private"}, "date": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = OutgoingMessage::new(42, "Message saved!").reply_to(11);
        api_for(&server).send_message(&message).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_request_surfaces_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .send_message(&OutgoingMessage::new(1, "hi"))
            .await
            .unwrap_err();

        match err {
            NkError::Telegram { method, message } => {
                assert_eq!(method, "sendMessage");
                assert!(message.contains("chat not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = api_for(&server).get_me().await.unwrap_err();
        assert!(err.to_string().contains("502"), "{err}");
    }

    #[tokio::test]
    async fn get_me_returns_bot_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"id": 7, "is_bot": true, "first_name": "Keeper", "username": "keeper_bot"}
            })))
            .mount(&server)
            .await;

        let me = api_for(&server).get_me().await.unwrap();
        assert!(me.is_bot);
        assert_eq!(me.username.as_deref(), Some("keeper_bot"));
    }

    #[tokio::test]
    async fn missing_result_and_description_fields_are_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let err = api.get_me().await.unwrap_err();
        assert!(err.to_string().contains("no result"), "{err}");

        let err = api.get_updates(None, 0).await.unwrap_err();
        assert!(
            matches!(&err, NkError::Telegram { method, .. } if method == "getUpdates"),
            "{err}"
        );
    }
}
