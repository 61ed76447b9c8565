//! Bot API client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::telegram::types::{ApiResponse, OutgoingMessage, SentMessage, Update};
use crate::{Result, TgFeedError};

/// The messaging operations the bridge needs.
#[allow(async_fn_in_trait)]
pub trait Messenger {
    /// Send one message and return its id.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage>;

    /// Put a single emoji reaction on a message.
    async fn set_reaction(&self, chat_id: &str, message_id: i64, emoji: &str) -> Result<()>;

    /// Fetch updates with an id of at least `offset`, waiting up to
    /// `timeout_secs` for one to arrive.
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;
}

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: String,
    timeout: Duration,
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TgFeedError::Telegram(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout,
        })
    }

    /// Create a client from the API settings of `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.telegram_api_url,
            &config.telegram_token,
            config.http_timeout(),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Call a Bot API method and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // The request URL carries the bot token, keep it out of error text.
        let resp = request
            .send()
            .await
            .map_err(|e| TgFeedError::Telegram(format!("{method}: {}", e.without_url())))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TgFeedError::Telegram(format!("{method}: {}", e.without_url())))?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(TgFeedError::Telegram(format!(
                    "{method}: invalid response: {e}"
                )));
            }
            Err(_) => {
                return Err(TgFeedError::Telegram(format!("{method}: HTTP {status}")));
            }
        };

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TgFeedError::Telegram(format!("{method}: {description}")));
        }

        envelope
            .result
            .ok_or_else(|| TgFeedError::Telegram(format!("{method}: response without result")))
    }

    /// Send a text message
    pub async fn send(&self, message: &OutgoingMessage) -> Result<SentMessage> {
        let mut body = json!({
            "chat_id": message.chat_id,
            "text": message.text,
            "parse_mode": "HTML",
            "link_preview_options": { "is_disabled": message.disable_link_preview },
            "disable_notification": message.disable_notification,
        });
        if let Some(reply_to) = message.reply_to {
            body["reply_parameters"] = json!({ "message_id": reply_to });
        }

        let sent: SentMessage = self.call("sendMessage", &body, None).await?;
        debug!(chat_id = %message.chat_id, message_id = sent.message_id, "message sent");
        Ok(sent)
    }

    /// Set an emoji reaction on a message
    pub async fn react(&self, chat_id: &str, message_id: i64, emoji: &str) -> Result<()> {
        let body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "reaction": [{ "type": "emoji", "emoji": emoji }],
        });
        let _: bool = self.call("setMessageReaction", &body, None).await?;
        Ok(())
    }

    /// Long-poll for message updates
    pub async fn updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        // The server holds the request for up to `timeout_secs`.
        let timeout = self.timeout + Duration::from_secs(timeout_secs);
        self.call("getUpdates", &body, Some(timeout)).await
    }
}

impl Messenger for TelegramClient {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage> {
        self.send(message).await
    }

    async fn set_reaction(&self, chat_id: &str, message_id: i64, emoji: &str) -> Result<()> {
        self.react(chat_id, message_id, emoji).await
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.updates(offset, timeout_secs).await
    }
}
