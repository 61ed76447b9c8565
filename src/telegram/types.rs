//! Bot API types used by tgfeed.

use serde::{Deserialize, Serialize};

/// Reaction set on commands that were carried out.
pub const REACTION_OK: &str = "👍";

/// Reaction set on messages from chats that may not issue commands.
pub const REACTION_IGNORED: &str = "👀";

/// Reaction set on messages that are not a known command.
pub const REACTION_UNRECOGNIZED: &str = "🤷";

/// Envelope wrapping every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// One entry of the getUpdates stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A message to be sent with `sendMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub chat_id: String,
    /// HTML-formatted text.
    pub text: String,
    pub reply_to: Option<i64>,
    pub disable_link_preview: bool,
    pub disable_notification: bool,
}

impl OutgoingMessage {
    /// Create a message with link previews disabled.
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            reply_to: None,
            disable_link_preview: true,
            disable_notification: false,
        }
    }

    /// Send as a threaded reply to `message_id`.
    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    /// Deliver without a notification sound.
    pub fn silent(mut self) -> Self {
        self.disable_notification = true;
        self
    }
}

/// The part of a sent message tgfeed cares about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}
