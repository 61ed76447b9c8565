//! Telegram Bot API access for tgfeed.
//!
//! Only the three calls the bridge needs are covered: send a message, set a
//! reaction and long-poll for updates. The [`Messenger`] trait is the seam
//! the rest of the crate talks to.

pub mod client;
pub mod markup;
pub mod types;

pub use client::{Messenger, TelegramClient};
pub use types::{
    Chat, Message, OutgoingMessage, SentMessage, Update, REACTION_IGNORED, REACTION_OK,
    REACTION_UNRECOGNIZED,
};
