//! Notification dispatcher.
//!
//! Formats feed entries and sends them to the destination chat one at a
//! time, pausing after every successful send.

use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::datetime::format_short;
use crate::feed::Entry;
use crate::telegram::markup::{bold, escape, link};
use crate::telegram::{Messenger, OutgoingMessage, SentMessage};
use crate::Result;

/// Format an entry as a notification.
///
/// The header `"{feed title} • {short timestamp}"` is a bold link to the
/// entry, followed by the escaped entry title on its own line.
pub fn format_entry(feed_title: &str, entry: &Entry, timezone: &str) -> String {
    let header = format!("{} • {}", feed_title, format_short(&entry.updated, timezone));
    format!(
        "{}\n{}",
        bold(&link(&header, &entry.link)),
        escape(entry.title.trim())
    )
}

/// Sends entry notifications with a fixed pause between them.
pub struct Dispatcher<'a, M> {
    messenger: &'a M,
    chat_id: String,
    timezone: String,
    interval: Duration,
}

impl<'a, M: Messenger> Dispatcher<'a, M> {
    pub fn new(
        messenger: &'a M,
        chat_id: impl Into<String>,
        timezone: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            messenger,
            chat_id: chat_id.into(),
            timezone: timezone.into(),
            interval,
        }
    }

    /// Create a dispatcher for the destination chat of `config`.
    pub fn from_config(messenger: &'a M, config: &Config) -> Self {
        Self::new(
            messenger,
            &config.destination_chat_id,
            &config.timezone,
            config.notify_interval(),
        )
    }

    /// Send one entry, then wait out the notify interval.
    ///
    /// Nothing is waited for when the send fails.
    pub async fn send_entry(&self, feed_title: &str, entry: &Entry) -> Result<SentMessage> {
        let text = format_entry(feed_title, entry, &self.timezone);
        let sent = self
            .messenger
            .send_message(&OutgoingMessage::new(&self.chat_id, text))
            .await?;
        debug!(title = %entry.title.trim(), link = %entry.link, "entry sent");

        tokio::time::sleep(self.interval).await;
        Ok(sent)
    }
}
