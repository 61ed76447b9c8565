//! Command processor.
//!
//! Drains pending operator updates, applies commands to the watched feed
//! set and acknowledges every message with a reaction or a reply.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::command::parser::{format_feed_list, parse_command, Command};
use crate::config::Config;
use crate::feed::{latest_entry, FeedSource};
use crate::notify::Dispatcher;
use crate::telegram::markup::escape;
use crate::telegram::{
    Message, Messenger, OutgoingMessage, REACTION_IGNORED, REACTION_OK, REACTION_UNRECOGNIZED,
};

/// Outcome of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Updates fetched and acknowledged.
    pub updates: usize,
    /// Feeds that started being watched, already previewed.
    pub added: Vec<String>,
}

pub struct CommandProcessor<'a, M, F> {
    messenger: &'a M,
    source: &'a F,
    dispatcher: &'a Dispatcher<'a, M>,
}

impl<'a, M: Messenger, F: FeedSource> CommandProcessor<'a, M, F> {
    pub fn new(messenger: &'a M, source: &'a F, dispatcher: &'a Dispatcher<'a, M>) -> Self {
        Self {
            messenger,
            source,
            dispatcher,
        }
    }

    /// Process every update after `command_offset`.
    ///
    /// The cursor moves past each update before it is looked at, so a
    /// message that cannot be handled is never fetched twice.
    pub async fn drain(&self, config: &mut Config) -> DrainReport {
        config.last_command_poll_time.advance(Utc::now());

        let updates = match self
            .messenger
            .get_updates(config.command_offset + 1, config.updates_timeout_secs)
            .await
        {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "failed to get updates");
                return DrainReport::default();
            }
        };

        let mut report = DrainReport {
            updates: updates.len(),
            added: Vec::new(),
        };
        if updates.is_empty() {
            debug!("no pending updates");
            return report;
        }

        for update in updates {
            config.command_offset = config.command_offset.max(update.update_id);

            let Some(message) = update.message else {
                debug!(update_id = update.update_id, "update without message skipped");
                continue;
            };
            if let Some(url) = self.handle_message(config, &message).await {
                report.added.push(url);
            }
        }

        info!(
            count = report.updates,
            added = report.added.len(),
            offset = config.command_offset,
            "updates processed"
        );
        report
    }

    /// Act on one message. Returns the feed URL if one was added.
    async fn handle_message(&self, config: &mut Config, message: &Message) -> Option<String> {
        let Some(text) = message.text.as_deref() else {
            debug!(message_id = message.message_id, "message without text skipped");
            return None;
        };

        let chat_id = message.chat.id.to_string();
        if chat_id != config.operator_chat_id.trim() {
            info!(chat_id = %chat_id, "message from unauthorized chat ignored");
            self.react(&chat_id, message.message_id, REACTION_IGNORED)
                .await;
            return None;
        }

        let command = parse_command(text.trim());
        info!(command = %command, "operator command");

        match command {
            Command::Add(url) => {
                if self.add_feed(config, &chat_id, message.message_id, &url).await {
                    self.react(&chat_id, message.message_id, REACTION_OK).await;
                    return Some(url);
                }
            }
            Command::Remove(url) => {
                config.watched_feeds.retain(|feed| *feed != url);
                config.dedup_feeds();
                self.react(&chat_id, message.message_id, REACTION_OK).await;
            }
            Command::List => {
                self.reply(&chat_id, message.message_id, format_feed_list(&config.watched_feeds))
                    .await;
                self.react(&chat_id, message.message_id, REACTION_OK).await;
            }
            Command::Unrecognized => {
                self.react(&chat_id, message.message_id, REACTION_UNRECOGNIZED)
                    .await;
            }
        }
        None
    }

    /// Fetch `url`, preview its latest entry, then start watching it.
    ///
    /// The feed set is only touched once both the fetch and the preview
    /// succeeded. Returns whether the feed was added.
    async fn add_feed(
        &self,
        config: &mut Config,
        chat_id: &str,
        message_id: i64,
        url: &str,
    ) -> bool {
        let feed = match self.source.fetch(url).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(url = %url, error = %e, "feed not added");
                self.reply(chat_id, message_id, escape(&format!("{url}: {e}")))
                    .await;
                return false;
            }
        };

        if let Some(entry) = latest_entry(&feed) {
            if let Err(e) = self.dispatcher.send_entry(&feed.title, entry).await {
                warn!(url = %url, error = %e, "preview failed, feed not added");
                self.reply(chat_id, message_id, escape(&format!("{url}: {e}")))
                    .await;
                return false;
            }
        }

        config.watched_feeds.push(url.to_string());
        config.dedup_feeds();
        info!(url = %url, feeds = config.watched_feeds.len(), "feed added");
        true
    }

    async fn reply(&self, chat_id: &str, message_id: i64, text: String) {
        let message = OutgoingMessage::new(chat_id, text).reply_to(message_id);
        if let Err(e) = self.messenger.send_message(&message).await {
            warn!(chat_id = %chat_id, error = %e, "failed to reply");
        }
    }

    async fn react(&self, chat_id: &str, message_id: i64, emoji: &str) {
        if let Err(e) = self.messenger.set_reaction(chat_id, message_id, emoji).await {
            warn!(chat_id = %chat_id, message_id, error = %e, "failed to set reaction");
        }
    }
}
