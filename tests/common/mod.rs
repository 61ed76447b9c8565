//! Test helpers for tgfeed integration tests.
//!
//! In-memory stand-ins for the config store, the messaging API and the feed
//! sources, plus builders for configs, feeds and updates.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use tokio::time::Instant;

use tgfeed::feed::{Entry, Feed, FeedSource};
use tgfeed::store::ConfigStore;
use tgfeed::telegram::{Chat, Message, Messenger, OutgoingMessage, SentMessage, Update};
use tgfeed::{Config, Result, TgFeedError};

pub const OPERATOR_CHAT: i64 = 1001;
pub const STRANGER_CHAT: i64 = 2002;
pub const DESTINATION: &str = "@destination";

/// A valid config with the given watched feeds.
pub fn config(feeds: &[&str]) -> Config {
    let mut config = Config {
        telegram_token: "123:test".to_string(),
        operator_chat_id: OPERATOR_CHAT.to_string(),
        destination_chat_id: DESTINATION.to_string(),
        timezone: "UTC".to_string(),
        watched_feeds: feeds.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    config.apply_defaults();
    config
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn entry(updated: DateTime<Utc>, title: &str) -> Entry {
    Entry::new(updated, title, format!("https://example.com/{}", title.to_lowercase()))
}

pub fn feed(title: &str, entries: Vec<Entry>) -> Feed {
    Feed {
        title: title.to_string(),
        entries,
    }
}

pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id * 10,
            chat: Chat { id: chat_id },
            text: Some(text.to_string()),
        }),
    }
}

pub fn operator_update(update_id: i64, text: &str) -> Update {
    text_update(update_id, OPERATOR_CHAT, text)
}

/// Config store keeping the document in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub doc: Mutex<Option<Config>>,
    pub saved: Mutex<Vec<Config>>,
    pub fail_load: Mutex<bool>,
    pub fail_save: Mutex<bool>,
}

impl MemoryStore {
    pub fn with(config: Config) -> Self {
        Self {
            doc: Mutex::new(Some(config)),
            ..Default::default()
        }
    }

    pub fn current(&self) -> Config {
        self.doc.lock().unwrap().clone().unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn set_fail_save(&self, fail: bool) {
        *self.fail_save.lock().unwrap() = fail;
    }

    pub fn set_fail_load(&self, fail: bool) {
        *self.fail_load.lock().unwrap() = fail;
    }
}

impl ConfigStore for MemoryStore {
    async fn load(&self) -> Result<Config> {
        if *self.fail_load.lock().unwrap() {
            return Err(TgFeedError::ConfigLoad("store unavailable".to_string()));
        }
        Ok(self.current())
    }

    async fn save(&self, config: &Config) -> Result<()> {
        if *self.fail_save.lock().unwrap() {
            return Err(TgFeedError::ConfigSave("store response status 503".to_string()));
        }
        *self.doc.lock().unwrap() = Some(config.clone());
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}

/// A message captured by [`FakeMessenger`].
#[derive(Debug, Clone)]
pub struct Sent {
    pub at: Instant,
    pub message: OutgoingMessage,
}

/// Messaging API stand-in recording every call.
#[derive(Default)]
pub struct FakeMessenger {
    pub pending: Mutex<Vec<Update>>,
    pub sent: Mutex<Vec<Sent>>,
    pub reactions: Mutex<Vec<(String, i64, String)>>,
    pub offsets: Mutex<Vec<i64>>,
    /// Sends succeed while this is above zero; `None` means no limit.
    pub sends_left: Mutex<Option<usize>>,
    pub fail_reactions: Mutex<bool>,
    pub fail_updates: Mutex<bool>,
}

impl FakeMessenger {
    pub fn with_updates(updates: Vec<Update>) -> Self {
        Self {
            pending: Mutex::new(updates),
            ..Default::default()
        }
    }

    pub fn push_update(&self, update: Update) {
        self.pending.lock().unwrap().push(update);
    }

    pub fn fail_sends_after(&self, n: usize) {
        *self.sends_left.lock().unwrap() = Some(n);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of messages sent to `chat_id`, in order.
    pub fn texts_to(&self, chat_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.message.chat_id == chat_id)
            .map(|s| s.message.text.clone())
            .collect()
    }

    pub fn reactions(&self) -> Vec<(String, i64, String)> {
        self.reactions.lock().unwrap().clone()
    }
}

impl Messenger for FakeMessenger {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage> {
        {
            let mut left = self.sends_left.lock().unwrap();
            if let Some(n) = left.as_mut() {
                if *n == 0 {
                    return Err(TgFeedError::Telegram(
                        "sendMessage: Too Many Requests".to_string(),
                    ));
                }
                *n -= 1;
            }
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(Sent {
            at: Instant::now(),
            message: message.clone(),
        });
        Ok(SentMessage {
            message_id: sent.len() as i64,
        })
    }

    async fn set_reaction(&self, chat_id: &str, message_id: i64, emoji: &str) -> Result<()> {
        if *self.fail_reactions.lock().unwrap() {
            return Err(TgFeedError::Telegram(
                "setMessageReaction: Bad Request".to_string(),
            ));
        }
        self.reactions
            .lock()
            .unwrap()
            .push((chat_id.to_string(), message_id, emoji.to_string()));
        Ok(())
    }

    async fn get_updates(&self, offset: i64, _timeout_secs: u64) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        if *self.fail_updates.lock().unwrap() {
            return Err(TgFeedError::Telegram("getUpdates: Bad Gateway".to_string()));
        }
        let mut pending = self.pending.lock().unwrap();
        pending.retain(|u| u.update_id >= offset);
        Ok(pending.clone())
    }
}

/// Feed sources served from memory. Unknown URLs fail like a 404.
#[derive(Default)]
pub struct FakeFeeds {
    pub feeds: Mutex<HashMap<String, std::result::Result<Feed, String>>>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFeeds {
    pub fn serve(&self, url: &str, feed: Feed) {
        self.feeds.lock().unwrap().insert(url.to_string(), Ok(feed));
    }

    pub fn fail(&self, url: &str, error: &str) {
        self.feeds
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error.to_string()));
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl FeedSource for FakeFeeds {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.feeds.lock().unwrap().get(url) {
            Some(Ok(feed)) => Ok(feed.clone()),
            Some(Err(e)) => Err(TgFeedError::Feed(e.clone())),
            None => Err(TgFeedError::Feed("HTTP error: 404 Not Found".to_string())),
        }
    }
}
