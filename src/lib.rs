//! tgfeed - Feed-to-Telegram bridge
//!
//! Watches Atom/RSS feeds and relays new entries to a Telegram chat, while an
//! operator chat adds, removes and lists the watched feeds.

pub mod bridge;
pub mod command;
pub mod config;
pub mod datetime;
pub mod error;
pub mod feed;
pub mod logging;
pub mod notify;
pub mod store;
pub mod telegram;
pub mod watermark;

pub use bridge::{Bridge, CycleReport};
pub use command::{parse_command, Command, CommandProcessor, DrainReport};
pub use config::Config;
pub use error::{Result, TgFeedError};
pub use feed::{Entry, Feed, FeedFetcher, FeedSource, FeedSynchronizer, SweepReport};
pub use notify::Dispatcher;
pub use store::{ConfigStore, HttpConfigStore};
pub use telegram::{Messenger, TelegramClient};
pub use watermark::Watermark;
