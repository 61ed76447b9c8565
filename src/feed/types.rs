//! Feed types for tgfeed.

use chrono::{DateTime, Utc};

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// A fetched feed. Never persisted, fetched again every sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    /// Feed title.
    pub title: String,
    /// Entries in document order.
    pub entries: Vec<Entry>,
}

/// A single feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// When the entry was last updated.
    pub updated: DateTime<Utc>,
    /// Entry title, untrimmed.
    pub title: String,
    /// Link to the original article.
    pub link: String,
}

impl Entry {
    pub fn new(updated: DateTime<Utc>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            updated,
            title: title.into(),
            link: link.into(),
        }
    }
}
