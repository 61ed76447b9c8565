//! "Last processed" points for the feed and operator-update streams.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamp separating processed items from unprocessed ones.
///
/// Serialized as a plain RFC 3339 timestamp. An absent value is the Unix
/// epoch, so everything counts as new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whether an item stamped `ts` is at or after the watermark.
    ///
    /// The boundary is inclusive: an item stamped in the same instant as the
    /// last check is still delivered.
    pub fn includes(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.0
    }

    /// Move the watermark forward to `to`. Earlier values are ignored.
    pub fn advance(&mut self, to: DateTime<Utc>) {
        if to > self.0 {
            self.0 = to;
        }
    }

    /// Whether at least `interval` has elapsed since the watermark.
    pub fn is_due(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let elapsed = now.signed_duration_since(self.0);
        match chrono::Duration::from_std(interval) {
            Ok(interval) => elapsed >= interval,
            Err(_) => false,
        }
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self(DateTime::UNIX_EPOCH)
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}
