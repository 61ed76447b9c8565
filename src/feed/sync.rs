//! Feed synchronizer.
//!
//! Decides which entries are new relative to the feed watermark and hands
//! them to the dispatcher in chronological order.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::feed::fetcher::FeedSource;
use crate::feed::types::{Entry, Feed};
use crate::notify::Dispatcher;
use crate::telegram::Messenger;
use crate::watermark::Watermark;
use crate::Result;

/// Entries at or after `watermark`, oldest first.
///
/// Sources do not promise chronological order, so entries are sorted before
/// filtering. The sort is stable for equal timestamps.
pub fn new_entries<'f>(feed: &'f Feed, watermark: &Watermark) -> Vec<&'f Entry> {
    let mut entries: Vec<&Entry> = feed.entries.iter().collect();
    entries.sort_by_key(|e| e.updated);
    entries.retain(|e| watermark.includes(e.updated));
    entries
}

/// The most recently updated entry, if any.
pub fn latest_entry(feed: &Feed) -> Option<&Entry> {
    feed.entries.iter().max_by_key(|e| e.updated)
}

/// Outcome of one sweep over all watched feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub feeds_checked: usize,
    pub feeds_failed: usize,
    pub entries_sent: usize,
}

/// Sweeps the watched feeds and notifies new entries.
pub struct FeedSynchronizer<'a, F, M> {
    source: &'a F,
    dispatcher: &'a Dispatcher<'a, M>,
    skip: &'a [String],
}

impl<'a, F: FeedSource, M: Messenger> FeedSynchronizer<'a, F, M> {
    pub fn new(source: &'a F, dispatcher: &'a Dispatcher<'a, M>) -> Self {
        Self {
            source,
            dispatcher,
            skip: &[],
        }
    }

    /// Leave `urls` out of the sweep.
    pub fn skipping(mut self, urls: &'a [String]) -> Self {
        self.skip = urls;
        self
    }

    /// Run one sweep and advance `last_feed_check_time` to its start.
    ///
    /// A feed that cannot be fetched is skipped. A failed send stops the
    /// sweep and leaves the watermark where it was, so the next cycle
    /// retries the same entries.
    pub async fn sweep(&self, config: &mut Config) -> Result<SweepReport> {
        let started = Utc::now();
        let watermark = config.last_feed_check_time;
        let mut report = SweepReport::default();

        for url in &config.watched_feeds {
            if self.skip.contains(url) {
                debug!(url = %url, "feed skipped this sweep");
                continue;
            }
            debug!(url = %url, "checking feed");

            let feed = match self.source.fetch(url).await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!(url = %url, error = %e, "feed skipped");
                    report.feeds_failed += 1;
                    continue;
                }
            };
            report.feeds_checked += 1;

            for entry in new_entries(&feed, &watermark) {
                debug!(url = %url, title = %entry.title, updated = %entry.updated, "new entry");
                if let Err(e) = self.dispatcher.send_entry(&feed.title, entry).await {
                    error!(url = %url, error = %e, "notification failed, sweep aborted");
                    return Err(e);
                }
                report.entries_sent += 1;
            }
        }

        config.last_feed_check_time.advance(started);
        info!(
            feeds = report.feeds_checked,
            failed = report.feeds_failed,
            sent = report.entries_sent,
            "feeds checked"
        );
        Ok(report)
    }
}
