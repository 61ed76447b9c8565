//! Feed module for tgfeed.
//!
//! Fetching, decoding and incremental synchronization of watched feeds.

pub mod fetcher;
pub mod sync;
pub mod types;

pub use fetcher::{is_feed_url, parse_feed, FeedFetcher, FeedSource};
pub use sync::{latest_entry, new_entries, FeedSynchronizer, SweepReport};
pub use types::{Entry, Feed, MAX_FEED_SIZE};
