//! Feed fetcher.
//!
//! Fetches Atom/RSS documents over HTTP and turns them into [`Feed`]s with
//! a mandatory update timestamp on every entry.

use std::borrow::Cow;
use std::time::Duration;

use feed_rs::model::FeedType;
use feed_rs::parser;
use reqwest::Client;

use crate::config::Config;
use crate::feed::types::{Entry, Feed, MAX_FEED_SIZE};
use crate::{Result, TgFeedError};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User agent string for feed fetching.
const USER_AGENT: &str = concat!("tgfeed/", env!("CARGO_PKG_VERSION"));

/// Something feeds can be fetched from.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    /// Fetch and decode the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<Feed>;
}

/// HTTP feed fetcher.
pub struct FeedFetcher {
    client: Client,
    default_namespace: String,
}

impl FeedFetcher {
    /// Create a new fetcher with the given total timeout.
    pub fn new(timeout: Duration, default_namespace: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TgFeedError::Feed(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            default_namespace: default_namespace.into(),
        })
    }

    /// Create a fetcher from the HTTP and XML settings of `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.http_timeout(), &config.xml_default_namespace)
    }
}

impl FeedSource for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TgFeedError::Feed(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TgFeedError::Feed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_FEED_SIZE {
                return Err(TgFeedError::Feed(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, MAX_FEED_SIZE
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TgFeedError::Feed(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > MAX_FEED_SIZE {
            return Err(TgFeedError::Feed(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_FEED_SIZE
            )));
        }

        parse_feed(&bytes, &self.default_namespace)
    }
}

/// Whether `s` is an absolute http(s) URL with a host.
pub fn is_feed_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Parse feed bytes into a Feed.
///
/// A `<feed>` root without a default namespace is read in `default_namespace`.
/// Fails if any entry lacks an update timestamp.
pub fn parse_feed(bytes: &[u8], default_namespace: &str) -> Result<Feed> {
    let bytes = with_default_namespace(bytes, default_namespace);
    let feed = parser::parse(bytes.as_ref())
        .map_err(|e| TgFeedError::Feed(format!("failed to parse feed: {}", e)))?;

    // RSS items only carry pubDate, which feed-rs maps to `published`. Atom
    // entries must have a readable <updated>.
    let is_rss = matches!(
        feed.feed_type,
        FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2
    );
    let title = feed.title.map(|t| t.content).unwrap_or_default();

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let updated = if is_rss {
                entry.updated.or(entry.published)
            } else {
                entry.updated
            };
            let updated = updated.ok_or_else(|| {
                TgFeedError::Feed(format!("entry {:?} has no update timestamp", entry.id))
            })?;
            let link = entry
                .links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let title = entry.title.map(|t| t.content).unwrap_or_default();

            Ok(Entry {
                updated,
                title,
                link,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Feed { title, entries })
}

/// Declare `namespace` on a `<feed>` root element that has no `xmlns`.
fn with_default_namespace<'a>(bytes: &'a [u8], namespace: &str) -> Cow<'a, [u8]> {
    const ROOT: &[u8] = b"<feed";

    let Some(start) = bytes.windows(ROOT.len()).position(|w| w == ROOT) else {
        return Cow::Borrowed(bytes);
    };
    let name_end = start + ROOT.len();
    match bytes.get(name_end) {
        Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {}
        _ => return Cow::Borrowed(bytes),
    }
    let Some(tag_len) = bytes[name_end..].iter().position(|b| *b == b'>') else {
        return Cow::Borrowed(bytes);
    };
    let tag = &bytes[name_end..name_end + tag_len];
    if tag.windows(6).any(|w| w == b"xmlns=") || namespace.is_empty() {
        return Cow::Borrowed(bytes);
    }

    let attr = format!(" xmlns=\"{}\"", namespace);
    let mut out = Vec::with_capacity(bytes.len() + attr.len());
    out.extend_from_slice(&bytes[..name_end]);
    out.extend_from_slice(attr.as_bytes());
    out.extend_from_slice(&bytes[name_end..]);
    Cow::Owned(out)
}
