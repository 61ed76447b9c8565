//! Configuration and persisted state for tgfeed.
//!
//! The whole document lives in a remote key-value store. It is read before
//! every cycle and written back in full afterwards, so settings and
//! watermarks share one YAML document.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::watermark::Watermark;
use crate::{Result, TgFeedError};

/// Environment variable holding the config document URL.
pub const CONFIG_URL_ENV: &str = "TGFEED_CONFIG_URL";

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "TGFEED_LOG";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_COMMAND_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_FEED_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_UPDATES_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_XML_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// The configuration/state document.
///
/// Every field is optional on input. Zero intervals and empty strings are
/// replaced by [`Config::apply_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cadence of the main loop.
    #[serde(alias = "Interval", deserialize_with = "interval_secs")]
    pub poll_interval_secs: u64,
    /// Minimum time between two operator update polls.
    #[serde(deserialize_with = "interval_secs")]
    pub command_poll_interval_secs: u64,
    /// Minimum time between two feed sweeps.
    #[serde(deserialize_with = "interval_secs")]
    pub feed_check_interval_secs: u64,
    /// Pause after every sent notification.
    #[serde(alias = "MessageInterval", deserialize_with = "interval_secs")]
    pub notify_interval_secs: u64,
    /// Long-poll wait handed to get-updates.
    #[serde(deserialize_with = "interval_secs")]
    pub updates_timeout_secs: u64,
    /// Upper bound for a single HTTP call.
    #[serde(deserialize_with = "interval_secs")]
    pub http_timeout_secs: u64,

    #[serde(alias = "TgApiUrlBase")]
    pub telegram_api_url: String,
    #[serde(alias = "TgToken")]
    pub telegram_token: String,
    /// Chat allowed to issue commands.
    #[serde(deserialize_with = "chat_id")]
    pub operator_chat_id: String,
    /// Chat receiving feed notifications.
    #[serde(alias = "TgChatId", deserialize_with = "chat_id")]
    pub destination_chat_id: String,

    /// Namespace assumed for feed documents that declare none.
    #[serde(alias = "XmlDefaultSpace")]
    pub xml_default_namespace: String,
    /// IANA timezone for notification timestamps.
    pub timezone: String,

    pub last_command_poll_time: Watermark,
    #[serde(alias = "FeedsCheckLast")]
    pub last_feed_check_time: Watermark,
    /// Cursor into the operator update stream.
    pub command_offset: i64,

    #[serde(alias = "FeedsUrls")]
    pub watched_feeds: Vec<String>,
}

/// Chat ids are numbers or `@channel` names; accept either YAML scalar.
fn chat_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChatId {
        Number(i64),
        Name(String),
    }

    Ok(match ChatId::deserialize(deserializer)? {
        ChatId::Number(id) => id.to_string(),
        ChatId::Name(name) => name,
    })
}

/// Intervals are whole seconds or duration strings such as `"90s"` or `"1h30m"`.
fn interval_secs<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Interval {
        Secs(u64),
        Text(String),
    }

    match Interval::deserialize(deserializer)? {
        Interval::Secs(secs) => Ok(secs),
        Interval::Text(text) => parse_duration_secs(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration {text:?}"))),
    }
}

/// Parse a duration made of `<number><unit>` parts, rounded up to whole seconds.
///
/// Units are `h`, `m`, `s`, `ms`, `us` (or `µs`) and `ns`. A bare `0` is zero.
pub fn parse_duration_secs(text: &str) -> Option<u64> {
    let text = text.trim();
    if text == "0" {
        return Some(0);
    }
    if text.is_empty() {
        return None;
    }

    let mut total = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            "ns" => 1e-9,
            _ => return None,
        };
        total += value * scale;
        rest = &rest[unit_len..];
    }
    Some(total.ceil() as u64)
}

impl Config {
    /// Parse configuration from a YAML string.
    pub fn parse(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(s).map_err(|e| TgFeedError::ConfigLoad(format!("parse error: {e}")))
    }

    /// Serialize the whole document as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Replace zero or empty settings with hard defaults.
    pub fn apply_defaults(&mut self) {
        fn or_default(v: &mut u64, default: u64) {
            if *v == 0 {
                *v = default;
            }
        }
        fn or_default_str(v: &mut String, default: &str) {
            if v.trim().is_empty() {
                *v = default.to_string();
            }
        }

        or_default(&mut self.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        or_default(
            &mut self.command_poll_interval_secs,
            DEFAULT_COMMAND_POLL_INTERVAL_SECS,
        );
        or_default(
            &mut self.feed_check_interval_secs,
            DEFAULT_FEED_CHECK_INTERVAL_SECS,
        );
        or_default(&mut self.notify_interval_secs, DEFAULT_NOTIFY_INTERVAL_SECS);
        or_default(&mut self.updates_timeout_secs, DEFAULT_UPDATES_TIMEOUT_SECS);
        or_default(&mut self.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        or_default_str(&mut self.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        or_default_str(&mut self.xml_default_namespace, DEFAULT_XML_NAMESPACE);
        or_default_str(&mut self.timezone, DEFAULT_TIMEZONE);
    }

    /// Check the identity fields without which nothing can run.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("telegram_token", &self.telegram_token),
            ("operator_chat_id", &self.operator_chat_id),
            ("destination_chat_id", &self.destination_chat_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(TgFeedError::Config(format!("{name} is empty")));
            }
        }
        Ok(())
    }

    /// Remove duplicate feed URLs, keeping the first occurrence of each.
    pub fn dedup_feeds(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.watched_feeds.retain(|url| seen.insert(url.clone()));
    }

    /// Reconcile a freshly loaded document with the previous cycle's state.
    ///
    /// Watermarks and the update cursor never move backwards. When the
    /// previous cycle could not persist, its feed set is kept as well.
    pub fn merge_runtime(&mut self, previous: &Config, unsaved: bool) {
        self.last_feed_check_time
            .advance(previous.last_feed_check_time.at());
        self.last_command_poll_time
            .advance(previous.last_command_poll_time.at());
        self.command_offset = self.command_offset.max(previous.command_offset);
        if unsaved {
            self.watched_feeds = previous.watched_feeds.clone();
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn command_poll_interval(&self) -> Duration {
        Duration::from_secs(self.command_poll_interval_secs)
    }

    pub fn feed_check_interval(&self) -> Duration {
        Duration::from_secs(self.feed_check_interval_secs)
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs(self.notify_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
