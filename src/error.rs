//! Error types for tgfeed.

use thiserror::Error;

/// Common error type for tgfeed.
#[derive(Error, Debug)]
pub enum TgFeedError {
    /// Required configuration is missing or invalid.
    ///
    /// This is never transient: the process stops when it sees one.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration document could not be read from the store.
    #[error("config load error: {0}")]
    ConfigLoad(String),

    /// The configuration document could not be written back to the store.
    #[error("config save error: {0}")]
    ConfigSave(String),

    /// Feed fetch or decode error.
    #[error("feed error: {0}")]
    Feed(String),

    /// Messaging API error.
    #[error("telegram error: {0}")]
    Telegram(String),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TgFeedError {
    /// Whether the process must stop instead of retrying on the next cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TgFeedError::Config(_) | TgFeedError::ConfigLoad(_))
    }
}

/// Result type alias for tgfeed operations.
pub type Result<T> = std::result::Result<T, TgFeedError>;
