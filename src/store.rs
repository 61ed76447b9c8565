//! Config store client.
//!
//! The configuration document is a YAML value kept by a key-value service:
//! `GET` returns it, `PUT` replaces it.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::{Result, TgFeedError};

/// Where the configuration document is kept.
#[allow(async_fn_in_trait)]
pub trait ConfigStore {
    /// Read the whole document.
    async fn load(&self) -> Result<Config>;

    /// Replace the whole document.
    async fn save(&self, config: &Config) -> Result<()>;
}

/// Config store reached over HTTP.
pub struct HttpConfigStore {
    client: Client,
    url: String,
}

impl HttpConfigStore {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TgFeedError::ConfigLoad(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ConfigStore for HttpConfigStore {
    async fn load(&self) -> Result<Config> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TgFeedError::ConfigLoad(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TgFeedError::ConfigLoad(format!(
                "store response status {}",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| TgFeedError::ConfigLoad(e.to_string()))?;
        let config = Config::parse(&body)?;
        debug!(url = %self.url, feeds = config.watched_feeds.len(), "config loaded");
        Ok(config)
    }

    async fn save(&self, config: &Config) -> Result<()> {
        let body = config
            .to_yaml()
            .map_err(|e| TgFeedError::ConfigSave(e.to_string()))?;

        let resp = self
            .client
            .put(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/yaml")
            .body(body)
            .send()
            .await
            .map_err(|e| TgFeedError::ConfigSave(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TgFeedError::ConfigSave(format!(
                "store response status {}",
                resp.status()
            )));
        }

        debug!(url = %self.url, "config saved");
        Ok(())
    }
}
