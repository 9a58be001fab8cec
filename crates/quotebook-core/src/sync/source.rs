//! Remote quote feed
//!
//! The feed is any HTTP endpoint returning a JSON array of objects with a
//! `title` field, such as the JSONPlaceholder `/posts` resource.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{QuoteError, QuoteResult};
use crate::models::RemotePost;

/// User agent sent with feed requests
const USER_AGENT: &str = concat!("quotebook/", env!("CARGO_PKG_VERSION"));

/// Somewhere candidate quotes can be fetched from
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the current list of remote posts
    async fn fetch(&self) -> QuoteResult<Vec<RemotePost>>;

    /// Human-readable location, for status output and logs
    fn describe(&self) -> String;
}

/// Feed served over HTTP
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source for `url` with the given request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> QuoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a source from the sync settings in `config`
    pub fn from_config(config: &Config) -> QuoteResult<Self> {
        Self::new(config.sync_url.clone(), config.sync_timeout())
    }

    /// The feed URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch(&self) -> QuoteResult<Vec<RemotePost>> {
        debug!("Fetching remote quotes from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Network(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        parse_posts(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Parse a feed body into posts
///
/// The body must be a JSON array. Elements are read loosely: one without a
/// string `title` becomes an untitled post, which the merge skips.
pub fn parse_posts(body: &str) -> QuoteResult<Vec<RemotePost>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(body)?;
    Ok(items.iter().map(RemotePost::from_value).collect())
}
