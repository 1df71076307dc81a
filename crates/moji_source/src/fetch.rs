//! Network fetching

use crate::{Result, SourceError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

/// Async GET returning the body bytes, or an error on any non-success
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Bytes>;
}

/// [`Fetcher`] over a shared `reqwest` client with a fixed timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_USER_AGENT: &'static str = "Mozilla/5.0";

    /// Create a fetcher with the default timeout and user agent
    pub fn new() -> Result<Self> {
        Self::with_options(Self::DEFAULT_TIMEOUT, Self::DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

fn transport_error(url: &str, error: reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout {
            url: url.to_string(),
        }
    } else {
        SourceError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Bytes> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| transport_error(url, e))
    }
}
