use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{FeedkeeperError, Result};
use crate::domain::Entry;
use crate::fetcher::FeedParser;
use crate::normalizer::Normalizer;

pub const DEFAULT_USER_AGENT: &str = concat!("feedkeeper/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
    normalizer: Normalizer,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            normalizer: Normalizer::new(),
        })
    }

    async fn fetch_body(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        response.error_for_status_ref()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl FeedParser for HttpFetcher {
    async fn fetch_entries(&self, url: &str, timeout: Duration) -> Result<Vec<Entry>> {
        let timed_out = || FeedkeeperError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };

        let body = match tokio::time::timeout(timeout, self.fetch_body(url, timeout)).await {
            Ok(Ok(body)) => body,
            Ok(Err(FeedkeeperError::Http(e))) if e.is_timeout() => return Err(timed_out()),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(timed_out()),
        };

        let (meta, entries) = self.normalizer.normalize(url, &body)?;
        tracing::info!(
            "Parsed feed {}: {} items",
            meta.title.as_deref().unwrap_or(url),
            entries.len()
        );
        Ok(entries)
    }
}
