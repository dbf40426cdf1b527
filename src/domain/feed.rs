use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{FeedkeeperError, Result};

/// Entries kept per feed when a source does not set `retentionCount`.
pub const DEFAULT_RETENTION: usize = 100;

/// Longest accepted refresh interval: one year, in minutes.
pub const MAX_REFRESH_INTERVAL: u64 = 365 * 24 * 60;

/// A subscribed feed, as stored under the `feeds` setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSource {
    #[serde(default)]
    pub title: String,
    pub url: String,
    /// Minutes between syncs.
    #[serde(alias = "refreshIntervalMinutes")]
    pub refresh_interval: u64,
    /// Display cap; falls back to `retention_count` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default = "default_retention")]
    pub retention_count: usize,
}

fn default_retention() -> usize {
    DEFAULT_RETENTION
}

impl FeedSource {
    pub fn new(title: impl Into<String>, url: impl Into<String>, refresh_interval: u64) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            refresh_interval,
            max_items: None,
            retention_count: DEFAULT_RETENTION,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn with_retention(mut self, retention_count: usize) -> Self {
        self.retention_count = retention_count;
        self
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    pub fn display_cap(&self) -> usize {
        self.max_items.unwrap_or(self.retention_count)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.saturating_mul(60))
    }

    /// Rejects sources the scheduler cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(FeedkeeperError::Config("feed has no url".into()));
        }
        Url::parse(&self.url)?;
        if self.refresh_interval == 0 {
            return Err(FeedkeeperError::Config(format!(
                "{}: refresh interval must be positive",
                self.url
            )));
        }
        if self.refresh_interval > MAX_REFRESH_INTERVAL {
            return Err(FeedkeeperError::Config(format!(
                "{}: refresh interval of {} minutes exceeds {}",
                self.url, self.refresh_interval, MAX_REFRESH_INTERVAL
            )));
        }
        if self.retention_count == 0 {
            return Err(FeedkeeperError::Config(format!(
                "{}: retention count must be positive",
                self.url
            )));
        }
        if self.max_items == Some(0) {
            return Err(FeedkeeperError::Config(format!(
                "{}: max items must be positive",
                self.url
            )));
        }
        Ok(())
    }
}

/// Parse the JSON value of the `feeds` setting.
///
/// A value that is not a JSON array is a configuration error. Inside the
/// array, sources that fail to deserialize or validate are skipped with a
/// warning, as are repeated urls.
pub fn parse_sources(raw: &str) -> Result<Vec<FeedSource>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| FeedkeeperError::Config(format!("feeds is not a JSON array: {}", e)))?;

    let mut sources: Vec<FeedSource> = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        let source = match serde_json::from_value::<FeedSource>(value) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Skipping feed #{}: {}", idx, e);
                continue;
            }
        };
        if let Err(e) = source.validate() {
            tracing::warn!("Skipping feed #{}: {}", idx, e);
            continue;
        }
        if sources.iter().any(|s| s.url == source.url) {
            tracing::warn!("Skipping duplicate feed {}", source.url);
            continue;
        }
        sources.push(source);
    }

    Ok(sources)
}
