pub mod http_fetcher;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Entry;

/// Default per-fetch timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Fetches a feed and returns its entries, normalized.
///
/// Implementations enforce `timeout` themselves and report failures as
/// errors; they never panic the caller's task.
#[async_trait]
pub trait FeedParser {
    async fn fetch_entries(&self, url: &str, timeout: Duration) -> Result<Vec<Entry>>;
}
