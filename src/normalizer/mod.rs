use chrono::{DateTime, Utc};
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{FeedkeeperError, Result};
use crate::domain::Entry;

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<(FeedMeta, Vec<Entry>)> {
        self.normalize_at(feed_url, body, Utc::now())
    }

    /// Entries without a usable date are stamped with `fetched_at`; entries
    /// without a link are dropped since the link is their identity.
    pub fn normalize_at(
        &self,
        feed_url: &str,
        body: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<(FeedMeta, Vec<Entry>)> {
        let feed = parser::parse(body).map_err(|e| FeedkeeperError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decode_html_entities(&t.content).to_string()),
            description: feed.description.map(|d| decode_html_entities(&d.content).to_string()),
        };

        let entries: Vec<Entry> = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.trim().to_string())
                    .filter(|l| !l.is_empty());
                let Some(link) = link else {
                    tracing::debug!("Dropping entry {} from {}: no link", entry.id, feed_url);
                    return None;
                };

                let title = entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string())
                    .unwrap_or_default();
                let published_at = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or(fetched_at);

                let mut item = Entry::new(feed_url, link, title, published_at);
                item.summary = entry.summary.map(|s| decode_html_entities(&s.content).to_string());
                Some(item)
            })
            .collect();

        Ok((meta, entries))
    }
}
