use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::FeedSource;

/// One article extracted from a feed. `link` is unique across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub feed_url: String,
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "date")]
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

impl Entry {
    pub fn new(
        feed_url: impl Into<String>,
        link: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            feed_url: feed_url.into(),
            link: link.into(),
            title: title.into(),
            published_at,
            summary: None,
            is_read: false,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

/// An entry joined with the feed that owns it. Query output only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedEntry {
    pub entry: Entry,
    pub feed: FeedSource,
}
