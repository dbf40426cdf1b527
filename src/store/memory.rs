use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::app::Result;
use crate::domain::{Entry, FeedSource};

/// All known entries across every feed, keyed by link, plus the feed set
/// used to join them.
///
/// Entries are kept sorted by `published_at`, newest first.
#[derive(Debug, Default)]
pub struct ItemStore {
    entries: Vec<Entry>,
    feeds: Vec<FeedSource>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the in-memory entries with a persisted blob.
    ///
    /// Anything but a JSON array resets the store to empty. Elements that
    /// are not valid entries are skipped. Never fails; returns the number
    /// of entries loaded.
    pub fn load(&mut self, blob: &str) -> usize {
        self.entries.clear();

        let values = match serde_json::from_str::<Value>(blob) {
            Ok(Value::Array(values)) => values,
            Ok(_) => {
                tracing::warn!("Persisted feed items are not a list, starting empty");
                return 0;
            }
            Err(e) => {
                tracing::warn!("Failed to parse persisted feed items, starting empty: {}", e);
                return 0;
            }
        };

        let mut entries = Vec::with_capacity(values.len());
        for (idx, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<Entry>(value) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping persisted item #{}: {}", idx, e),
            }
        }

        self.entries = dedup_by_link(entries);
        sort_newest_first(&mut self.entries);
        tracing::info!("Loaded {} persisted feed items", self.entries.len());
        self.entries.len()
    }

    /// Install the feed set used for joins. Orphaned entries stay.
    pub fn replace_feeds(&mut self, sources: Vec<FeedSource>) {
        self.feeds = sources;
    }

    pub fn feeds(&self) -> &[FeedSource] {
        &self.feeds
    }

    pub fn feed(&self, url: &str) -> Option<&FeedSource> {
        self.feeds.iter().find(|f| f.url == url)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, link: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.link == link)
    }

    pub fn entries_for_feed(&self, feed_url: &str) -> Vec<Entry> {
        self.entries
            .iter()
            .filter(|e| e.feed_url == feed_url)
            .cloned()
            .collect()
    }

    /// Replace every entry of `feed_url` with `merged`.
    ///
    /// Links already marked read anywhere in the store stay read. The whole
    /// store is then deduplicated by link, the merged entries winning any
    /// cross-feed collision.
    pub fn upsert_merged(&mut self, feed_url: &str, merged: Vec<Entry>) {
        let read: HashSet<String> = self
            .entries
            .iter()
            .filter(|e| e.is_read)
            .map(|e| e.link.clone())
            .collect();

        let mut entries: Vec<Entry> = std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|e| e.feed_url != feed_url)
            .collect();
        entries.extend(merged.into_iter().map(|mut entry| {
            if read.contains(&entry.link) {
                entry.is_read = true;
            }
            entry
        }));

        self.entries = dedup_by_link(entries);
        sort_newest_first(&mut self.entries);
    }

    /// Returns false when the link is unknown or already read.
    pub fn mark_read(&mut self, link: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.link == link) {
            Some(entry) if !entry.is_read => {
                entry.is_read = true;
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read_in_feed(&mut self, feed_url: &str) -> usize {
        self.mark_where(|e| e.feed_url == feed_url)
    }

    pub fn mark_all_read(&mut self) -> usize {
        self.mark_where(|_| true)
    }

    fn mark_where(&mut self, pred: impl Fn(&Entry) -> bool) -> usize {
        let mut count = 0;
        for entry in self.entries.iter_mut().filter(|e| !e.is_read && pred(e)) {
            entry.is_read = true;
            count += 1;
        }
        count
    }

    /// Mark read every stored link that `blob` records as read.
    ///
    /// Lets read flags written by another process survive our next write.
    /// A malformed blob changes nothing.
    pub fn merge_read_flags(&mut self, blob: &str) -> usize {
        let Ok(Value::Array(values)) = serde_json::from_str::<Value>(blob) else {
            return 0;
        };
        let read: HashSet<String> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value::<Entry>(value).ok())
            .filter(|e| e.is_read)
            .map(|e| e.link)
            .collect();
        self.mark_where(|e| read.contains(&e.link))
    }

    /// Drop entries whose feed is no longer configured.
    pub fn purge_orphans(&mut self) -> usize {
        let urls: HashSet<&str> = self.feeds.iter().map(|f| f.url.as_str()).collect();
        let before = self.entries.len();
        self.entries.retain(|e| urls.contains(e.feed_url.as_str()));
        before - self.entries.len()
    }

    /// Serialize every entry for the `feedItems` setting.
    pub fn persist(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

/// Keep one entry per link, the later one in `entries` winning. A read
/// flag on the losing side carries over.
fn dedup_by_link(entries: Vec<Entry>) -> Vec<Entry> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut out: Vec<Entry> = Vec::with_capacity(entries.len());

    for entry in entries.into_iter().rev() {
        match index.get(&entry.link) {
            Some(&pos) => {
                if entry.is_read {
                    out[pos].is_read = true;
                }
            }
            None => {
                index.insert(entry.link.clone(), out.len());
                out.push(entry);
            }
        }
    }

    out.reverse();
    out
}

fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
