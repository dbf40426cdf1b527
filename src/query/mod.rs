//! Read-only projection of the store for callers.

use std::collections::HashMap;

use crate::domain::ProjectedEntry;
use crate::store::ItemStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub entries: Vec<ProjectedEntry>,
    pub unread: usize,
    pub read: usize,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Group heading for an entry, counted over this projection.
    pub fn group_label(&self, item: &ProjectedEntry) -> String {
        if item.entry.is_read {
            format!("Read ({})", self.read)
        } else {
            format!("Unread ({})", self.unread)
        }
    }
}

/// Join entries with their feeds, cap each feed at its display cap, filter
/// by title and sort newest first.
pub fn project(store: &ItemStore, search: &str) -> Projection {
    let feeds: HashMap<&str, _> = store.feeds().iter().map(|f| (f.url.as_str(), f)).collect();

    let mut joined: Vec<ProjectedEntry> = store
        .entries()
        .iter()
        .filter_map(|entry| {
            feeds.get(entry.feed_url.as_str()).map(|feed| ProjectedEntry {
                entry: entry.clone(),
                feed: (*feed).clone(),
            })
        })
        .collect();
    joined.sort_by(|a, b| b.entry.published_at.cmp(&a.entry.published_at));

    let mut shown: HashMap<String, usize> = HashMap::new();
    joined.retain(|item| {
        let count = shown.entry(item.feed.url.clone()).or_insert(0);
        *count += 1;
        *count <= item.feed.display_cap()
    });

    if !search.is_empty() {
        let needle = search.to_lowercase();
        joined.retain(|item| item.entry.title.to_lowercase().contains(&needle));
    }

    let read = joined.iter().filter(|item| item.entry.is_read).count();
    Projection {
        unread: joined.len() - read,
        read,
        entries: joined,
    }
}
