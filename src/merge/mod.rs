//! Reconciles freshly parsed entries into one feed's retained history.

use std::collections::HashSet;

use crate::domain::Entry;

#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub entries: Vec<Entry>,
    /// How many fresh entries were not already known.
    pub added: usize,
}

/// Fresh entries whose link is not in `existing`. A link repeated inside
/// `fresh` keeps its first occurrence.
pub fn new_items(existing: &[Entry], fresh: Vec<Entry>) -> Vec<Entry> {
    let mut seen: HashSet<String> = existing.iter().map(|e| e.link.clone()).collect();
    fresh
        .into_iter()
        .filter(|entry| seen.insert(entry.link.clone()))
        .collect()
}

/// Merge `fresh` into `existing`, keeping the newest `retention` entries.
///
/// With nothing new, `existing` comes back untouched (even if it is over
/// `retention`), so callers can skip persisting.
pub fn merge(existing: &[Entry], fresh: Vec<Entry>, retention: usize) -> Merged {
    let new = new_items(existing, fresh);
    if new.is_empty() {
        return Merged {
            entries: existing.to_vec(),
            added: 0,
        };
    }

    let added = new.len();
    let mut entries: Vec<Entry> = existing.iter().cloned().chain(new).collect();
    // sort_by is stable: equal dates keep existing-before-new order
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    entries.truncate(retention);

    Merged { entries, added }
}
