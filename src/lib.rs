//! # feedkeeper
//!
//! A background feed aggregator: every subscribed feed is fetched on its
//! own interval, new entries are merged into a bounded per-feed history,
//! and the result is served as a read/unread-tracked, searchable list.
//!
//! ## Architecture
//!
//! ```text
//! Settings → Scheduler → Fetcher/Normalizer → Merge → Store → Query
//! ```
//!
//! - [`scheduler`]: one repeating timer per feed
//! - [`fetcher`]: HTTP fetching with a per-feed timeout
//! - [`normalizer`]: RSS/Atom/JSON Feed to [`Entry`](domain::Entry)
//! - [`merge`]: dedup + retention for one feed
//! - [`store`]: all entries, keyed by link, with read flags
//! - [`query`]: joined, capped, filtered, sorted projection
//!
//! ## Quick Start
//!
//! ```bash
//! feedkeeper feeds add https://blog.rust-lang.org/feed.xml --interval 60
//! feedkeeper run            # keep syncing until Ctrl-C
//! feedkeeper list rust      # search titles
//! feedkeeper open <link>    # open in browser, mark read
//! ```

/// Application wiring and error types.
///
/// [`Aggregator`](app::Aggregator) owns the store, feed set and timers;
/// [`AppContext`](app::AppContext) builds one from the config file.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/feedkeeper/config.toml`.
pub mod config;

/// Foreground runner with signal handling.
pub mod daemon;

/// Core domain models.
///
/// - [`FeedSource`](domain::FeedSource): a subscribed feed
/// - [`Entry`](domain::Entry): one article, unique by link
pub mod domain;

/// Feed fetching.
///
/// - [`FeedParser`](fetcher::FeedParser): async trait, url in, entries out
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest + feed-rs implementation
pub mod fetcher;

/// Merge of freshly fetched entries into a feed's history.
pub mod merge;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`Entry`](domain::Entry) structs.
pub mod normalizer;

/// Opening links in the user's browser.
pub mod opener;

/// Projection of stored entries for display.
pub mod query;

/// Per-feed repeating sync timers.
pub mod scheduler;

/// Key/value settings holding feeds and persisted items.
pub mod settings;

/// In-memory item store.
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
