use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::app::Result;
use crate::domain::{parse_sources, FeedSource};
use crate::fetcher::{FeedParser, DEFAULT_TIMEOUT_MS};
use crate::merge::merge;
use crate::opener::LinkOpener;
use crate::query::{project, Projection};
use crate::scheduler::{Scheduler, SyncFn, Timer, TokioTimer};
use crate::settings::Settings;
use crate::store::{ItemStore, FEEDS_KEY, FEED_ITEMS_KEY};

/// Feeds synced at once by [`Aggregator::sync_all`].
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub fetch_timeout: Duration,
    /// Delete entries of feeds dropped from the configuration instead of
    /// only hiding them.
    pub purge_removed_feeds: bool,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            purge_removed_feeds: false,
        }
    }
}

/// Owns the item store, the feed set and the per-feed timers.
///
/// Share it as `Arc<Aggregator>`; timers only hold weak references, so
/// dropping the last `Arc` stops everything.
pub struct Aggregator {
    store: Mutex<ItemStore>,
    scheduler: Scheduler,
    parser: Arc<dyn FeedParser + Send + Sync>,
    settings: Arc<dyn Settings>,
    opener: Arc<dyn LinkOpener>,
    options: AggregatorOptions,
    /// Held across serialize + save so writes land in order.
    persist_lock: tokio::sync::Mutex<()>,
}

impl Aggregator {
    pub fn new(
        parser: Arc<dyn FeedParser + Send + Sync>,
        settings: Arc<dyn Settings>,
        opener: Arc<dyn LinkOpener>,
        options: AggregatorOptions,
    ) -> Self {
        Self::with_timer(parser, settings, opener, options, Arc::new(TokioTimer::new()))
    }

    pub fn with_timer(
        parser: Arc<dyn FeedParser + Send + Sync>,
        settings: Arc<dyn Settings>,
        opener: Arc<dyn LinkOpener>,
        options: AggregatorOptions,
        timer: Arc<dyn Timer>,
    ) -> Self {
        Self {
            store: Mutex::new(ItemStore::new()),
            scheduler: Scheduler::new(timer),
            parser,
            settings,
            opener,
            options,
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, ItemStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &Arc<dyn Settings> {
        &self.settings
    }

    pub fn feeds(&self) -> Vec<FeedSource> {
        self.lock_store().feeds().to_vec()
    }

    /// Whether `link` is stored, displayed or not.
    pub fn contains(&self, link: &str) -> bool {
        self.lock_store().get(link).is_some()
    }

    /// Write the current store to the `feedItems` setting.
    ///
    /// Read flags already persisted by another writer are merged in first.
    /// The snapshot is taken under `persist_lock`, so a later write always
    /// carries every earlier change.
    async fn persist_items(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let persisted = self.settings.get(FEED_ITEMS_KEY).await?;

        let blob = {
            let mut store = self.lock_store();
            if let Some(persisted) = persisted {
                let merged = store.merge_read_flags(&persisted);
                if merged > 0 {
                    tracing::info!("Picked up {} items marked read elsewhere", merged);
                }
            }
            store.persist()?
        };

        self.settings.save(FEED_ITEMS_KEY, &blob, false).await
    }

    /// Load persisted items and the configured feeds without scheduling.
    ///
    /// A malformed `feeds` value is logged and treated as no feeds.
    pub async fn load(&self) -> Result<Vec<FeedSource>> {
        if let Some(blob) = self.settings.get(FEED_ITEMS_KEY).await? {
            self.lock_store().load(&blob);
        }

        let sources = match self.settings.get(FEEDS_KEY).await? {
            Some(raw) => parse_sources(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring configured feeds: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        tracing::info!("Loaded {} feeds", sources.len());

        self.lock_store().replace_feeds(sources.clone());
        Ok(sources)
    }

    /// Replace in-memory items with the persisted ones.
    pub async fn reload_items(&self) -> Result<usize> {
        let blob = self
            .settings
            .get(FEED_ITEMS_KEY)
            .await?
            .unwrap_or_else(|| "[]".to_string());
        Ok(self.lock_store().load(&blob))
    }

    /// Load state and arm a timer per feed.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let sources = self.load().await?;
        self.reconfigure(sources).await
    }

    /// Install a new feed set and re-arm the scheduler for it.
    pub async fn reconfigure(self: &Arc<Self>, sources: Vec<FeedSource>) -> Result<()> {
        let purged = {
            let mut store = self.lock_store();
            store.replace_feeds(sources.clone());
            if self.options.purge_removed_feeds {
                store.purge_orphans()
            } else {
                0
            }
        };

        if purged > 0 {
            tracing::info!("Purged {} items of removed feeds", purged);
            self.persist_items().await?;
        }

        self.scheduler.arm(&sources, self.sync_fn());
        Ok(())
    }

    fn sync_fn(self: &Arc<Self>) -> SyncFn {
        let weak = Arc::downgrade(self);
        Arc::new(move |source: FeedSource| {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(this) => this.sync_feed(&source).await,
                    None => Ok(0),
                }
            }
            .boxed()
        })
    }

    /// Fetch one feed and merge its new entries into the store.
    ///
    /// The store is read at merge time, after the fetch, so an overlapping
    /// sync or a mark-as-read made meanwhile is never undone.
    pub async fn sync_feed(&self, source: &FeedSource) -> Result<usize> {
        tracing::info!("Start syncing feed {}", source.display_title());

        let mut fresh = self
            .parser
            .fetch_entries(&source.url, self.options.fetch_timeout)
            .await?;
        for entry in &mut fresh {
            entry.feed_url.clone_from(&source.url);
        }

        let update = {
            let mut store = self.lock_store();
            let existing = store.entries_for_feed(&source.url);
            let merged = merge(&existing, fresh, source.retention_count);
            if merged.added == 0 {
                None
            } else {
                let kept = merged.entries.len();
                store.upsert_merged(&source.url, merged.entries);
                Some((merged.added, kept))
            }
        };

        let Some((added, kept)) = update else {
            tracing::info!("No new items in feed {}", source.display_title());
            return Ok(0);
        };

        self.persist_items().await?;
        tracing::info!(
            "Finished syncing feed {}: {} new, {} kept",
            source.display_title(),
            added,
            kept
        );
        Ok(added)
    }

    /// Sync every configured feed once, a few at a time.
    pub async fn sync_all(&self) -> Vec<(FeedSource, Result<usize>)> {
        let feeds = self.feeds();
        futures::stream::iter(feeds)
            .map(|source| async move {
                let result = self.sync_feed(&source).await;
                (source, result)
            })
            .buffer_unordered(DEFAULT_WORKERS)
            .collect()
            .await
    }

    pub fn query(&self, search: &str) -> Projection {
        project(&self.lock_store(), search)
    }

    /// Returns false, without persisting, if the link is unknown or
    /// already read.
    pub async fn mark_as_read(&self, link: &str) -> Result<bool> {
        {
            let mut store = self.lock_store();
            if store.get(link).is_none() {
                tracing::warn!("Failed to mark item as read, not found: {}", link);
                return Ok(false);
            }
            if !store.mark_read(link) {
                return Ok(false);
            }
        }

        tracing::info!("Marked item as read: {}", link);
        self.persist_items().await?;
        Ok(true)
    }

    pub async fn mark_all_as_read_in_feed(&self, feed_url: &str) -> Result<usize> {
        self.mark_many(|store| store.mark_all_read_in_feed(feed_url)).await
    }

    pub async fn mark_all_as_read(&self) -> Result<usize> {
        self.mark_many(ItemStore::mark_all_read).await
    }

    async fn mark_many(&self, mark: impl FnOnce(&mut ItemStore) -> usize) -> Result<usize> {
        let count = mark(&mut *self.lock_store());
        if count > 0 {
            tracing::info!("Marked {} items as read", count);
            self.persist_items().await?;
        }
        Ok(count)
    }

    /// Open the link, then mark it read.
    pub async fn open_link(&self, link: &str) -> Result<bool> {
        self.opener.open(link)?;
        self.mark_as_read(link).await
    }

    /// Replace the `feeds` setting. A running watcher picks it up.
    pub async fn set_feeds(&self, sources: &[FeedSource]) -> Result<()> {
        let raw = serde_json::to_string(sources)?;
        self.settings.save(FEEDS_KEY, &raw, false).await
    }

    /// Follow `feeds` changes and reconfigure on each one.
    pub fn watch_settings(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.settings.subscribe();
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let raw = match changes.recv().await {
                    Ok(change) if change.key == FEEDS_KEY => Some(change.value),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Missed {} setting changes, re-reading feeds", missed);
                        None
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(this) = weak.upgrade() else { break };

                let raw = match raw {
                    Some(raw) => raw,
                    None => match this.settings.get(FEEDS_KEY).await {
                        Ok(Some(raw)) => raw,
                        Ok(None) => "[]".to_string(),
                        Err(e) => {
                            tracing::error!("Failed to read feeds: {}", e);
                            continue;
                        }
                    },
                };

                match parse_sources(&raw) {
                    Ok(sources) => {
                        tracing::info!("Feeds updated: {}", sources.len());
                        if let Err(e) = this.reconfigure(sources).await {
                            tracing::error!("Failed to apply feeds update: {}", e);
                        }
                    }
                    Err(e) => tracing::warn!("Ignoring feeds update: {}", e),
                }
            }
        })
    }

    /// Cancel every timer.
    pub fn stop(&self) {
        self.scheduler.disarm_all();
        tracing::info!("Stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FeedkeeperError;
    use crate::domain::Entry;
    use crate::settings::{JsonFileSettings, MemorySettings, SettingChange};
    use crate::testing::CapturedLogs;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;
    use tokio::sync::broadcast;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::{HashMap, HashSet};
    use tokio_test::{assert_err, assert_ok};

    const F: &str = "https://example.com/f.xml";
    const G: &str = "https://example.com/g.xml";

    #[derive(Default)]
    struct FakeParser {
        responses: Mutex<HashMap<String, Vec<Entry>>>,
        failing: Mutex<HashSet<String>>,
    }

    impl FakeParser {
        fn respond(&self, url: &str, entries: Vec<Entry>) {
            self.responses.lock().unwrap().insert(url.to_string(), entries);
        }

        fn fail(&self, url: &str) {
            self.failing.lock().unwrap().insert(url.to_string());
        }
    }

    #[async_trait]
    impl FeedParser for FakeParser {
        async fn fetch_entries(&self, url: &str, timeout: Duration) -> Result<Vec<Entry>> {
            if self.failing.lock().unwrap().contains(url) {
                return Err(FeedkeeperError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, link: &str) -> Result<()> {
            self.opened.lock().unwrap().push(link.to_string());
            Ok(())
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn entry(feed: &str, link: &str, d: u32) -> Entry {
        Entry::new(feed, link, format!("Title {}", link), day(d))
    }

    fn feed(url: &str, cap: usize) -> FeedSource {
        FeedSource::new(url, url, 1).with_retention(cap)
    }

    struct Harness {
        aggregator: Arc<Aggregator>,
        parser: Arc<FakeParser>,
        settings: Arc<MemorySettings>,
        opener: Arc<RecordingOpener>,
    }

    fn harness(settings: MemorySettings) -> Harness {
        let parser = Arc::new(FakeParser::default());
        let settings = Arc::new(settings);
        let opener = Arc::new(RecordingOpener::default());
        let aggregator = Arc::new(Aggregator::new(
            parser.clone(),
            settings.clone(),
            opener.clone(),
            AggregatorOptions::default(),
        ));
        Harness {
            aggregator,
            parser,
            settings,
            opener,
        }
    }

    fn feeds_json(sources: &[FeedSource]) -> String {
        serde_json::to_string(sources).unwrap()
    }

    fn links(p: &Projection) -> Vec<&str> {
        p.entries.iter().map(|i| i.entry.link.as_str()).collect()
    }

    #[tokio::test]
    async fn test_first_sync_into_empty_store() {
        let h = harness(MemorySettings::new());
        h.aggregator.reconfigure(vec![feed(F, 2)]).await.unwrap();
        h.aggregator.stop();
        h.parser.respond(F, vec![entry(F, "a", 1), entry(F, "b", 2)]);

        assert_eq!(assert_ok!(h.aggregator.sync_feed(&feed(F, 2)).await), 2);
        assert_eq!(links(&h.aggregator.query("")), vec!["b", "a"]);

        let persisted = h.settings.get(FEED_ITEMS_KEY).await.unwrap().unwrap();
        let mut restored = ItemStore::new();
        assert_eq!(restored.load(&persisted), 2);
    }

    #[tokio::test]
    async fn test_resync_trims_to_retention() {
        let h = harness(MemorySettings::new());
        h.aggregator.reconfigure(vec![feed(F, 2)]).await.unwrap();
        h.aggregator.stop();

        h.parser.respond(F, vec![entry(F, "a", 1), entry(F, "b", 2)]);
        h.aggregator.sync_feed(&feed(F, 2)).await.unwrap();

        h.parser.respond(F, vec![entry(F, "a", 1), entry(F, "c", 3)]);
        assert_eq!(h.aggregator.sync_feed(&feed(F, 2)).await.unwrap(), 1);
        assert_eq!(links(&h.aggregator.query("")), vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_mark_unknown_link_does_not_persist() {
        let h = harness(MemorySettings::new());
        let mut changes = h.settings.subscribe();

        assert!(!h.aggregator.mark_as_read("a").await.unwrap());
        assert!(changes.try_recv().is_err());
        assert_eq!(h.settings.get(FEED_ITEMS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_persisted_items_start_empty() {
        let h = harness(MemorySettings::with_values([
            (FEED_ITEMS_KEY, "not-json".to_string()),
            (FEEDS_KEY, feeds_json(&[feed(F, 2)])),
        ]));

        let logs = CapturedLogs::default();
        let sources = {
            let _guard = tracing::subscriber::set_default(logs.subscriber());
            h.aggregator.load().await.unwrap()
        };
        assert_eq!(sources.len(), 1);
        assert!(h.aggregator.query("").is_empty());
        assert!(logs.contents().contains("WARN"));
        assert!(logs.contents().contains("starting empty"));
    }

    #[tokio::test]
    async fn test_malformed_feeds_setting_is_not_fatal() {
        let h = harness(MemorySettings::with_values([(FEEDS_KEY, "{oops")]));
        h.aggregator.start().await.unwrap();
        assert!(h.aggregator.feeds().is_empty());
        assert!(h.aggregator.scheduler().armed_urls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_feeds_on_same_interval_keep_both() {
        let h = harness(MemorySettings::with_values([(
            FEEDS_KEY,
            feeds_json(&[feed(F, 10), feed(G, 10)]),
        )]));
        h.parser.respond(F, vec![entry(F, "f1", 1)]);
        h.parser.respond(G, vec![entry(G, "g1", 2)]);

        h.aggregator.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(links(&h.aggregator.query("")), vec!["g1", "f1"]);

        h.parser.respond(F, vec![entry(F, "f1", 1), entry(F, "f2", 3)]);
        h.parser.respond(G, vec![entry(G, "g1", 2), entry(G, "g2", 4)]);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(links(&h.aggregator.query("")), vec!["g2", "f2", "g1", "f1"]);

        h.aggregator.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_feed_keeps_other_items() {
        let h = harness(MemorySettings::with_values([(
            FEEDS_KEY,
            feeds_json(&[feed(F, 10), feed(G, 10)]),
        )]));
        h.parser.respond(G, vec![entry(G, "g1", 2)]);
        h.parser.fail(F);

        h.aggregator.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_err!(h.aggregator.sync_feed(&feed(F, 10)).await);

        assert_eq!(links(&h.aggregator.query("")), vec!["g1"]);
        assert_eq!(h.aggregator.scheduler().armed_urls().len(), 2);
        h.aggregator.stop();
    }

    #[tokio::test]
    async fn test_read_state_survives_refetch() {
        let h = harness(MemorySettings::new());
        h.aggregator.reconfigure(vec![feed(F, 10)]).await.unwrap();
        h.aggregator.stop();

        h.parser.respond(F, vec![entry(F, "a", 1)]);
        h.aggregator.sync_feed(&feed(F, 10)).await.unwrap();
        assert!(h.aggregator.mark_as_read("a").await.unwrap());
        assert!(!h.aggregator.mark_as_read("a").await.unwrap());

        h.parser.respond(F, vec![entry(F, "a", 1), entry(F, "b", 2)]);
        h.aggregator.sync_feed(&feed(F, 10)).await.unwrap();

        let p = h.aggregator.query("");
        assert_eq!((p.unread, p.read), (1, 1));
        assert!(p.entries.iter().any(|i| i.entry.link == "a" && i.entry.is_read));
    }

    #[tokio::test]
    async fn test_mark_all() {
        let h = harness(MemorySettings::new());
        h.aggregator.reconfigure(vec![feed(F, 10), feed(G, 10)]).await.unwrap();
        h.aggregator.stop();
        h.parser.respond(F, vec![entry(F, "f1", 1), entry(F, "f2", 2)]);
        h.parser.respond(G, vec![entry(G, "g1", 3)]);
        for (_, result) in h.aggregator.sync_all().await {
            result.unwrap();
        }

        assert_eq!(h.aggregator.mark_all_as_read_in_feed(F).await.unwrap(), 2);
        assert_eq!(h.aggregator.query("").unread, 1);
        assert_eq!(h.aggregator.mark_all_as_read().await.unwrap(), 1);
        assert_eq!(h.aggregator.mark_all_as_read().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_link_marks_read() {
        let h = harness(MemorySettings::new());
        h.aggregator.reconfigure(vec![feed(F, 10)]).await.unwrap();
        h.aggregator.stop();
        h.parser.respond(F, vec![entry(F, "a", 1)]);
        h.aggregator.sync_feed(&feed(F, 10)).await.unwrap();

        assert!(h.aggregator.open_link("a").await.unwrap());
        assert_eq!(*h.opener.opened.lock().unwrap(), vec!["a".to_string()]);
        assert_eq!(h.aggregator.query("").read, 1);
    }

    #[tokio::test]
    async fn test_purge_removed_feeds() {
        let parser = Arc::new(FakeParser::default());
        let settings = Arc::new(MemorySettings::new());
        let aggregator = Arc::new(Aggregator::new(
            parser.clone(),
            settings.clone(),
            Arc::new(RecordingOpener::default()),
            AggregatorOptions {
                purge_removed_feeds: true,
                ..AggregatorOptions::default()
            },
        ));
        aggregator.reconfigure(vec![feed(F, 10), feed(G, 10)]).await.unwrap();
        aggregator.stop();
        parser.respond(F, vec![entry(F, "f1", 1)]);
        parser.respond(G, vec![entry(G, "g1", 2)]);
        aggregator.sync_all().await;

        aggregator.reconfigure(vec![feed(G, 10)]).await.unwrap();
        aggregator.stop();

        let persisted = settings.get(FEED_ITEMS_KEY).await.unwrap().unwrap();
        let mut restored = ItemStore::new();
        assert_eq!(restored.load(&persisted), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_change_reconfigures() {
        let h = harness(MemorySettings::with_values([(FEEDS_KEY, feeds_json(&[feed(F, 10)]))]));
        h.aggregator.start().await.unwrap();
        let watcher = h.aggregator.watch_settings();

        h.aggregator.set_feeds(&[feed(G, 10)]).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(h.aggregator.scheduler().armed_urls(), vec![G.to_string()]);
        assert_eq!(h.aggregator.feeds(), vec![feed(G, 10)]);

        h.aggregator.stop();
        watcher.abort();
    }

    /// Delays its first save, so a later write can overtake it.
    struct SlowFirstSave {
        inner: MemorySettings,
        delayed: AtomicBool,
    }

    #[async_trait]
    impl Settings for SlowFirstSave {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn save(&self, key: &str, value: &str, is_secret: bool) -> Result<()> {
            if !self.delayed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.inner.save(key, value, is_secret).await
        }

        fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
            self.inner.subscribe()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_syncs_persist_in_order() {
        let parser = Arc::new(FakeParser::default());
        let settings = Arc::new(SlowFirstSave {
            inner: MemorySettings::new(),
            delayed: AtomicBool::new(false),
        });
        let aggregator = Arc::new(Aggregator::new(
            parser.clone(),
            settings.clone(),
            Arc::new(RecordingOpener::default()),
            AggregatorOptions::default(),
        ));
        aggregator.reconfigure(vec![feed(F, 10), feed(G, 10)]).await.unwrap();
        aggregator.stop();
        parser.respond(F, vec![entry(F, "f1", 1)]);
        parser.respond(G, vec![entry(G, "g1", 2)]);

        let feed_f = feed(F, 10);
        let feed_g = feed(G, 10);
        let (f, g) = tokio::join!(
            aggregator.sync_feed(&feed_f),
            aggregator.sync_feed(&feed_g)
        );
        assert_eq!((f.unwrap(), g.unwrap()), (1, 1));

        let persisted = settings.get(FEED_ITEMS_KEY).await.unwrap().unwrap();
        let mut restored = ItemStore::new();
        assert_eq!(restored.load(&persisted), 2);
    }

    async fn file_backed(path: &std::path::Path, parser: Arc<FakeParser>) -> Arc<Aggregator> {
        let settings = Arc::new(JsonFileSettings::open(path).await.unwrap());
        Arc::new(Aggregator::new(
            parser,
            settings,
            Arc::new(RecordingOpener::default()),
            AggregatorOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_second_process_edits_survive_daemon_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let parser = Arc::new(FakeParser::default());
        parser.respond(F, vec![entry(F, "a", 1)]);

        let daemon = file_backed(&path, parser.clone()).await;
        daemon.set_feeds(&[feed(F, 10)]).await.unwrap();
        daemon.load().await.unwrap();
        daemon.sync_feed(&feed(F, 10)).await.unwrap();

        let cli = file_backed(&path, parser.clone()).await;
        let mut feeds = cli.load().await.unwrap();
        assert!(cli.mark_as_read("a").await.unwrap());
        feeds.push(feed(G, 10));
        cli.set_feeds(&feeds).await.unwrap();

        parser.respond(F, vec![entry(F, "a", 1), entry(F, "b", 2)]);
        assert_eq!(daemon.sync_feed(&feed(F, 10)).await.unwrap(), 1);

        let reader = file_backed(&path, parser).await;
        assert_eq!(reader.load().await.unwrap(), vec![feed(F, 10), feed(G, 10)]);
        let p = reader.query("");
        assert_eq!(links(&p), vec!["b", "a"]);
        assert_eq!((p.unread, p.read), (1, 1));
        assert!(daemon.query("").entries.iter().any(|i| i.entry.link == "a" && i.entry.is_read));
    }

    #[tokio::test]
    async fn test_contains_ignores_display_cap() {
        let h = harness(MemorySettings::new());
        h.aggregator
            .reconfigure(vec![feed(F, 10).with_max_items(1)])
            .await
            .unwrap();
        h.aggregator.stop();
        h.parser.respond(F, vec![entry(F, "a", 1), entry(F, "b", 2)]);
        h.aggregator.sync_feed(&feed(F, 10)).await.unwrap();

        assert_eq!(links(&h.aggregator.query("")), vec!["b"]);
        assert!(h.aggregator.contains("a"));
        assert!(!h.aggregator.contains("c"));
    }
}
