//! One repeating sync per configured feed.

pub mod timer;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::app::Result;
use crate::domain::FeedSource;

pub use timer::{Task, Timer, TimerHandle, TokioTimer};

/// One sync pass for a feed; resolves to the number of new entries.
pub type SyncFn = Arc<dyn Fn(FeedSource) -> BoxFuture<'static, Result<usize>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Scheduled,
    Syncing,
}

/// State per url, tagged with the generation of the arm call that owns it.
type States = Arc<Mutex<HashMap<String, (u64, FeedState)>>>;

pub struct Scheduler {
    timer: Arc<dyn Timer>,
    armed: Mutex<HashMap<String, TimerHandle>>,
    states: States,
    generation: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl Scheduler {
    pub fn new(timer: Arc<dyn Timer>) -> Self {
        Self {
            timer,
            armed: Mutex::new(HashMap::new()),
            states: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// (Re)arm a timer for every source, syncing each immediately.
    ///
    /// Timers for urls missing from `sources` are cancelled first, and every
    /// present url is cancelled before being recreated, so repeated calls
    /// never leave two timers for one feed.
    pub fn arm(&self, sources: &[FeedSource], sync: SyncFn) {
        let mut armed = lock(&self.armed);
        let keep: HashSet<&str> = sources.iter().map(|s| s.url.as_str()).collect();

        armed.retain(|url, handle| {
            if keep.contains(url.as_str()) {
                return true;
            }
            tracing::info!("Stopping schedule for removed feed {}", url);
            self.timer.cancel(*handle);
            lock(&self.states).remove(url);
            false
        });

        for source in sources {
            if let Some(previous) = armed.remove(&source.url) {
                self.timer.cancel(previous);
            }

            let generation = self.generation.fetch_add(1, Ordering::Relaxed);
            lock(&self.states).insert(source.url.clone(), (generation, FeedState::Scheduled));
            let task = Self::task_for(source.clone(), sync.clone(), self.states.clone(), generation);
            let handle = self.timer.schedule(&source.url, source.period(), task);
            armed.insert(source.url.clone(), handle);
            tracing::info!(
                "Scheduled {} every {}m",
                source.display_title(),
                source.refresh_interval
            );
        }
    }

    fn task_for(source: FeedSource, sync: SyncFn, states: States, generation: u64) -> Task {
        Arc::new(move || {
            let source = source.clone();
            let sync = sync.clone();
            let states = states.clone();
            async move {
                set_state(&states, &source.url, generation, FeedState::Syncing);

                match sync(source.clone()).await {
                    Ok(added) => {
                        tracing::debug!("Sync of {} added {} items", source.display_title(), added)
                    }
                    Err(e) if e.is_fetch_error() => {
                        tracing::error!(
                            "Failed to fetch {}, retrying next tick: {}",
                            source.display_title(),
                            e
                        )
                    }
                    Err(e) => {
                        tracing::error!("Failed to sync {}: {}", source.display_title(), e)
                    }
                }

                // a feed removed or re-armed mid-sync keeps its newer state
                set_state(&states, &source.url, generation, FeedState::Scheduled);
            }
            .boxed()
        })
    }

    /// Cancel every timer. Safe to call at any time, including mid-fetch.
    pub fn disarm_all(&self) {
        let mut armed = lock(&self.armed);
        for (_, handle) in armed.drain() {
            self.timer.cancel(handle);
        }
        lock(&self.states).clear();
    }

    pub fn state(&self, url: &str) -> FeedState {
        lock(&self.states)
            .get(url)
            .map(|(_, state)| *state)
            .unwrap_or(FeedState::Idle)
    }

    pub fn armed_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = lock(&self.armed).keys().cloned().collect();
        urls.sort();
        urls
    }
}

fn set_state(states: &States, url: &str, generation: u64, state: FeedState) {
    if let Some(entry) = lock(states).get_mut(url) {
        if entry.0 == generation {
            entry.1 = state;
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.disarm_all();
    }
}
