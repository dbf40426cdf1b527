use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Work run on every tick.
pub type Task = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Cancellable repeating tasks.
pub trait Timer: Send + Sync {
    /// Run `task` now, then every `period` until cancelled.
    fn schedule(&self, key: &str, period: Duration, task: Task) -> TimerHandle;

    /// Stop future runs. A run already in progress finishes.
    fn cancel(&self, handle: TimerHandle);

    /// Schedules not yet cancelled.
    fn active(&self) -> usize;
}

struct Scheduled {
    key: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// [`Timer`] backed by tokio tasks; must be used inside a runtime.
#[derive(Default)]
pub struct TokioTimer {
    next_id: AtomicU64,
    scheduled: Mutex<HashMap<u64, Scheduled>>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timer for TokioTimer {
    fn schedule(&self, key: &str, period: Duration, task: Task) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                task().await;
            }
        });

        let mut scheduled = self.scheduled.lock().unwrap_or_else(|e| e.into_inner());
        scheduled.retain(|_, s| !s.handle.is_finished());
        scheduled.insert(
            id,
            Scheduled {
                key: key.to_string(),
                cancel,
                handle,
            },
        );
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut scheduled = self.scheduled.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = scheduled.remove(&handle.0) {
            tracing::debug!("Cancelled timer for {}", s.key);
            s.cancel.cancel();
        }
    }

    fn active(&self) -> usize {
        self.scheduled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        let scheduled = self.scheduled.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, s) in scheduled.drain() {
            s.cancel.cancel();
        }
    }
}
