//! Foreground runner keeping every feed on its schedule.
//!
//! Starts the aggregator, follows `feeds` changes, re-reads the settings
//! file on SIGHUP and stops on SIGINT/SIGTERM.

use std::sync::Arc;

use chrono::Utc;

use crate::app::{Aggregator, Result};
use crate::settings::JsonFileSettings;
use crate::store::FEED_ITEMS_KEY;

pub struct Daemon {
    aggregator: Arc<Aggregator>,
    settings: Arc<JsonFileSettings>,
}

impl Daemon {
    pub fn new(aggregator: Arc<Aggregator>, settings: Arc<JsonFileSettings>) -> Self {
        Self {
            aggregator,
            settings,
        }
    }

    /// Run until a shutdown signal arrives.
    pub async fn run(&self) -> Result<()> {
        let started = Utc::now();
        self.aggregator.start().await?;
        let watcher = self.aggregator.watch_settings();

        tracing::info!(
            "feedkeeper started ({} feeds, PID: {})",
            self.aggregator.feeds().len(),
            std::process::id()
        );

        self.wait_for_shutdown().await?;

        watcher.abort();
        self.aggregator.stop();

        let uptime = Utc::now().signed_duration_since(started);
        tracing::info!("Shutting down after {}s", uptime.num_seconds());
        Ok(())
    }

    #[cfg(unix)]
    async fn wait_for_shutdown(&self) -> Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;

        loop {
            tokio::select! {
                _ = sigterm.recv() => return Ok(()),
                _ = sigint.recv() => return Ok(()),
                _ = sighup.recv() => self.reload().await,
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait_for_shutdown(&self) -> Result<()> {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }

    /// Pick up edits made to the settings file by another process.
    #[cfg_attr(not(unix), allow(dead_code))]
    async fn reload(&self) {
        match self.settings.reload().await {
            Ok(changed) if changed.is_empty() => tracing::info!("Settings unchanged"),
            Ok(changed) => {
                tracing::info!("Settings reloaded: {}", changed.join(", "));
                if changed.iter().any(|key| key == FEED_ITEMS_KEY) {
                    if let Err(e) = self.aggregator.reload_items().await {
                        tracing::error!("Failed to reload items: {}", e);
                    }
                }
            }
            Err(e) => tracing::error!("Failed to reload settings: {}", e),
        }
    }
}
