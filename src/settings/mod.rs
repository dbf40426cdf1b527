//! Key/value settings the aggregator reads its feeds from and persists its
//! items to.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::app::Result;

pub use file::JsonFileSettings;
pub use memory::MemorySettings;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChange {
    pub key: String,
    pub value: String,
}

#[async_trait]
pub trait Settings: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`. Secret values are never logged.
    async fn save(&self, key: &str, value: &str, is_secret: bool) -> Result<()>;

    /// Changes made after this call, including the subscriber's own saves.
    fn subscribe(&self) -> broadcast::Receiver<SettingChange>;
}

pub(crate) fn change_channel() -> broadcast::Sender<SettingChange> {
    broadcast::channel(CHANGE_CHANNEL_CAPACITY).0
}

pub(crate) fn log_save(key: &str, value: &str, is_secret: bool) {
    if is_secret {
        tracing::debug!("Saved setting {} (secret)", key);
    } else {
        tracing::debug!("Saved setting {} ({} bytes)", key, value.len());
    }
}
