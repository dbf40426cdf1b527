use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::app::Result;
use crate::settings::{change_channel, log_save, SettingChange, Settings};

/// Process-local settings, nothing written to disk.
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<SettingChange>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySettings {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            changes: change_channel(),
        }
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            changes: change_channel(),
        }
    }
}

#[async_trait]
impl Settings for MemorySettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str, is_secret: bool) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        log_save(key, value, is_secret);
        let _ = self.changes.send(SettingChange {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.changes.subscribe()
    }
}
