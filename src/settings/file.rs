use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use crate::app::{FeedkeeperError, Result};
use crate::settings::{change_channel, log_save, SettingChange, Settings};

/// Settings kept as one JSON object of string values, e.g.
/// `{"feeds": "[...]", "feedItems": "[...]"}`.
///
/// Several processes may share the file. Reads go to disk, and a save
/// rewrites only its own key on top of the file's current content.
pub struct JsonFileSettings {
    path: PathBuf,
    /// Values as last announced to subscribers.
    values: Mutex<BTreeMap<String, String>>,
    changes: broadcast::Sender<SettingChange>,
}

impl JsonFileSettings {
    /// Open `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = read_values(&path).await?;
        tracing::debug!("Opened settings {} ({} keys)", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
            changes: change_channel(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and announce keys whose value changed on disk.
    pub async fn reload(&self) -> Result<Vec<String>> {
        let fresh = read_values(&self.path).await?;
        let mut values = self.values.lock().await;

        let mut changed = Vec::new();
        for (key, value) in &fresh {
            if values.get(key) != Some(value) {
                changed.push(key.clone());
                let _ = self.changes.send(SettingChange {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }
        *values = fresh;

        Ok(changed)
    }

    async fn write(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn read_values(path: &Path) -> Result<BTreeMap<String, String>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            FeedkeeperError::Settings(format!("{} is not a settings file: {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Settings for JsonFileSettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _values = self.values.lock().await;
        Ok(read_values(&self.path).await?.remove(key))
    }

    /// Keys another process changed since the last save or reload are
    /// announced along with `key`.
    async fn save(&self, key: &str, value: &str, is_secret: bool) -> Result<()> {
        let mut values = self.values.lock().await;
        let mut fresh = read_values(&self.path).await?;

        let mut changes: Vec<SettingChange> = fresh
            .iter()
            .filter(|(k, v)| k.as_str() != key && values.get(k.as_str()) != Some(*v))
            .map(|(k, v)| SettingChange {
                key: k.clone(),
                value: v.clone(),
            })
            .collect();
        if !changes.is_empty() {
            tracing::debug!("Settings changed on disk: {} keys", changes.len());
        }

        fresh.insert(key.to_string(), value.to_string());
        self.write(&fresh).await?;
        *values = fresh;
        drop(values);

        log_save(key, value, is_secret);
        changes.push(SettingChange {
            key: key.to_string(),
            value: value.to_string(),
        });
        for change in changes {
            let _ = self.changes.send(change);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.changes.subscribe()
    }
}
