//! Configuration management for feedkeeper.
//!
//! Configuration is read from `~/.config/feedkeeper/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! Feeds themselves live in the settings file, not here.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::AggregatorOptions;
use crate::fetcher::http_fetcher::DEFAULT_USER_AGENT;
use crate::fetcher::DEFAULT_TIMEOUT_MS;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-feed fetch timeout in milliseconds.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Delete items of feeds removed from the configuration.
    pub purge_removed_feeds: bool,
    /// Where `settings.json` lives. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "fetch.timeout_ms must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Get the default config file path: `~/.config/feedkeeper/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedkeeper").join("config.toml"))
    }

    /// Directory holding `settings.json`.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("feedkeeper"))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn settings_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join("settings.json"))
    }

    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            fetch_timeout: std::time::Duration::from_millis(self.fetch.timeout_ms),
            purge_removed_feeds: self.store.purge_removed_feeds,
        }
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        format!(
            r##"# feedkeeper configuration
#
# Feeds are not configured here; use `feedkeeper feeds add <url>`.

[fetch]
# Give up on a feed after this many milliseconds. The next tick retries.
timeout_ms = {timeout}
user_agent = "{agent}"

[store]
# Delete stored items of feeds you unsubscribe from.
# When false they are kept but hidden.
purge_removed_feeds = false

# Where settings.json (feeds and items) is kept.
# data_dir = "/path/to/dir"
"##,
            timeout = DEFAULT_TIMEOUT_MS,
            agent = DEFAULT_USER_AGENT,
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.timeout_ms, 5000);
        assert!(!config.store.purge_removed_feeds);
        assert!(config.store.data_dir.is_none());
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: Config = toml::from_str(&Config::default_config_content()).unwrap();
        assert_eq!(config.fetch.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.fetch.user_agent, DEFAULT_USER_AGENT);
        assert!(!config.store.purge_removed_feeds);
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
[store]
purge_removed_feeds = true
data_dir = "/tmp/feedkeeper"
"#,
        )
        .unwrap();
        assert!(config.store.purge_removed_feeds);
        assert_eq!(config.fetch.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(
            config.settings_path().unwrap(),
            PathBuf::from("/tmp/feedkeeper/settings.json")
        );

        let options = config.aggregator_options();
        assert!(options.purge_removed_feeds);
        assert_eq!(options.fetch_timeout.as_millis(), 5000);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\ntimeout_ms = \"soon\"").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\ntimeout_ms = 0").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_create_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedkeeper").join("config.toml");
        Config::create_default_config(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.fetch.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
