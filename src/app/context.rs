use std::path::PathBuf;
use std::sync::Arc;

use crate::app::aggregator::Aggregator;
use crate::app::error::{FeedkeeperError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::FeedParser;
use crate::opener::SystemOpener;
use crate::settings::JsonFileSettings;

pub struct AppContext {
    pub config: Config,
    pub settings: Arc<JsonFileSettings>,
    pub aggregator: Arc<Aggregator>,
}

impl AppContext {
    /// Wire up the aggregator from `config_path`, or the default config.
    pub async fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(&path),
            None => Config::load(),
        }
        .map_err(|e| FeedkeeperError::Config(e.to_string()))?;

        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> Result<Self> {
        let settings_path = config
            .settings_path()
            .map_err(|e| FeedkeeperError::Config(e.to_string()))?;
        let settings = Arc::new(JsonFileSettings::open(settings_path).await?);

        let parser: Arc<dyn FeedParser + Send + Sync> =
            Arc::new(HttpFetcher::new(&config.fetch.user_agent)?);
        let aggregator = Arc::new(Aggregator::new(
            parser,
            settings.clone(),
            Arc::new(SystemOpener),
            config.aggregator_options(),
        ));

        Ok(Self {
            config,
            settings,
            aggregator,
        })
    }
}
