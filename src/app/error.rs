use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedkeeperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out after {timeout_ms}ms fetching {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Failed to open {link}: {source}")]
    Open {
        link: String,
        source: std::io::Error,
    },

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedkeeperError {
    /// Fetch-side failures: the tick is dropped and the next one retries.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            FeedkeeperError::Http(_) | FeedkeeperError::Timeout { .. } | FeedkeeperError::FeedParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FeedkeeperError>;
