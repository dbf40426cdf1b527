use crate::app::{FeedkeeperError, Result};

/// Hands a link to whatever the OS uses to open URLs.
pub trait LinkOpener: Send + Sync {
    fn open(&self, link: &str) -> Result<()>;
}

pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, link: &str) -> Result<()> {
        open::that(link).map_err(|source| FeedkeeperError::Open {
            link: link.to_string(),
            source,
        })
    }
}
