pub mod entry;
pub mod feed;

pub use entry::{Entry, ProjectedEntry};
pub use feed::{parse_sources, FeedSource, DEFAULT_RETENTION};
