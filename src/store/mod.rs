pub mod memory;

pub use memory::ItemStore;

/// Setting key holding the persisted entry list.
pub const FEED_ITEMS_KEY: &str = "feedItems";

/// Setting key holding the JSON array of feed sources.
pub const FEEDS_KEY: &str = "feeds";
