pub mod aggregator;
pub mod context;
pub mod error;

pub use aggregator::{Aggregator, AggregatorOptions};
pub use context::AppContext;
pub use error::{FeedkeeperError, Result};
