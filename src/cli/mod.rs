pub mod commands;

use clap::{Parser, Subcommand};

use crate::domain::DEFAULT_RETENTION;

#[derive(Parser)]
#[command(name = "feedkeeper")]
#[command(about = "Keeps a bounded, read-tracked history of your feeds", long_about = None)]
pub struct Cli {
    /// Path to config.toml (default: ~/.config/feedkeeper/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Keep every feed on its schedule until interrupted
    Run,
    /// Sync every feed once
    Sync,
    /// List items, newest first
    List {
        /// Only show items whose title contains this (case-insensitive)
        search: Option<String>,
    },
    /// Mark one item as read
    Read {
        /// Link of the item
        link: String,
    },
    /// Mark every item of a feed as read
    ReadFeed {
        /// URL of the feed
        url: String,
    },
    /// Mark every item as read
    ReadAll,
    /// Open an item in the browser and mark it as read
    Open {
        /// Link of the item
        link: String,
    },
    /// Manage subscribed feeds
    Feeds {
        #[command(subcommand)]
        action: FeedsAction,
    },
}

#[derive(Subcommand)]
pub enum FeedsAction {
    /// List subscribed feeds
    List,
    /// Subscribe to a feed
    Add {
        /// URL of the feed
        url: String,

        /// Display name (default: the URL)
        #[arg(short, long)]
        title: Option<String>,

        /// Minutes between syncs
        #[arg(short, long, default_value_t = 30)]
        interval: u64,

        /// Items shown for this feed (default: same as --retention)
        #[arg(short, long)]
        max_items: Option<usize>,

        /// Items kept for this feed
        #[arg(short, long, default_value_t = DEFAULT_RETENTION)]
        retention: usize,
    },
    /// Unsubscribe from a feed
    Remove {
        /// URL of the feed
        url: String,
    },
}
