pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::parse_interval;

#[derive(Parser)]
#[command(name = "eddy")]
#[command(about = "Follow public channel feeds from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the list of tracked channels
    Track {
        #[command(subcommand)]
        action: TrackAction,
    },
    /// Show channel metadata
    Info {
        /// Channel name
        channel: String,
    },
    /// Print the latest posts and page back through history
    History {
        /// Channel name
        channel: String,

        /// Number of older pages to load after the first one
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },
    /// Follow a channel and print new posts as they arrive
    Watch {
        /// Channel name
        channel: String,

        /// Poll interval (e.g., "30s", "5m"); defaults to the config value
        #[arg(short, long, value_parser = parse_interval)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum TrackAction {
    /// Start tracking a channel
    Add {
        /// Channel name
        channel: String,
    },
    /// Stop tracking a channel
    Remove {
        /// Channel name
        channel: String,
    },
    /// List tracked channels
    List,
}
