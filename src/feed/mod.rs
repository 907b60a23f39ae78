//! Bidirectional paging of a channel and background discovery of new posts.
//!
//! ```text
//! poll tick ──► FeedPager::load_newer ──► staging ──(at top)──► live head
//! scroll end ─► FeedPager::load_older ─────────────────────────► live tail
//! ```

mod pager;
mod state;
mod synchronizer;

pub(crate) use pager::InFlight;
pub use pager::{FeedPager, LoadOlder};
pub use state::FeedState;
pub use synchronizer::{FeedSynchronizer, RefreshOutcome, SyncStatus};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Scroll position as reported by whatever renders the sequence.
pub trait ScrollPosition {
    fn is_at_top(&self) -> bool;
}

/// Scroll flag updated by the view.
#[derive(Debug)]
pub struct ScrollState {
    at_top: AtomicBool,
}

impl ScrollState {
    pub fn new(at_top: bool) -> Self {
        Self {
            at_top: AtomicBool::new(at_top),
        }
    }

    pub fn set_at_top(&self, at_top: bool) {
        self.at_top.store(at_top, Ordering::SeqCst);
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ScrollPosition for ScrollState {
    fn is_at_top(&self) -> bool {
        self.at_top.load(Ordering::SeqCst)
    }
}

/// Transient, dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Info(msg) => write!(f, "{}", msg),
            Notice::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}
