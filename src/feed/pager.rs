use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::Result;
use crate::domain::{Direction, Item, Offset};
use crate::feed::state::FeedState;
use crate::fetcher::FetchPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOlder {
    /// A page arrived; this many previously unseen items were appended.
    Appended(usize),
    /// The end of history was reached.
    Exhausted,
    /// Nothing was requested: no cursor, already exhausted, or a request in flight.
    Skipped,
}

/// Clears its flag when dropped, whether the fetch succeeded or not.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the item sequence of one channel and performs directional fetches.
pub struct FeedPager {
    port: Arc<dyn FetchPort + Send + Sync>,
    channel: String,
    state: Mutex<FeedState>,
    older_in_flight: AtomicBool,
    newer_in_flight: AtomicBool,
}

impl FeedPager {
    pub fn new(port: Arc<dyn FetchPort + Send + Sync>, channel: impl Into<String>) -> Self {
        Self {
            port,
            channel: channel.into(),
            state: Mutex::new(FeedState::new()),
            older_in_flight: AtomicBool::new(false),
            newer_in_flight: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub(crate) fn port(&self) -> &Arc<dyn FetchPort + Send + Sync> {
        &self.port
    }

    pub fn initialize(&self, items: Vec<Item>, cursors: Offset) {
        self.state().initialize(items, cursors);
        tracing::debug!("{}: initialized with cursors {:?}", self.channel, cursors);
    }

    /// Fetch the page older than `offset.before` and append it.
    ///
    /// An empty page or a not-found response flips the one-way exhaustion
    /// flag. Other failures leave the state untouched for a later retry.
    pub async fn load_older(&self) -> Result<LoadOlder> {
        let before = {
            let state = self.state();
            match state.offset().before {
                Some(before) if !state.no_more_older() => before,
                _ => return Ok(LoadOlder::Skipped),
            }
        };

        let Some(_guard) = InFlight::acquire(&self.older_in_flight) else {
            return Ok(LoadOlder::Skipped);
        };

        match self
            .port
            .fetch_page(&self.channel, before, Direction::Before)
            .await
        {
            Ok(page) if page.items.is_empty() => {
                self.state().mark_exhausted();
                tracing::info!("{}: reached the oldest post", self.channel);
                Ok(LoadOlder::Exhausted)
            }
            Ok(page) => {
                let appended = self.state().append_older(page.items);
                tracing::debug!("{}: appended {} older items", self.channel, appended);
                Ok(LoadOlder::Appended(appended))
            }
            Err(e) if e.is_not_found() => {
                self.state().mark_exhausted();
                tracing::info!("{}: history ends at {} ({})", self.channel, before, e);
                Ok(LoadOlder::Exhausted)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch items newer than `after`. Merging is left to the caller.
    ///
    /// Returns `None` without a request while another newer-direction fetch
    /// is outstanding.
    pub async fn load_newer(&self, after: i64) -> Result<Option<Vec<Item>>> {
        let Some(_guard) = InFlight::acquire(&self.newer_in_flight) else {
            return Ok(None);
        };

        let page = self
            .port
            .fetch_page(&self.channel, after, Direction::After)
            .await?;
        Ok(Some(page.items))
    }

    pub fn is_loading_older(&self) -> bool {
        self.older_in_flight.load(Ordering::SeqCst)
    }

    pub fn is_loading_newer(&self) -> bool {
        self.newer_in_flight.load(Ordering::SeqCst)
    }

    pub fn items(&self) -> Vec<Item> {
        self.state().items().to_vec()
    }

    pub fn offset(&self) -> Offset {
        self.state().offset()
    }

    pub fn has_new_items(&self) -> bool {
        self.state().has_new_items()
    }

    pub fn no_more_older(&self) -> bool {
        self.state().no_more_older()
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
