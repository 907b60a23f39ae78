use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::app::{EddyError, ErrorKind, Result};
use crate::feed::pager::{FeedPager, InFlight, LoadOlder};
use crate::feed::{Notice, ScrollPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Staged items were moved into the live sequence.
    Applied(usize),
    /// A fresh fetch was merged right away.
    Merged(usize),
    /// The service had nothing newer.
    NothingNew,
    /// No request was made.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub ready: bool,
    pub polling: bool,
    pub refreshing: bool,
    pub loading_more: bool,
    pub has_new_items: bool,
    pub no_more_older: bool,
}

/// Keeps a channel's feed current without moving content under the reader.
///
/// Poll ticks stage new posts; they reach the live sequence only through
/// [`apply_staged`](Self::apply_staged) or a refresh while the view is at the top.
pub struct FeedSynchronizer {
    pager: Arc<FeedPager>,
    scroll: Arc<dyn ScrollPosition + Send + Sync>,
    notices: UnboundedSender<Notice>,
    poll_interval: Duration,
    polling: AtomicBool,
    refreshing: AtomicBool,
    reported: Mutex<HashSet<String>>,
    poll_task: Mutex<Option<AbortHandle>>,
}

impl FeedSynchronizer {
    pub fn new(
        pager: Arc<FeedPager>,
        scroll: Arc<dyn ScrollPosition + Send + Sync>,
        notices: UnboundedSender<Notice>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            pager,
            scroll,
            notices,
            poll_interval,
            polling: AtomicBool::new(false),
            refreshing: AtomicBool::new(false),
            reported: Mutex::new(HashSet::new()),
            poll_task: Mutex::new(None),
        }
    }

    pub fn pager(&self) -> &Arc<FeedPager> {
        &self.pager
    }

    /// Load the first page and move to the ready state.
    pub async fn initialize(&self) -> Result<usize> {
        let page = self
            .pager
            .port()
            .fetch_initial(self.pager.channel())
            .await?;
        let count = page.items.len();
        self.pager.initialize(page.items, page.cursors);
        info!("{}: loaded {} posts", self.pager.channel(), count);
        Ok(count)
    }

    /// Spawn the background poll loop, replacing a previous one.
    pub fn start(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            timer.tick().await; // Skip the first immediate tick

            loop {
                timer.tick().await;
                let Some(this) = weak.upgrade() else {
                    break;
                };
                // Failures are already logged; a poll never notifies the user
                let _ = this.poll_once().await;
            }
        });

        let previous = self.poll_slot().replace(task.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    pub fn shutdown(&self) {
        if let Some(task) = self.poll_slot().take() {
            task.abort();
        }
    }

    /// One poll tick: fetch past the newest known id and stage the result.
    pub async fn poll_once(&self) -> Result<usize> {
        let Some(after) = self.pager.state().latest_after() else {
            return Ok(0);
        };
        let Some(_polling) = InFlight::acquire(&self.polling) else {
            return Ok(0);
        };

        match self.pager.load_newer(after).await {
            Ok(None) => {
                debug!("{}: poll skipped, refresh in flight", self.pager.channel());
                Ok(0)
            }
            Ok(Some(items)) => {
                let staged = self.pager.state().stage(items);
                if staged > 0 {
                    info!("{}: {} new posts waiting", self.pager.channel(), staged);
                }
                Ok(staged)
            }
            Err(e) => {
                self.report(&e, false);
                Err(e)
            }
        }
    }

    /// Merge the staging buffer if the view is at the top; otherwise a no-op.
    pub fn apply_staged(&self) -> usize {
        if !self.scroll.is_at_top() {
            return 0;
        }
        let applied = self.pager.state().commit();
        if applied > 0 {
            debug!("{}: applied {} staged posts", self.pager.channel(), applied);
        }
        applied
    }

    /// Bring the live sequence up to date.
    ///
    /// Whatever is already staged is committed together with the fetched
    /// batch, including when the service has nothing newer. On an error the
    /// staging buffer is left alone.
    pub async fn refresh(&self, user_initiated: bool) -> Result<RefreshOutcome> {
        if self.pager.has_new_items() && self.scroll.is_at_top() {
            return Ok(RefreshOutcome::Applied(self.apply_staged()));
        }

        let Some(after) = self.pager.state().latest_after() else {
            return Ok(RefreshOutcome::Skipped);
        };
        let Some(_refreshing) = InFlight::acquire(&self.refreshing) else {
            return Ok(RefreshOutcome::Skipped);
        };

        match self.pager.load_newer(after).await {
            Ok(None) => Ok(RefreshOutcome::Skipped),
            Ok(Some(items)) if items.is_empty() => Ok(self.commit_staged()),
            Ok(Some(items)) => {
                // Anything already staged is older than this batch, so both
                // go in together to keep the head newest-first
                let merged = {
                    let mut state = self.pager.state();
                    state.stage(items);
                    state.commit()
                };
                Ok(RefreshOutcome::Merged(merged))
            }
            Err(e) if e.is_not_found() => {
                self.report(&e, user_initiated);
                Ok(self.commit_staged())
            }
            Err(e) => {
                self.report(&e, user_initiated);
                Err(e)
            }
        }
    }

    fn commit_staged(&self) -> RefreshOutcome {
        match self.pager.state().commit() {
            0 => RefreshOutcome::NothingNew,
            merged => RefreshOutcome::Merged(merged),
        }
    }

    /// Extend the tail. Skipped while a manual refresh is outstanding.
    pub async fn load_more(&self) -> Result<LoadOlder> {
        if self.refreshing.load(Ordering::SeqCst) {
            return Ok(LoadOlder::Skipped);
        }

        self.pager.load_older().await.inspect_err(|e| {
            self.report(e, true);
        })
    }

    pub fn status(&self) -> SyncStatus {
        let state = self.pager.state();
        SyncStatus {
            ready: state.is_initialized(),
            polling: self.polling.load(Ordering::SeqCst),
            refreshing: self.refreshing.load(Ordering::SeqCst),
            loading_more: self.pager.is_loading_older(),
            has_new_items: state.has_new_items(),
            no_more_older: state.no_more_older(),
        }
    }

    fn report(&self, err: &EddyError, user_initiated: bool) {
        let channel = self.pager.channel();

        if !user_initiated {
            match err.kind() {
                ErrorKind::NotFound => debug!("{}: poll found nothing: {}", channel, err),
                ErrorKind::Transient => warn!("{}: poll failed: {}", channel, err),
                ErrorKind::Validation => error!("{}: poll rejected: {}", channel, err),
            }
            return;
        }

        let notice = match err.kind() {
            ErrorKind::NotFound => Some(Notice::Info(format!("No newer posts in {}", channel))),
            ErrorKind::Transient => {
                warn!("{}: {}", channel, err);
                Some(Notice::Error(format!("Could not update {}: {}", channel, err)))
            }
            ErrorKind::Validation => {
                error!("{}: {}", channel, err);
                let message = err.to_string();
                let first_time = self
                    .reported
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(message.clone());
                first_time.then_some(Notice::Error(message))
            }
        };

        if let Some(notice) = notice {
            // Nobody listening is fine
            let _ = self.notices.send(notice);
        }
    }

    fn poll_slot(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.poll_task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FeedSynchronizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
