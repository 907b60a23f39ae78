//! View reporting.
//!
//! A post counts as seen once it stays visible for the dwell threshold.
//! Seen posts are queued and delivered in batches; a failed batch stays
//! queued and is retried, so delivery is at-least-once.

mod scheduler;
mod transport;

pub use scheduler::{FlushScheduler, SchedulerHandle};
pub use transport::{transport_for, AnalyticsTransport, HttpTransport, NoopTransport};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::app::Result;
use crate::domain::AnalyticsEvent;
use crate::feed::InFlight;

struct DwellTimer {
    generation: u64,
    task: AbortHandle,
}

#[derive(Default)]
struct Tracker {
    queue: Vec<AnalyticsEvent>,
    /// Items that already produced an event. Never shrinks.
    sent: HashSet<i64>,
    pending: HashMap<i64, DwellTimer>,
    generation: u64,
}

pub struct VisibilityAnalytics {
    transport: Arc<dyn AnalyticsTransport + Send + Sync>,
    dwell: Duration,
    tracker: Mutex<Tracker>,
    sending: AtomicBool,
}

impl VisibilityAnalytics {
    pub fn new(transport: Arc<dyn AnalyticsTransport + Send + Sync>, dwell: Duration) -> Self {
        Self {
            transport,
            dwell,
            tracker: Mutex::new(Tracker::default()),
            sending: AtomicBool::new(false),
        }
    }

    /// Feed a visibility transition from the view.
    pub fn on_visibility_change(self: &Arc<Self>, item_id: i64, view_token: &str, is_visible: bool) {
        let mut tracker = self.tracker();

        if !is_visible {
            if let Some(timer) = tracker.pending.remove(&item_id) {
                timer.task.abort();
            }
            return;
        }

        if tracker.sent.contains(&item_id) || tracker.pending.contains_key(&item_id) {
            return;
        }

        tracker.generation += 1;
        let generation = tracker.generation;
        let weak = Arc::downgrade(self);
        let token = view_token.to_string();
        let dwell = self.dwell;

        let task = tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            if let Some(this) = weak.upgrade() {
                this.dwell_elapsed(item_id, generation, token);
            }
        });

        tracker.pending.insert(
            item_id,
            DwellTimer {
                generation,
                task: task.abort_handle(),
            },
        );
    }

    fn dwell_elapsed(&self, item_id: i64, generation: u64, view_token: String) {
        let mut tracker = self.tracker();

        // A stale timer may race a hide/show cycle; only the current one counts
        if tracker.pending.get(&item_id).map(|t| t.generation) != Some(generation) {
            return;
        }
        tracker.pending.remove(&item_id);

        if tracker.sent.insert(item_id) {
            debug!("Item {} seen", item_id);
            tracker.queue.push(AnalyticsEvent::new(item_id, view_token));
        }
    }

    /// Try to deliver everything queued so far.
    ///
    /// On success exactly the delivered snapshot leaves the queue; events
    /// queued while the request was in transit stay for the next flush.
    pub async fn flush(&self) -> Result<usize> {
        let Some(_sending) = InFlight::acquire(&self.sending) else {
            return Ok(0);
        };

        let batch = self.tracker().queue.clone();
        if batch.is_empty() {
            return Ok(0);
        }

        match self.transport.deliver(&batch).await {
            Ok(()) => {
                let mut tracker = self.tracker();
                // Only flush removes, and only one flush runs at a time, so
                // the snapshot is still the head of the queue
                let delivered = batch.len().min(tracker.queue.len());
                tracker.queue.drain(..delivered);
                debug!("Delivered {} view events", delivered);
                Ok(delivered)
            }
            Err(e) => {
                warn!("View delivery failed ({} queued): {}", batch.len(), e);
                Err(e)
            }
        }
    }

    pub fn queued(&self) -> Vec<AnalyticsEvent> {
        self.tracker().queue.clone()
    }

    pub fn is_sent(&self, item_id: i64) -> bool {
        self.tracker().sent.contains(&item_id)
    }

    pub fn pending_timers(&self) -> usize {
        self.tracker().pending.len()
    }

    /// Cancel every running dwell timer.
    pub fn shutdown(&self) {
        let mut tracker = self.tracker();
        for (_, timer) in tracker.pending.drain() {
            timer.task.abort();
        }
    }

    fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for VisibilityAnalytics {
    fn drop(&mut self) {
        self.shutdown();
    }
}
