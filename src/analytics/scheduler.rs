use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};

use crate::analytics::VisibilityAnalytics;

/// Periodic flush with a shorter retry after a failed delivery.
#[derive(Debug, Clone, Copy)]
pub struct FlushScheduler {
    interval: Duration,
    retry_backoff: Duration,
}

/// Stops the flush loop when cancelled or dropped.
#[derive(Debug)]
pub struct SchedulerHandle {
    task: AbortHandle,
}

impl SchedulerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl FlushScheduler {
    pub fn new(interval: Duration, retry_backoff: Duration) -> Self {
        Self {
            interval,
            retry_backoff,
        }
    }

    pub fn spawn(&self, analytics: &Arc<VisibilityAnalytics>) -> SchedulerHandle {
        let weak: Weak<VisibilityAnalytics> = Arc::downgrade(analytics);
        let period = self.interval;
        let backoff = self.retry_backoff;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await; // Skip the first immediate tick

            let mut retry_at: Option<Instant> = None;

            loop {
                let deadline = retry_at;
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = async move {
                        if let Some(at) = deadline {
                            sleep_until(at).await;
                        }
                    }, if deadline.is_some() => {}
                }

                let Some(analytics) = weak.upgrade() else {
                    break;
                };

                retry_at = match analytics.flush().await {
                    Ok(_) => None,
                    Err(e) => {
                        tracing::debug!("Retrying view delivery in {:?}: {}", backoff, e);
                        Some(Instant::now() + backoff)
                    }
                };
            }
        });

        SchedulerHandle {
            task: task.abort_handle(),
        }
    }
}
