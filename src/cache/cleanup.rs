//! Periodic sweep of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::store::QueryCache;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the background task that calls [`QueryCache::cleanup`] on a fixed
/// period. The task is aborted when the handle is stopped or dropped.
pub struct CleanupTask {
    handle: Option<JoinHandle<()>>,
}

impl CleanupTask {
    /// Start sweeping `cache` every `every` (at least one second).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(cache: Arc<QueryCache>, every: Duration) -> Self {
        let period = every.max(MIN_INTERVAL);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = cache.cleanup();
                if removed > 0 {
                    debug!(
                        target = "cache::cleanup",
                        removed,
                        remaining = cache.len(),
                        "Swept expired cache entries"
                    );
                }
            }
        });

        info!(
            target = "cache::cleanup",
            interval_secs = period.as_secs(),
            "Cache cleanup task started"
        );

        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort the sweep and wait for the task to wind down.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            info!(target = "cache::cleanup", "Cache cleanup task stopped");
        }
    }
}

impl Drop for CleanupTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
