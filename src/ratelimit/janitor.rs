//! Periodic eviction of expired counters.
//!
//! The request path never deletes counters, so without a sweep every
//! distinct caller would stay in memory for the life of the process.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::clock::Clock;
use super::store::CounterStore;

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Removes counters whose window has ended.
pub struct Janitor {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Janitor {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    /// Run a single sweep. Returns the number of evicted counters.
    pub fn sweep(&self) -> usize {
        let removed = self.store.remove_expired(self.clock.now_ms());
        debug!(
            removed = removed,
            remaining = self.store.len(),
            "Swept expired rate limit counters"
        );
        removed
    }

    /// Sweep on a fixed interval until the returned handle is shut down
    /// or dropped.
    pub fn spawn(self) -> JanitorHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        info!(interval_secs = self.interval.as_secs(), "Starting counter janitor");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep();
                    }
                    _ = &mut stop_rx => {
                        debug!("Counter janitor stopping");
                        break;
                    }
                }
            }
        });

        JanitorHandle {
            task,
            stop: Some(stop_tx),
        }
    }
}

/// Handle to a running janitor task. Dropping it aborts the task.
pub struct JanitorHandle {
    task: JoinHandle<()>,
    stop: Option<oneshot::Sender<()>>,
}

impl JanitorHandle {
    /// Stop the janitor and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for JanitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
