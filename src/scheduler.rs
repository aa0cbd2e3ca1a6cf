//! Keyed debounce scheduler.
//!
//! `schedule` cancels any pending timer for the same key before arming a new
//! one, so rapid triggers collapse into a single tick and a stale callback
//! can never fire after a newer one. Ticks drain through an mpsc channel the
//! engine owns.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Debounced work items the engine knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tick {
    /// Cheap geometry refresh of the currently drawn boxes.
    RefreshPositions,
    /// Full clear-and-re-render after structural mutation.
    RebuildHighlights,
    /// Full clear-and-re-render after in-page navigation settled.
    NavigationSettled,
}

pub struct Scheduler {
    tx: mpsc::UnboundedSender<Tick>,
    pending: HashMap<Tick, JoinHandle<()>>,
}

impl Scheduler {
    /// Create a scheduler and the receiver its ticks arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Scheduler {
                tx,
                pending: HashMap::new(),
            },
            rx,
        )
    }

    /// Arm `tick` to fire after `delay`, replacing any pending timer for the
    /// same key. Must be called from within a tokio runtime.
    pub fn schedule(&mut self, tick: Tick, delay: Duration) {
        if let Some(handle) = self.pending.remove(&tick) {
            handle.abort();
        }
        trace!(?tick, ?delay, "scheduling debounced tick");
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(tick);
        });
        self.pending.insert(tick, handle);
    }

    /// Cancel a pending timer, if any.
    pub fn cancel(&mut self, tick: Tick) {
        if let Some(handle) = self.pending.remove(&tick) {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
