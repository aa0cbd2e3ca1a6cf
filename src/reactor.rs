//! Maps page events to debounced re-render work.
//!
//! Structural mutation gets the long debounce (a full re-render is costly
//! and mutations arrive in bursts); navigation gets a short fixed settle
//! delay (the DOM has usually settled by the time the event fires); scroll
//! and resize get the cheap position-refresh debounce. Nothing is scheduled
//! while highlighting is off and no boxes are drawn.

use std::time::Duration;

use tracing::debug;

use crate::page::PageEvent;
use crate::scheduler::{Scheduler, Tick};

pub struct Reactor {
    scheduler: Scheduler,
    refresh_debounce: Duration,
    mutation_debounce: Duration,
    navigation_settle: Duration,
}

impl Reactor {
    pub fn new(
        scheduler: Scheduler,
        refresh_debounce: Duration,
        mutation_debounce: Duration,
        navigation_settle: Duration,
    ) -> Self {
        Reactor {
            scheduler,
            refresh_debounce,
            mutation_debounce,
            navigation_settle,
        }
    }

    /// Feed one page event. `highlighting` is the highlight-all flag;
    /// `has_overlay` is whether any boxes are currently drawn (position
    /// refresh also applies to a one-shot target box).
    pub fn observe(&mut self, event: &PageEvent, highlighting: bool, has_overlay: bool) {
        match event {
            PageEvent::Mutated => {
                if highlighting {
                    debug!("structural mutation observed, debouncing re-render");
                    self.scheduler
                        .schedule(Tick::RebuildHighlights, self.mutation_debounce);
                }
            }
            PageEvent::Navigated => {
                if highlighting {
                    debug!("in-page navigation observed, scheduling settle re-render");
                    self.scheduler
                        .schedule(Tick::NavigationSettled, self.navigation_settle);
                }
            }
            PageEvent::Scrolled | PageEvent::Resized => {
                if has_overlay {
                    self.scheduler
                        .schedule(Tick::RefreshPositions, self.refresh_debounce);
                }
            }
        }
    }

    /// Drop any pending full re-renders (called when highlighting is
    /// disabled, so a stale rebuild cannot fire afterwards).
    pub fn cancel_rebuilds(&mut self) {
        self.scheduler.cancel(Tick::RebuildHighlights);
        self.scheduler.cancel(Tick::NavigationSettled);
    }
}

#[cfg(test)]
#[path = "reactor_test.rs"]
mod reactor_test;
