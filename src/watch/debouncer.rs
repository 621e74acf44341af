//! Per-class debounce windows.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::core::AssetClass;

/// Tracks the last matching event per class. A class becomes ready once
/// `delay` has passed without a new event for it.
pub(super) struct Debouncer {
    delay: Duration,
    pending: FxHashMap<AssetClass, Instant>,
}

impl Debouncer {
    pub(super) fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: FxHashMap::default(),
        }
    }

    /// Record an event for `class`, restarting its window.
    pub(super) fn add(&mut self, class: AssetClass) {
        self.add_at(class, Instant::now());
    }

    fn add_at(&mut self, class: AssetClass, at: Instant) {
        self.pending.insert(class, at);
    }

    /// Classes whose window has elapsed, in stable order.
    pub(super) fn take_ready(&mut self) -> Vec<AssetClass> {
        self.take_ready_at(Instant::now())
    }

    fn take_ready_at(&mut self, now: Instant) -> Vec<AssetClass> {
        let mut ready: Vec<AssetClass> = self
            .pending
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= self.delay)
            .map(|(class, _)| *class)
            .collect();
        ready.sort();
        for class in &ready {
            self.pending.remove(class);
        }
        ready
    }

    /// Time until the earliest window closes.
    pub(super) fn sleep_duration(&self) -> Duration {
        self.sleep_duration_at(Instant::now())
    }

    fn sleep_duration_at(&self, now: Instant) -> Duration {
        self.pending
            .values()
            .map(|last| self.delay.saturating_sub(now.saturating_duration_since(*last)))
            .min()
            .map_or(Duration::from_secs(86400), |d| d.max(Duration::from_millis(1)))
    }

    #[cfg(test)]
    pub(super) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
