//! Quiet-period debouncing
//!
//! Pure state: callers pass the current instant, so nothing here sleeps or
//! spawns. A value written with [`Debounced::set`] becomes the settled value
//! once `quiet` has elapsed without another write.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debounced<T> {
    settled: T,
    pending: Option<(T, Instant)>,
    quiet: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, quiet: Duration) -> Self {
        Self {
            settled: initial,
            pending: None,
            quiet,
        }
    }

    /// Record a new value; restarts the quiet period
    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// Promote the pending value if its quiet period has elapsed
    ///
    /// Returns true when the settled value changed.
    pub fn settle(&mut self, now: Instant) -> bool {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.flush(),
            _ => false,
        }
    }

    /// Promote the pending value immediately
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some((value, _)) if value != self.settled => {
                self.settled = value;
                true
            }
            _ => false,
        }
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }

    /// Latest written value, settled or not
    pub fn latest(&self) -> &T {
        self.pending.as_ref().map(|(v, _)| v).unwrap_or(&self.settled)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, d)| *d)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
