use tokio::time::Instant;

use dinodash_core::host::{RoundHost, RoundResults};
use dinodash_core::time::Millis;

/// Session-side [`RoundHost`]: a monotonic clock anchored at session start
/// and a sink for reported results.
///
/// The clock is latched explicitly so every call inside one tick (and
/// every action applied between two ticks) sees a single `now`.
#[derive(Debug)]
pub struct SessionHost {
    origin: Instant,
    now: Millis,
    reports: Vec<RoundResults>,
}

impl SessionHost {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            now: 0,
            reports: Vec::new(),
        }
    }

    /// Sample the clock. Returns the latched value.
    pub fn latch(&mut self) -> Millis {
        self.now = self.origin.elapsed().as_millis() as Millis;
        self.now
    }

    /// Oldest result not yet collected by the session.
    pub fn take_report(&mut self) -> Option<RoundResults> {
        if self.reports.is_empty() {
            None
        } else {
            Some(self.reports.remove(0))
        }
    }
}

impl Default for SessionHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundHost for SessionHost {
    fn now(&self) -> Millis {
        self.now
    }

    fn report_result(&mut self, results: &RoundResults) {
        tracing::debug!(players = results.len(), "Round result received");
        self.reports.push(results.clone());
    }
}
