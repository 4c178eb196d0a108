//! Non-blocking sample clock
//!
//! Gates the per-sample pipeline to a fixed period by comparing a monotonic
//! microsecond reading against the last tick. Callers poll; nothing here
//! sleeps.

use std::time::Duration;

/// Fixed-period tick gate over a free-running microsecond counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleClock {
    period_us: u64,
    last_us: u64,
}

impl SampleClock {
    /// Clock ticking every `period_us` microseconds, first tick due at
    /// `period_us` after zero
    pub fn new(period_us: u64) -> Self {
        Self { period_us, last_us: 0 }
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    pub fn period(&self) -> Duration {
        Duration::from_micros(self.period_us)
    }

    /// True when a tick is due at `now_us`; the tick is then consumed.
    ///
    /// Elapsed time uses wrapping subtraction, so counter rollover is safe.
    /// The next tick is measured from `now_us`, not from the ideal schedule.
    pub fn poll(&mut self, now_us: u64) -> bool {
        if now_us.wrapping_sub(self.last_us) < self.period_us {
            return false;
        }
        self.last_us = now_us;
        true
    }

    /// Microseconds until the next tick is due (0 when already due)
    pub fn until_due(&self, now_us: u64) -> u64 {
        self.period_us.saturating_sub(now_us.wrapping_sub(self.last_us))
    }

    /// Restart the schedule from `now_us`
    pub fn restart(&mut self, now_us: u64) {
        self.last_us = now_us;
    }
}
