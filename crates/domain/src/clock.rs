//! Injectable wall clock.
//!
//! Turn metrics and session timestamps read time through [`Clock`] so tests
//! can drive them deterministically with [`ManualClock`].

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward (or backward, for negative values) by `ms`.
    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.now.lock();
        *now += Duration::milliseconds(ms);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Milliseconds from `earlier` to `later`, clamped at zero.
pub fn elapsed_ms(earlier: DateTime<Utc>, later: DateTime<Utc>) -> u64 {
    later
        .signed_duration_since(earlier)
        .num_milliseconds()
        .max(0) as u64
}
