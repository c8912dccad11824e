//! Wall-clock abstraction so schedules can be driven by virtual time in tests.

use std::cell::Cell;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of wall-clock time and blocking sleep.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock: `sleep` returns immediately after advancing `now`.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
            slept: Cell::new(Duration::ZERO),
        }
    }

    /// Creates a clock at `secs` seconds since the Unix epoch.
    ///
    /// Out-of-range values fall back to the epoch itself.
    pub fn at_unix(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    /// Moves time forward without counting it as sleep, e.g. to model work
    /// that takes time.
    pub fn advance(&self, duration: Duration) {
        if let Ok(delta) = chrono::Duration::from_std(duration) {
            self.now.set(self.now.get() + delta);
        }
    }

    /// Total time spent in `sleep`.
    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        self.slept.set(self.slept.get() + duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_sleep_advances() {
        let clock = ManualClock::at_unix(1_700_000_000);
        clock.sleep(Duration::from_millis(1500));

        assert_eq!(clock.now().timestamp_millis(), 1_700_000_001_500);
        assert_eq!(clock.slept(), Duration::from_millis(1500));

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now().timestamp(), 1_700_000_002);
        assert_eq!(clock.slept(), Duration::from_millis(1500));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let before = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now() > before);
    }
}
