//! Epoch-aligned cadences.
//!
//! Every cadence fires on multiples of its period counted from the Unix
//! epoch, not from program start, so two runs of the collector sample at the
//! same wall-clock instants. Deadlines are always recomputed from the
//! current time, which keeps slow samples from accumulating drift.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default period of the per-process cadence.
pub const PROCESS_INTERVAL: Duration = Duration::from_secs(5);
/// Default period of the host cadence.
pub const HOST_INTERVAL: Duration = Duration::from_secs(15);
/// Default run length; the loop ends at the next boundary of this period.
pub const RUN_CUTOFF: Duration = Duration::from_secs(60);

/// The periodic obligations of the scheduler.
///
/// Declaration order is tie-break priority: when two deadlines coincide the
/// earlier variant fires and the later one waits for its next boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Cadence {
    /// End of the run.
    Cutoff,
    /// Sample `/proc/meminfo`.
    Host,
    /// Sample every configured process.
    Process,
}

/// The next cadence to fire and how long to wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake {
    pub cadence: Cadence,
    pub delay: Duration,
    /// The boundary being waited for.
    pub at: DateTime<Utc>,
}

/// Rejected schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleError(String);

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schedule: {}", self.0)
    }
}

impl std::error::Error for ScheduleError {}

/// Periods of the three cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    process_every: Duration,
    host_every: Duration,
    run_for: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            process_every: PROCESS_INTERVAL,
            host_every: HOST_INTERVAL,
            run_for: RUN_CUTOFF,
        }
    }
}

impl Schedule {
    /// Creates a schedule. Periods must be at least one millisecond.
    pub fn new(
        process_every: Duration,
        host_every: Duration,
        run_for: Duration,
    ) -> Result<Self, ScheduleError> {
        for (name, period) in [
            ("process interval", process_every),
            ("host interval", host_every),
            ("run length", run_for),
        ] {
            if period < Duration::from_millis(1) {
                return Err(ScheduleError(format!("{} must be at least 1ms", name)));
            }
        }
        Ok(Self {
            process_every,
            host_every,
            run_for,
        })
    }

    pub fn period(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Cutoff => self.run_for,
            Cadence::Host => self.host_every,
            Cadence::Process => self.process_every,
        }
    }

    /// Picks the cadence with the nearest deadline as seen from `now`.
    pub fn next_wake(&self, now: DateTime<Utc>) -> Wake {
        self.next_wake_after(now, None)
    }

    /// Like [`Schedule::next_wake`], but only considers boundaries strictly
    /// after `serviced`, the last boundary already handled.
    ///
    /// A sleep can end slightly before its wall-clock boundary when the clock
    /// is slewed; without this the same boundary would be picked again.
    pub fn next_wake_after(&self, now: DateTime<Utc>, serviced: Option<DateTime<Utc>>) -> Wake {
        let from = match serviced {
            Some(boundary) if boundary > now => boundary,
            _ => now,
        };
        let lead = (from - now).to_std().unwrap_or_default();

        [Cadence::Cutoff, Cadence::Host, Cadence::Process]
            .into_iter()
            .map(|cadence| {
                let next_us = next_boundary_micros(from, self.period(cadence));
                let to_boundary = Duration::from_micros((next_us - from.timestamp_micros()) as u64);
                Wake {
                    cadence,
                    delay: lead + to_boundary,
                    at: DateTime::from_timestamp_micros(next_us).unwrap_or(from),
                }
            })
            .min_by_key(|wake| (wake.delay, wake.cadence))
            .unwrap_or(Wake {
                cadence: Cadence::Cutoff,
                delay: Duration::ZERO,
                at: now,
            })
    }
}

/// Time from `now` until the next multiple of `period` since the epoch.
///
/// Always strictly positive: at an exact boundary the following one is
/// returned.
pub fn delay_to_boundary(now: DateTime<Utc>, period: Duration) -> Duration {
    let next_us = next_boundary_micros(now, period);
    Duration::from_micros((next_us - now.timestamp_micros()) as u64)
}

/// The next multiple of `period` after `now`, in microseconds since the epoch.
fn next_boundary_micros(now: DateTime<Utc>, period: Duration) -> i64 {
    let period_us = period.as_micros().clamp(1, i64::MAX as u128) as i64;
    (now.timestamp_micros().div_euclid(period_us) + 1) * period_us
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64, millis: u32) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, millis * 1_000_000).unwrap()
    }

    // 1_700_000_040 is a whole minute
    const MINUTE: i64 = 1_700_000_040;

    #[test]
    fn test_delay_to_boundary() {
        assert_eq!(
            delay_to_boundary(at(MINUTE + 3, 250), Duration::from_secs(5)),
            Duration::from_millis(1750)
        );
        assert_eq!(
            delay_to_boundary(at(MINUTE + 3, 250), Duration::from_secs(15)),
            Duration::from_millis(11750)
        );
        assert_eq!(
            delay_to_boundary(at(MINUTE + 3, 250), Duration::from_secs(60)),
            Duration::from_millis(56750)
        );
    }

    #[test]
    fn test_delay_at_exact_boundary_is_full_period() {
        assert_eq!(
            delay_to_boundary(at(MINUTE, 0), Duration::from_secs(15)),
            Duration::from_secs(15)
        );
    }

    #[test]
    fn test_next_wake_picks_minimum() {
        let schedule = Schedule::default();

        let wake = schedule.next_wake(at(MINUTE + 1, 0));
        assert_eq!(wake.cadence, Cadence::Process);
        assert_eq!(wake.delay, Duration::from_secs(4));

        let wake = schedule.next_wake(at(MINUTE + 11, 0));
        assert_eq!(wake.cadence, Cadence::Host);
        assert_eq!(wake.delay, Duration::from_secs(4));

        let wake = schedule.next_wake(at(MINUTE + 56, 0));
        assert_eq!(wake.cadence, Cadence::Cutoff);
        assert_eq!(wake.delay, Duration::from_secs(4));
    }

    #[test]
    fn test_next_wake_recomputes_from_new_time() {
        let schedule = Schedule::default();

        // Sampling took 2.3s past the boundary; the next deadline is still
        // the next 5s boundary, not "fire time + 5s".
        let wake = schedule.next_wake(at(MINUTE + 7, 300));
        assert_eq!(wake.cadence, Cadence::Process);
        assert_eq!(wake.delay, Duration::from_millis(2700));
    }

    #[test]
    fn test_next_wake_tie_break() {
        let schedule = Schedule::default();

        // 15s boundary is also a 5s boundary: host wins
        let wake = schedule.next_wake(at(MINUTE + 12, 0));
        assert_eq!(wake.cadence, Cadence::Host);
        assert_eq!(wake.delay, Duration::from_secs(3));

        // Minute boundary coincides with all three: cutoff wins
        let wake = schedule.next_wake(at(MINUTE + 57, 0));
        assert_eq!(wake.cadence, Cadence::Cutoff);
        assert_eq!(wake.delay, Duration::from_secs(3));
    }

    #[test]
    fn test_next_wake_reports_boundary() {
        let wake = Schedule::default().next_wake(at(MINUTE + 3, 250));
        assert_eq!(wake.cadence, Cadence::Process);
        assert_eq!(wake.at, at(MINUTE + 5, 0));
    }

    #[test]
    fn test_next_wake_after_skips_serviced_boundary() {
        let schedule = Schedule::default();

        // Woke 1ms early for the host boundary at +15 and sampled. The next
        // wake is the 5s boundary after it, not +15 again.
        let early = at(MINUTE + 14, 999);
        let wake = schedule.next_wake_after(early, Some(at(MINUTE + 15, 0)));
        assert_eq!(wake.cadence, Cadence::Process);
        assert_eq!(wake.at, at(MINUTE + 20, 0));
        assert_eq!(wake.delay, Duration::from_millis(5001));

        // Without the record the same boundary comes back.
        let wake = schedule.next_wake(early);
        assert_eq!(wake.at, at(MINUTE + 15, 0));
        assert_eq!(wake.delay, Duration::from_millis(1));
    }

    #[test]
    fn test_next_wake_after_past_boundary_is_ignored() {
        let schedule = Schedule::default();
        let now = at(MINUTE + 7, 300);

        assert_eq!(
            schedule.next_wake_after(now, Some(at(MINUTE + 5, 0))),
            schedule.next_wake(now)
        );
    }

    #[test]
    fn test_schedule_rejects_zero_period() {
        assert!(Schedule::new(Duration::ZERO, HOST_INTERVAL, RUN_CUTOFF).is_err());
        assert!(Schedule::new(PROCESS_INTERVAL, HOST_INTERVAL, Duration::ZERO).is_err());

        let schedule = Schedule::new(
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(schedule.period(Cadence::Host), Duration::from_secs(2));
    }

    #[test]
    fn test_boundaries_before_epoch() {
        // div_euclid keeps the math right for negative timestamps
        let delay = delay_to_boundary(at(-3, 0), Duration::from_secs(5));
        assert_eq!(delay, Duration::from_secs(3));
    }
}
