//! Absolute-deadline cadence scheduler.
//!
//! Deadlines advance by exactly one period per tick so that small sleep and
//! processing jitter never accumulates into long-term rate drift. An overrun
//! resynchronizes the deadline to the present; missed cycles are counted,
//! never replayed.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{SchedulerError, SchedulerResult};

/// What to do before the next tick, as decided by [`plan_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPlan {
    /// The deadline is still ahead: sleep this long, then advance the
    /// deadline by one period.
    Sleep(Duration),
    /// The deadline has already passed: run immediately and restart the
    /// cadence from `now`.
    Overrun,
}

/// Pure deadline arithmetic for one tick.
///
/// Separated from [`CadenceScheduler`] so the policy can be tested with
/// synthetic instants and no real sleeping.
pub fn plan_tick(now: Instant, deadline: Instant) -> TickPlan {
    match deadline.checked_duration_since(now) {
        Some(remaining) => TickPlan::Sleep(remaining),
        None => TickPlan::Overrun,
    }
}

/// Counters accumulated over a run, reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CadenceStats {
    /// Ticks delivered.
    pub ticks: u64,
    /// Ticks that started after their deadline.
    pub overruns: u64,
}

/// Fixed-rate scheduler with absolute deadlines.
///
/// # Example
///
/// ```no_run
/// use openrover_scheduler::CadenceScheduler;
///
/// let mut scheduler = CadenceScheduler::with_frequency(20.0)?;
/// loop {
///     scheduler.wait_for_tick();
///     // Sample inputs and send one command packet.
/// }
/// # Ok::<(), openrover_scheduler::SchedulerError>(())
/// ```
#[derive(Debug)]
pub struct CadenceScheduler {
    period: Duration,
    next_deadline: Instant,
    stats: CadenceStats,
}

impl CadenceScheduler {
    /// Creates a scheduler ticking at `hz` cycles per second.
    ///
    /// # Errors
    ///
    /// Rejects frequencies that are not finite and positive.
    pub fn with_frequency(hz: f64) -> SchedulerResult<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(SchedulerError::InvalidFrequency { hz });
        }
        Ok(Self::with_period(Duration::from_secs_f64(1.0 / hz)))
    }

    /// Creates a scheduler with an explicit period.
    ///
    /// The first deadline is one period after construction, so the first
    /// tick sleeps rather than counting as an overrun.
    pub fn with_period(period: Duration) -> Self {
        let period = period.max(Duration::from_nanos(1));
        Self {
            period,
            next_deadline: Instant::now() + period,
            stats: CadenceStats::default(),
        }
    }

    /// Target period between ticks.
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// The absolute deadline of the next tick.
    #[inline]
    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Counters accumulated so far.
    #[inline]
    pub fn stats(&self) -> CadenceStats {
        self.stats
    }

    /// Blocks until the next deadline, then schedules the one after it.
    ///
    /// Returns the plan that was applied, so callers can log overruns.
    pub fn wait_for_tick(&mut self) -> TickPlan {
        let plan = plan_tick(Instant::now(), self.next_deadline);
        match plan {
            TickPlan::Sleep(remaining) => {
                if !remaining.is_zero() {
                    thread::sleep(remaining);
                }
                self.next_deadline += self.period;
            }
            TickPlan::Overrun => {
                self.stats.overruns += 1;
                // Restart the cadence from the present; do not replay
                // the missed cycles.
                self.next_deadline = Instant::now() + self.period;
            }
        }
        self.stats.ticks += 1;
        plan
    }

    /// Restarts the cadence from now, clearing counters.
    pub fn reset(&mut self) {
        self.next_deadline = Instant::now() + self.period;
        self.stats = CadenceStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_sleeps_until_future_deadline() {
        let now = Instant::now();
        let deadline = now + Duration::from_millis(50);
        assert_eq!(plan_tick(now, deadline), TickPlan::Sleep(Duration::from_millis(50)));
    }

    #[test]
    fn test_plan_at_deadline_is_zero_sleep() {
        let now = Instant::now();
        assert_eq!(plan_tick(now, now), TickPlan::Sleep(Duration::ZERO));
    }

    #[test]
    fn test_plan_past_deadline_is_overrun() {
        let deadline = Instant::now();
        let now = deadline + Duration::from_millis(120);
        assert_eq!(plan_tick(now, deadline), TickPlan::Overrun);
    }

    #[test]
    fn test_frequency_to_period() {
        let scheduler = CadenceScheduler::with_frequency(20.0).expect("valid frequency");
        assert_eq!(scheduler.period(), Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_frequencies_rejected() {
        for hz in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                CadenceScheduler::with_frequency(hz),
                Err(SchedulerError::InvalidFrequency { .. })
            ));
        }
    }

    #[test]
    fn test_zero_period_clamped() {
        let scheduler = CadenceScheduler::with_period(Duration::ZERO);
        assert_eq!(scheduler.period(), Duration::from_nanos(1));
    }

    #[test]
    fn test_first_tick_sleeps_instead_of_overrunning() {
        let mut scheduler = CadenceScheduler::with_period(Duration::from_millis(5));
        assert!(matches!(scheduler.wait_for_tick(), TickPlan::Sleep(_)));
        assert_eq!(scheduler.stats().overruns, 0);
    }

    #[test]
    fn test_tick_advances_deadline_by_one_period() {
        let mut scheduler = CadenceScheduler::with_period(Duration::from_millis(5));
        let first = scheduler.next_deadline();
        assert!(matches!(scheduler.wait_for_tick(), TickPlan::Sleep(_)));
        assert_eq!(scheduler.next_deadline(), first + Duration::from_millis(5));
        assert_eq!(scheduler.stats().ticks, 1);
    }

    #[test]
    fn test_overrun_resynchronizes_without_catch_up() {
        let mut scheduler = CadenceScheduler::with_period(Duration::from_millis(2));
        scheduler.wait_for_tick();

        // Simulate a long cycle by sleeping well past the next deadline.
        thread::sleep(Duration::from_millis(20));

        let before = Instant::now();
        let plan = scheduler.wait_for_tick();
        assert_eq!(plan, TickPlan::Overrun);
        assert_eq!(scheduler.stats().overruns, 1);
        // Deadline restarted from the present, not from the stale cadence.
        assert!(scheduler.next_deadline() >= before + Duration::from_millis(2));

        // The following tick is a normal sleep again, not another overrun
        // burst.
        let plan = scheduler.wait_for_tick();
        assert!(matches!(plan, TickPlan::Sleep(_)));
    }

    #[test]
    fn test_cadence_holds_rate_over_many_ticks() {
        // Synthetic time: each cycle sleeps exactly as planned, then spends
        // 20 ms of the 50 ms period on work. The work time must never push
        // the deadline off the exact period grid.
        let period = Duration::from_millis(50);
        let work = Duration::from_millis(20);
        let origin = Instant::now();
        let mut now = origin;
        let mut deadline = origin + period;

        for tick in 1u32..=100 {
            match plan_tick(now, deadline) {
                TickPlan::Sleep(remaining) => {
                    now += remaining + work;
                    deadline += period;
                }
                TickPlan::Overrun => panic!("punctual cycle must not overrun"),
            }
            assert_eq!(deadline - origin, period * (tick + 1));
        }
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut scheduler = CadenceScheduler::with_period(Duration::from_millis(1));
        scheduler.wait_for_tick();
        scheduler.wait_for_tick();
        scheduler.reset();
        assert_eq!(scheduler.stats(), CadenceStats::default());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_plan_never_sleeps_past_deadline(offset_us in 0u64..1_000_000) {
            let deadline = Instant::now() + Duration::from_micros(1_000_000);
            let now = deadline - Duration::from_micros(offset_us);
            match plan_tick(now, deadline) {
                TickPlan::Sleep(remaining) => {
                    prop_assert_eq!(now + remaining, deadline);
                }
                TickPlan::Overrun => prop_assert_eq!(offset_us, 0),
            }
        }

        #[test]
        fn prop_late_now_is_always_overrun(late_us in 1u64..1_000_000) {
            let deadline = Instant::now();
            let now = deadline + Duration::from_micros(late_us);
            prop_assert_eq!(plan_tick(now, deadline), TickPlan::Overrun);
        }
    }
}
