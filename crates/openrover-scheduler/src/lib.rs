//! Fixed-cadence scheduling for the command send loop.
//!
//! The send loop targets a modest fixed rate (20 Hz by default) and must not
//! drift: each deadline is derived from the previous deadline, not from when
//! the work actually finished, so per-cycle jitter does not accumulate. When
//! a cycle overruns its whole period the scheduler resynchronizes to the
//! present instead of firing a burst of catch-up sends; stale commands have
//! no value, the next cycle reads fresh inputs anyway.
//!
//! [`CadenceScheduler`] owns the deadline state and sleeps; the pure deadline
//! arithmetic lives in [`scheduler::plan_tick`] so tests can exercise it with
//! synthetic instants.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod error;
pub mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::{CadenceScheduler, CadenceStats, TickPlan};
