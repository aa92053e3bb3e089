//! Conversion of raw input samples into normalized drive commands.
//!
//! Everything here is pure: given a wheel axis value, a button state, and
//! the freshest pedal report, [`CommandNormalizer`] produces the
//! [`ControlCommand`] for one cycle. Commands are ephemeral; one is computed
//! and discarded every scheduler tick, and no history is kept.
//!
//! Throttle and brake are conflated into a single signed power channel by
//! design: at the wire level, braking is indistinguishable from reverse
//! drive, and the vehicle controller is responsible for interpreting the
//! negative range.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod command;
pub mod normalize;

pub use command::{CommandNormalizer, ControlCommand};
pub use normalize::{normalize_u16, to_permille};
