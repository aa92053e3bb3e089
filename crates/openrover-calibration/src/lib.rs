//! Device calibration for the OpenRover sender.
//!
//! Pedal sets deliver unlabelled fixed-length binary reports; nothing in the
//! report says which bytes carry the throttle or the brake. This crate
//! discovers that mapping interactively: diff reports against a rest baseline
//! while the operator works one pedal ([`diff`]), let the operator pick the
//! low-byte offset per axis, then learn the raw rest/min/max range at that
//! offset ([`wizard`]). The resulting [`PedalAxisCalibration`] values are
//! persisted and immutable for the rest of the run.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod diff;
pub mod types;
pub mod wizard;

pub use diff::*;
pub use types::*;
pub use wizard::*;

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the guided calibration procedure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    /// The device never produced a report. Operator should unplug/replug and retry.
    #[error("no report received from device within {waited:?}")]
    NoFirstReport {
        /// How long the wizard waited for the first report.
        waited: Duration,
    },

    /// Nothing moved beyond the noise threshold during the observation window.
    #[error("no moving bytes detected for {axis} in the observation window")]
    NoMovingBytes {
        /// The axis being observed when detection came up empty.
        axis: PedalAxis,
    },

    /// Reports stopped arriving mid-procedure.
    #[error("device unresponsive: no fresh report within {waited:?}")]
    DeviceUnresponsive {
        /// How long the wizard waited for a fresh report.
        waited: Duration,
    },

    /// The chosen low-byte offset does not fit a 16-bit field in the report.
    #[error("byte offset {offset} out of range for {report_len}-byte reports")]
    OffsetOutOfRange {
        /// The offset the operator picked.
        offset: usize,
        /// Length of the device's reports this session.
        report_len: usize,
    },

    /// The operator aborted the procedure.
    #[error("calibration cancelled by operator")]
    Cancelled,
}

impl CalibrationError {
    /// Whether re-running the procedure is a sensible response.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoFirstReport { .. } | Self::NoMovingBytes { .. } | Self::DeviceUnresponsive { .. }
        )
    }
}

/// Result alias used across the crate.
pub type CalibrationResult<T> = Result<T, CalibrationError>;
