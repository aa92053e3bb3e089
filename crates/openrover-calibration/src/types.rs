//! Calibration type definitions

use serde::{Deserialize, Serialize};

/// Reads the 16-bit little-endian field whose low byte sits at `offset`.
///
/// Returns `None` when the report is too short to hold both bytes; callers
/// treat that as "no data" rather than a fault.
pub fn axis16_le(report: &[u8], offset: usize) -> Option<u16> {
    let lo = *report.get(offset)?;
    let hi = *report.get(offset.checked_add(1)?)?;
    Some(u16::from(lo) | (u16::from(hi) << 8))
}

/// Calibration for one pedal axis addressed inside an unlabelled raw report.
///
/// The raw value is composed little-endian from the bytes at `byte_offset`
/// and `byte_offset + 1`. `min_raw`/`max_raw` are the values observed with
/// the pedal released and fully pressed; the sampling rarely captures true
/// mechanical extremes, so normalization clamps rather than extrapolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedalAxisCalibration {
    /// Low-byte offset of the 16-bit little-endian field inside the report.
    pub byte_offset: usize,
    /// Raw value sampled with everything at rest. Diagnostic only.
    pub rest_raw: u16,
    /// Raw value with the pedal released.
    pub min_raw: u16,
    /// Raw value with the pedal fully pressed.
    pub max_raw: u16,
}

impl PedalAxisCalibration {
    /// An axis with `max_raw <= min_raw` is uncalibrated and always
    /// normalizes to zero. This is a documented degenerate state, not an
    /// error.
    pub fn is_calibrated(&self) -> bool {
        self.max_raw > self.min_raw
    }

    /// Raw field value from `report`, or `None` for undersized reports.
    pub fn read_raw(&self, report: &[u8]) -> Option<u16> {
        axis16_le(report, self.byte_offset)
    }
}

impl Default for PedalAxisCalibration {
    fn default() -> Self {
        Self {
            byte_offset: 0,
            rest_raw: 0,
            min_raw: 0,
            max_raw: 0,
        }
    }
}

/// Steering-device calibration.
///
/// The wheel axis arrives already normalized to a nominal `[-1, 1]`; `gain`
/// compensates for small-throw devices (most consumer wheels only report a
/// fraction of the range in normal driving) and `invert` flips the sign so
/// that positive means right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelCalibration {
    /// Continuous axis index on the steering device.
    pub axis_index: usize,
    /// Flip the axis sign before applying gain.
    #[serde(default = "default_invert")]
    pub invert: bool,
    /// Multiplier applied to the raw axis value before clamping.
    #[serde(default = "default_gain")]
    pub gain: f32,
    /// Digital button that gates the enable flag, when not always enabled.
    #[serde(default)]
    pub enable_button: Option<u32>,
    /// Enable flag held true unconditionally.
    #[serde(default = "default_always_enabled")]
    pub always_enabled: bool,
}

fn default_invert() -> bool {
    true
}

fn default_gain() -> f32 {
    5.0
}

fn default_always_enabled() -> bool {
    true
}

impl Default for WheelCalibration {
    fn default() -> Self {
        Self {
            axis_index: 0,
            invert: default_invert(),
            gain: default_gain(),
            enable_button: None,
            always_enabled: default_always_enabled(),
        }
    }
}

/// Complete pedal-set calibration produced by the guided procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedalsCalibration {
    /// Throttle axis.
    pub throttle: PedalAxisCalibration,
    /// Brake axis.
    pub brake: PedalAxisCalibration,
}
