//! Per-cycle command assembly.

use openrover_calibration::{PedalAxisCalibration, PedalsCalibration, WheelCalibration};

use crate::normalize::{normalize_u16, to_permille};

/// A normalized drive command for one cycle.
///
/// Both the float values and their permille quantizations are derived from
/// the same inputs, so either form can be displayed or asserted on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlCommand {
    /// Steering in `[-1, 1]`, positive = right.
    pub steering: f32,
    /// Signed power in `[-1, 1]`; negative is braking/reverse.
    pub power: f32,
    /// Whether drive outputs are enabled this cycle.
    pub enabled: bool,
}

impl ControlCommand {
    /// Steering quantized for the wire.
    pub fn steer_permille(&self) -> i16 {
        to_permille(self.steering)
    }

    /// Power quantized for the wire.
    pub fn power_permille(&self) -> i16 {
        to_permille(self.power)
    }
}

/// Converts raw samples into [`ControlCommand`]s using immutable calibration.
///
/// Construction happens once per run; afterwards the normalizer is read-only
/// and every call is pure over its inputs.
#[derive(Debug, Clone)]
pub struct CommandNormalizer {
    wheel: WheelCalibration,
    throttle: PedalAxisCalibration,
    brake: PedalAxisCalibration,
}

impl CommandNormalizer {
    /// Builds a normalizer from the session's calibration.
    pub fn new(wheel: WheelCalibration, pedals: PedalsCalibration) -> Self {
        Self {
            wheel,
            throttle: pedals.throttle,
            brake: pedals.brake,
        }
    }

    /// Steering from the raw wheel axis value (nominal `[-1, 1]`).
    ///
    /// Gain compensates for small-throw devices; the result clamps to
    /// `[-1, 1]`.
    pub fn steering(&self, axis_raw: f32) -> f32 {
        let signed = if self.wheel.invert { -axis_raw } else { axis_raw };
        (signed * self.wheel.gain).clamp(-1.0, 1.0)
    }

    /// Normalized throttle and brake in `[0, 1]` from the freshest report.
    ///
    /// A missing or undersized report, or a degenerate axis calibration,
    /// contributes 0 for that axis rather than faulting.
    pub fn pedals01(&self, report: Option<&[u8]>) -> (f32, f32) {
        (
            Self::pedal01(&self.throttle, report),
            Self::pedal01(&self.brake, report),
        )
    }

    fn pedal01(calib: &PedalAxisCalibration, report: Option<&[u8]>) -> f32 {
        report
            .and_then(|r| calib.read_raw(r))
            .map(|raw| normalize_u16(raw, calib.min_raw, calib.max_raw))
            .unwrap_or(0.0)
    }

    /// Whether drive outputs are enabled given the instantaneous button state.
    ///
    /// No hysteresis or debounce: every cycle re-evaluates from scratch.
    pub fn enabled(&self, button_pressed: bool) -> bool {
        self.wheel.always_enabled || button_pressed
    }

    /// Assembles the command for one cycle.
    pub fn command(
        &self,
        axis_raw: f32,
        button_pressed: bool,
        report: Option<&[u8]>,
    ) -> ControlCommand {
        let (throttle01, brake01) = self.pedals01(report);
        ControlCommand {
            steering: self.steering(axis_raw),
            power: (throttle01 - brake01).clamp(-1.0, 1.0),
            enabled: self.enabled(button_pressed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle_only(byte_offset: usize, min_raw: u16, max_raw: u16) -> PedalsCalibration {
        PedalsCalibration {
            throttle: PedalAxisCalibration {
                byte_offset,
                rest_raw: min_raw,
                min_raw,
                max_raw,
            },
            // Degenerate: contributes 0 until calibrated.
            brake: PedalAxisCalibration::default(),
        }
    }

    fn wheel(always_enabled: bool) -> WheelCalibration {
        WheelCalibration {
            axis_index: 0,
            invert: true,
            gain: 5.0,
            enable_button: Some(0),
            always_enabled,
        }
    }

    #[test]
    fn test_end_to_end_throttle_scenario() {
        // Calibration at offset 0 with min=20000, max=40000. At rest the
        // report encodes the min. Report [0,156] reads 156<<8 = 39936
        // little-endian, which normalizes to 19936/20000 = 0.9968 and
        // truncates to 996 permille.
        let normalizer = CommandNormalizer::new(wheel(true), throttle_only(0, 20000, 40000));

        let rest = normalizer.command(0.0, false, Some(&[0x20, 0x4E]));
        assert!(rest.power.abs() < f32::EPSILON);
        assert_eq!(rest.power_permille(), 0);

        let pressed = normalizer.command(0.0, false, Some(&[0, 156]));
        assert!((pressed.power - 0.9968).abs() < 1e-4);
        assert_eq!(pressed.power_permille(), 996);
    }

    #[test]
    fn test_missing_report_is_zero_power() {
        let normalizer = CommandNormalizer::new(wheel(true), throttle_only(0, 20000, 40000));
        let cmd = normalizer.command(0.0, false, None);
        assert!(cmd.power.abs() < f32::EPSILON);
    }

    #[test]
    fn test_undersized_report_is_zero_power() {
        let normalizer = CommandNormalizer::new(wheel(true), throttle_only(4, 20000, 40000));
        // Offset 4 needs six bytes; a three-byte report has no data there.
        let cmd = normalizer.command(0.0, false, Some(&[0, 156, 7]));
        assert!(cmd.power.abs() < f32::EPSILON);
    }

    #[test]
    fn test_brake_subtracts_from_throttle() {
        let pedals = PedalsCalibration {
            throttle: PedalAxisCalibration {
                byte_offset: 0,
                rest_raw: 0,
                min_raw: 0,
                max_raw: 1000,
            },
            brake: PedalAxisCalibration {
                byte_offset: 2,
                rest_raw: 0,
                min_raw: 0,
                max_raw: 1000,
            },
        };
        let normalizer = CommandNormalizer::new(wheel(true), pedals);

        // Throttle at max, brake at max: power cancels to zero.
        let report = [0xE8, 0x03, 0xE8, 0x03];
        let cmd = normalizer.command(0.0, false, Some(&report));
        assert!(cmd.power.abs() < f32::EPSILON);

        // Brake only: full negative power.
        let report = [0, 0, 0xE8, 0x03];
        let cmd = normalizer.command(0.0, false, Some(&report));
        assert!((cmd.power + 1.0).abs() < f32::EPSILON);
        assert_eq!(cmd.power_permille(), -1000);
    }

    #[test]
    fn test_steering_gain_and_inversion() {
        let normalizer = CommandNormalizer::new(wheel(true), throttle_only(0, 0, 1));

        // Small-throw input amplified by gain 5, inverted.
        assert!((normalizer.steering(-0.1) - 0.5).abs() < 1e-6);
        assert!((normalizer.steering(0.1) + 0.5).abs() < 1e-6);

        // Saturates at the clamp.
        assert!((normalizer.steering(-1.0) - 1.0).abs() < f32::EPSILON);
        assert!((normalizer.steering(1.0) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_steering_without_inversion() {
        let mut cal = wheel(true);
        cal.invert = false;
        cal.gain = 1.0;
        let normalizer = CommandNormalizer::new(cal, throttle_only(0, 0, 1));
        assert!((normalizer.steering(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_enable_flag_no_debounce() {
        let normalizer = CommandNormalizer::new(wheel(false), throttle_only(0, 0, 1));

        // Button unpressed: disabled. Pressed: enabled on the very next
        // cycle; unpressed again: disabled immediately.
        assert!(!normalizer.command(0.0, false, None).enabled);
        assert!(normalizer.command(0.0, true, None).enabled);
        assert!(!normalizer.command(0.0, false, None).enabled);
    }

    #[test]
    fn test_always_enabled_ignores_button() {
        let normalizer = CommandNormalizer::new(wheel(true), throttle_only(0, 0, 1));
        assert!(normalizer.command(0.0, false, None).enabled);
    }
}
