//! Guided session setup: pick devices, calibrate, save.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use hidapi::HidApi;
use tracing::info;

use openrover_calibration::{CalibrationError, PedalWizard, PedalsCalibration, WheelCalibration};
use openrover_config::{
    DEFAULT_PORT, DEFAULT_SEND_HZ, NetworkConfig, PedalsConfig, SessionConfig, WheelConfig,
};
use openrover_hid::{GilrsSteeringPort, HidPedals, SteeringPort, enumerate_pedals};

use crate::console::{ConsoleOperator, prompt_index, prompt_with_default, prompt_yes_no};

const DETECT_POLL: Duration = Duration::from_millis(10);
const AXIS_DETECT_WINDOW: Duration = Duration::from_secs(3);
const BUTTON_DETECT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_PROBED_AXES: usize = 16;
const MAX_PROBED_BUTTONS: u32 = 32;

/// Minimum axis swing to count as deliberate movement.
const AXIS_DETECT_THRESHOLD: f32 = 0.05;

/// Runs the full guided setup and writes the session file.
pub fn setup(config_path: &Path) -> Result<()> {
    let api = HidApi::new().context("failed to initialize HID backend")?;

    let pedal_info = pick_pedals(&api)?;
    println!("Using pedals: {}", pedal_info.display_name());
    let pedal_path = pedal_info.path_str();
    let pedals = HidPedals::open(&api, pedal_info).context("failed to open pedal device")?;
    let calibration = calibrate_pedals(&pedals)?;

    let mut steering = GilrsSteeringPort::new().context("failed to initialize controller backend")?;
    let (device_index, wheel) = configure_steering(&mut steering)?;

    println!("Network settings:");
    let host = prompt_with_default("  Vehicle host", "192.168.4.1".to_string())?;
    let port = prompt_with_default("  Vehicle UDP port", DEFAULT_PORT)?;
    let send_hz = prompt_with_default("  Send rate (Hz)", DEFAULT_SEND_HZ)?;

    let config = SessionConfig {
        network: NetworkConfig {
            host,
            port,
            send_hz,
        },
        wheel: WheelConfig {
            device_index,
            calibration: wheel,
        },
        pedals: PedalsConfig {
            device_path: pedal_path,
            calibration,
        },
    };
    config.validate().context("setup produced an unusable session")?;
    config
        .save(config_path)
        .with_context(|| format!("failed to write '{}'", config_path.display()))?;

    info!(path = %config_path.display(), "session saved");
    println!("Session saved to '{}'. Run `roverctl run` to drive.", config_path.display());
    Ok(())
}

fn pick_pedals(api: &HidApi) -> Result<openrover_hid::PedalDeviceInfo> {
    let mut candidates = enumerate_pedals(api);
    if candidates.is_empty() {
        bail!("no pedal-like HID device found; connect the pedals and re-run setup");
    }

    println!("Pedal devices:");
    for (index, info) in candidates.iter().enumerate() {
        println!(
            "  [{index}] {:04x}:{:04x}  {}",
            info.vendor_id,
            info.product_id,
            info.display_name()
        );
    }
    let index = if candidates.len() == 1 {
        0
    } else {
        match prompt_index("Select pedal device", candidates.len())? {
            Some(index) => index,
            None => bail!("setup cancelled"),
        }
    };
    // Index came from prompt_index, bounded by the candidate count.
    Ok(candidates.swap_remove(index))
}

/// Runs the calibration procedure, offering a retry when the failure is one
/// the operator can fix (device quiet, nothing moved).
fn calibrate_pedals(pedals: &HidPedals) -> Result<PedalsCalibration> {
    let cell = pedals.cell();
    let mut operator = ConsoleOperator;
    loop {
        let mut wizard = PedalWizard::new(&*cell, &mut operator);
        match wizard.run() {
            Ok(calibration) => return Ok(calibration),
            Err(CalibrationError::Cancelled) => bail!("setup cancelled"),
            Err(err) if err.is_recoverable() => {
                println!("Calibration failed: {err}");
                if !prompt_yes_no("Try again?", true)? {
                    bail!("setup cancelled");
                }
            }
            Err(err) => return Err(err).context("pedal calibration failed"),
        }
    }
}

fn configure_steering(port: &mut GilrsSteeringPort) -> Result<(usize, WheelCalibration)> {
    let devices = port.devices();
    if devices.is_empty() {
        bail!("no steering controller found; connect the wheel and re-run setup");
    }

    println!("Steering controllers:");
    for info in &devices {
        println!("  [{}] {}", info.index, info.name);
    }
    let device_index = if devices.len() == 1 {
        0
    } else {
        match prompt_index("Select steering controller", devices.len())? {
            Some(index) => index,
            None => bail!("setup cancelled"),
        }
    };
    let selected = port.select(device_index)?;
    println!("Using controller: {}", selected.name);

    println!("Turn the wheel fully left and right for ~3 seconds...");
    let detected = detect_active_axis(port, AXIS_DETECT_WINDOW);
    if let Some(axis) = detected {
        println!("Detected movement on axis {axis}.");
    } else {
        println!("No axis movement detected; enter the axis index manually.");
    }
    let axis_index = prompt_with_default("Steering axis index", detected.unwrap_or(0))?;

    let invert = prompt_yes_no("Invert steering axis?", true)?;
    let gain = prompt_with_default("Steering gain", 5.0f32)?;

    let always_enabled = prompt_yes_no("Send the enable flag unconditionally?", true)?;
    let enable_button = if always_enabled {
        None
    } else {
        println!("Hold the enable button now...");
        match detect_pressed_button(port, BUTTON_DETECT_TIMEOUT) {
            Some(button) => {
                println!("Detected button {button}.");
                Some(button)
            }
            None => {
                println!("No button press detected; enter the button index manually.");
                Some(prompt_with_default("Enable button index", 0u32)?)
            }
        }
    };

    Ok((
        device_index,
        WheelCalibration {
            axis_index,
            invert,
            gain,
            enable_button,
            always_enabled,
        },
    ))
}

/// Watches all probed axes for a window and returns the one that swung the
/// most, if any swung past the threshold.
fn detect_active_axis(port: &mut dyn SteeringPort, window: Duration) -> Option<usize> {
    let mut min = [f32::MAX; MAX_PROBED_AXES];
    let mut max = [f32::MIN; MAX_PROBED_AXES];

    let end = Instant::now() + window;
    while Instant::now() < end {
        port.pump();
        for (index, (lo, hi)) in min.iter_mut().zip(max.iter_mut()).enumerate() {
            let value = port.axis(index);
            *lo = lo.min(value);
            *hi = hi.max(value);
        }
        thread::sleep(DETECT_POLL);
    }

    min.iter()
        .zip(max.iter())
        .map(|(lo, hi)| hi - lo)
        .enumerate()
        .filter(|(_, swing)| *swing >= AXIS_DETECT_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, _)| index)
}

/// Waits for any probed button to be held; `None` on timeout.
fn detect_pressed_button(port: &mut dyn SteeringPort, timeout: Duration) -> Option<u32> {
    let end = Instant::now() + timeout;
    while Instant::now() < end {
        port.pump();
        if let Some(button) = (0..MAX_PROBED_BUTTONS).find(|&button| port.button(button)) {
            return Some(button);
        }
        thread::sleep(DETECT_POLL);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use openrover_hid::mock::MockSteeringPort;

    #[test]
    fn test_detect_pressed_button_finds_held_button() {
        let mut port = MockSteeringPort::new();
        port.set_button(2, true);
        assert_eq!(
            detect_pressed_button(&mut port, Duration::from_millis(50)),
            Some(2)
        );
    }

    #[test]
    fn test_detect_pressed_button_times_out() {
        let mut port = MockSteeringPort::new();
        assert_eq!(
            detect_pressed_button(&mut port, Duration::from_millis(20)),
            None
        );
    }

    #[test]
    fn test_detect_active_axis_ignores_idle_axes() {
        let mut port = MockSteeringPort::new();
        port.set_axis(0, 0.01);
        assert_eq!(
            detect_active_axis(&mut port, Duration::from_millis(20)),
            None
        );
    }
}
