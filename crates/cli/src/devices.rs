//! Device listing.

use anyhow::{Context, Result};
use hidapi::HidApi;

use openrover_hid::{GilrsSteeringPort, SteeringPort, enumerate_pedals};

/// Prints connected pedal and steering candidates.
pub fn list() -> Result<()> {
    let api = HidApi::new().context("failed to initialize HID backend")?;

    let pedals = enumerate_pedals(&api);
    if pedals.is_empty() {
        println!("No pedal-like HID devices found.");
    } else {
        println!("Pedal devices:");
        for (index, info) in pedals.iter().enumerate() {
            println!(
                "  [{index}] {:04x}:{:04x}  {}  ({})",
                info.vendor_id,
                info.product_id,
                info.display_name(),
                info.path_str(),
            );
        }
    }

    let steering = GilrsSteeringPort::new().context("failed to initialize controller backend")?;
    let wheels = steering.devices();
    if wheels.is_empty() {
        println!("No steering controllers found.");
    } else {
        println!("Steering controllers:");
        for info in wheels {
            println!("  [{}] {}", info.index, info.name);
        }
    }

    Ok(())
}
