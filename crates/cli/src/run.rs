//! The fixed-cadence send loop.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use hidapi::HidApi;
use tracing::{debug, info};

use openrover_calibration::ReportSampler;
use openrover_command::{CommandNormalizer, ControlCommand};
use openrover_config::SessionConfig;
use openrover_hid::{GilrsSteeringPort, HidPedals, SteeringPort, find_pedals_by_path};
use openrover_link_protocol::CommandPacket;
use openrover_scheduler::{CadenceScheduler, TickPlan};

use crate::transport::CommandLink;

const STATUS_INTERVAL: Duration = Duration::from_millis(100);

/// Loads the saved session and drives the send loop until Ctrl-C.
pub fn run(
    config_path: &Path,
    host: Option<String>,
    port: Option<u16>,
    hz: Option<f64>,
) -> Result<()> {
    let mut config = match SessionConfig::load(config_path)? {
        Some(config) => config,
        None => {
            // First run (or a broken session file): go through setup, then
            // pick up the file it wrote.
            println!(
                "No usable session at '{}'; starting setup.",
                config_path.display()
            );
            crate::setup::setup(config_path)?;
            let Some(config) = SessionConfig::load(config_path)? else {
                bail!("setup did not produce a usable session");
            };
            config
        }
    };
    if let Some(host) = host {
        config.network.host = host;
    }
    if let Some(port) = port {
        config.network.port = port;
    }
    if let Some(hz) = hz {
        config.network.send_hz = hz;
    }
    config.validate().context("saved session is unusable; re-run `roverctl setup`")?;

    let api = HidApi::new().context("failed to initialize HID backend")?;
    let pedal_info = find_pedals_by_path(&api, &config.pedals.device_path)
        .context("saved pedal device is not connected; re-run `roverctl setup`")?;
    let pedals = HidPedals::open(&api, pedal_info).context("failed to open pedal device")?;
    let cell = pedals.cell();

    let mut steering =
        GilrsSteeringPort::new().context("failed to initialize controller backend")?;
    let selected = steering
        .select(config.wheel.device_index)
        .context("saved steering device is not connected; re-run `roverctl setup`")?;
    info!(controller = %selected.name, "steering ready");

    let normalizer = CommandNormalizer::new(
        config.wheel.calibration.clone(),
        config.pedals.calibration,
    );
    let link = CommandLink::connect(&config.network.host, config.network.port)?;
    info!(dest = %link.destination(), hz = config.network.send_hz, "starting send loop");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut scheduler = CadenceScheduler::with_frequency(config.network.send_hz)?;
    let mut sequence: u32 = 0;
    let mut sent: u64 = 0;
    let mut dropped: u64 = 0;
    let mut last_status = Instant::now();

    while running.load(Ordering::SeqCst) {
        if scheduler.wait_for_tick() == TickPlan::Overrun {
            debug!("cycle overran its period; cadence resynchronized");
        }

        steering.pump();
        let axis_raw = steering.axis(config.wheel.calibration.axis_index);
        let button_pressed = config
            .wheel
            .calibration
            .enable_button
            .is_some_and(|button| steering.button(button));
        let report = cell.sample();
        let command = normalizer.command(
            axis_raw,
            button_pressed,
            report.as_ref().map(|r| r.bytes.as_slice()),
        );

        let packet = CommandPacket::new(
            sequence,
            command.steer_permille(),
            command.power_permille(),
            command.enabled,
        );
        sequence = sequence.wrapping_add(1);

        // Fire-and-forget: a failed send is dropped, never retried. The next
        // cycle carries fresher data than a resend would.
        match link.send(&packet) {
            Ok(()) => sent += 1,
            Err(err) => {
                dropped += 1;
                debug!(%err, "send failed, dropping packet");
            }
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            print_status(&command, sequence)?;
            last_status = Instant::now();
        }
    }

    println!();
    let stats = scheduler.stats();
    info!(
        sent,
        dropped,
        ticks = stats.ticks,
        overruns = stats.overruns,
        "send loop stopped"
    );
    println!(
        "Stopped. {sent} packet(s) sent, {dropped} dropped, {} overrun(s).",
        stats.overruns
    );
    Ok(())
}

fn print_status(command: &ControlCommand, sequence: u32) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(
        stdout,
        "\rsteer {:+.2}  power {:+.2}  enabled {}  seq {sequence}   ",
        command.steering,
        command.power,
        if command.enabled { "yes" } else { "no " },
    )?;
    stdout.flush()
}
