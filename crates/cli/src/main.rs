//! roverctl - RC vehicle control sender.
//!
//! Drives a remote vehicle from a consumer steering wheel and pedal set:
//! `setup` walks through device selection and pedal calibration, `run` sends
//! normalized drive commands over UDP at a fixed cadence, and `devices`
//! lists what is connected.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod console;
mod devices;
mod run;
mod setup;
mod transport;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use openrover_config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "roverctl")]
#[command(about = "RC vehicle control sender - wheel and pedals to UDP drive commands")]
#[command(version)]
struct Cli {
    /// Session file holding device selection and calibration
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send drive commands using the saved session
    Run {
        /// Override the destination host
        #[arg(long)]
        host: Option<String>,

        /// Override the destination UDP port
        #[arg(long)]
        port: Option<u16>,

        /// Override the send rate in Hz
        #[arg(long)]
        hz: Option<f64>,
    },

    /// Select devices and calibrate the pedals, then save the session
    Setup,

    /// List connected pedal and steering devices
    Devices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("roverctl={log_level},openrover={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Run { host, port, hz } => run::run(&cli.config, host, port, hz),
        Commands::Setup => setup::setup(&cli.config),
        Commands::Devices => devices::list(),
    }
}
