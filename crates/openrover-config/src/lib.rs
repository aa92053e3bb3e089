//! Session configuration: which devices to use, their calibration, and where
//! to send commands.
//!
//! The whole session lives in one JSON file, written by the setup flow and
//! read back on every run. A missing or unreadable file is not an error at
//! load time; it just means setup has to run again, so [`SessionConfig::load`]
//! returns `Ok(None)` for those cases and reserves `Err` for real I/O
//! failures on a file that exists.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use openrover_calibration::{PedalsCalibration, WheelCalibration};

/// Default session file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "rover.json";

/// Default command destination port.
pub const DEFAULT_PORT: u16 = 6001;

/// Default send rate in Hertz.
pub const DEFAULT_SEND_HZ: f64 = 20.0;

/// Errors from configuration persistence and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem failure reading or writing the session file.
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),

    /// The session could not be serialized.
    #[error("config serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The session file parsed but its values are unusable.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What failed validation.
        reason: String,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where command packets are sent, and how often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Destination host name or address.
    pub host: String,
    /// Destination UDP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Send rate in Hertz.
    #[serde(default = "default_send_hz")]
    pub send_hz: f64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_send_hz() -> f64 {
    DEFAULT_SEND_HZ
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            send_hz: DEFAULT_SEND_HZ,
        }
    }
}

/// The selected steering device and its normalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Controller index in enumeration order.
    pub device_index: usize,
    /// Raw axis index carrying steering.
    #[serde(flatten)]
    pub calibration: WheelCalibration,
}

/// The selected pedal device and its learned report layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedalsConfig {
    /// Platform path of the HID device, for reopening across sessions.
    pub device_path: String,
    /// Per-axis offsets and ranges from the calibration procedure.
    #[serde(flatten)]
    pub calibration: PedalsCalibration,
}

/// The complete saved session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Command destination.
    pub network: NetworkConfig,
    /// Steering device and mapping.
    pub wheel: WheelConfig,
    /// Pedal device and calibration.
    pub pedals: PedalsConfig,
}

impl SessionConfig {
    /// Loads a saved session.
    ///
    /// Returns `Ok(None)` when the file does not exist or does not parse;
    /// both mean setup must run again. A parse failure is logged so a
    /// hand-edited file does not silently fall back.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] for filesystem failures other than the file being
    /// absent.
    pub fn load(path: &Path) -> ConfigResult<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str::<Self>(&contents) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                warn!(path = %path.display(), %err, "session file is invalid, ignoring it");
                Ok(None)
            }
        }
    }

    /// Writes the session as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::Serialize`].
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Checks values a run can not work with.
    ///
    /// A degenerate pedal axis (`max_raw <= min_raw`) is usable: it reads as
    /// zero, so it is only warned about, never rejected. A wheel whose raw
    /// value drops when the pedal is pressed calibrates that way.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first failing field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.network.host.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "network.host is empty".to_string(),
            });
        }
        if self.network.port == 0 {
            return Err(ConfigError::Invalid {
                reason: "network.port is 0".to_string(),
            });
        }
        if !self.network.send_hz.is_finite() || self.network.send_hz <= 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!("network.send_hz is {}", self.network.send_hz),
            });
        }
        if !self.pedals.calibration.throttle.is_calibrated() {
            warn!("throttle axis range is degenerate; it will read as zero");
        }
        if !self.pedals.calibration.brake.is_calibrated() {
            warn!("brake axis range is degenerate; it will read as zero");
        }
        Ok(())
    }
}
