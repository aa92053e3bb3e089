//! Pedal device discovery and the background reader thread.
//!
//! Pedal sets show up as plain HID devices with vendor-specific report
//! layouts, so discovery is name-based: anything whose product or
//! manufacturer string contains a pedal-ish keyword is offered. The actual
//! layout is learned later by the calibration procedure, not assumed here.

use std::ffi::CString;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use tracing::{debug, warn};

use openrover_calibration::{ReportSampler, SampledReport};

use crate::error::{HidError, HidResult};
use crate::report::LatestReportCell;

/// Lowercase substrings that mark a HID device as pedal-like.
pub const PEDAL_KEYWORDS: &[&str] = &["pedal", "t-lcm", "tlcm", "thrustmaster", "sim"];

const READ_TIMEOUT_MS: i32 = 50;
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);
const REPORT_BUF_LEN: usize = 64;

/// Identity of a discovered pedal device.
#[derive(Debug, Clone)]
pub struct PedalDeviceInfo {
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
    /// Manufacturer string, when the device reports one.
    pub manufacturer: Option<String>,
    /// Product string, when the device reports one.
    pub product: Option<String>,
    path: CString,
}

impl PedalDeviceInfo {
    /// Platform path used to reopen the device across sessions.
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Human-readable name for listings and prompts.
    pub fn display_name(&self) -> String {
        self.product
            .clone()
            .or_else(|| self.manufacturer.clone())
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}

fn matches_keywords(product: Option<&str>, manufacturer: Option<&str>) -> bool {
    let haystacks = [product, manufacturer];
    haystacks.iter().flatten().any(|name| {
        let name = name.to_lowercase();
        PEDAL_KEYWORDS.iter().any(|kw| name.contains(kw))
    })
}

/// Lists connected HID devices that look like pedal sets.
pub fn enumerate_pedals(api: &HidApi) -> Vec<PedalDeviceInfo> {
    api.device_list()
        .filter(|dev| matches_keywords(dev.product_string(), dev.manufacturer_string()))
        .map(|dev| PedalDeviceInfo {
            vendor_id: dev.vendor_id(),
            product_id: dev.product_id(),
            manufacturer: dev.manufacturer_string().map(str::to_string),
            product: dev.product_string().map(str::to_string),
            path: dev.path().to_owned(),
        })
        .collect()
}

/// Finds a previously saved pedal device by its platform path.
///
/// # Errors
///
/// [`HidError::PedalDeviceNotFound`] when no connected device has that path;
/// the saved session is stale and the device needs re-selecting.
pub fn find_pedals_by_path(api: &HidApi, path: &str) -> HidResult<PedalDeviceInfo> {
    enumerate_pedals(api)
        .into_iter()
        .find(|info| info.path_str() == path)
        .ok_or_else(|| HidError::PedalDeviceNotFound {
            path: path.to_string(),
        })
}

/// An open pedal device with its background reader thread.
///
/// The reader polls the device and publishes every report into a shared
/// [`LatestReportCell`]; dropping `HidPedals` stops and joins the thread.
#[derive(Debug)]
pub struct HidPedals {
    info: PedalDeviceInfo,
    cell: Arc<LatestReportCell>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl HidPedals {
    /// Opens the device and starts the reader thread.
    ///
    /// # Errors
    ///
    /// [`HidError::Backend`] when the device cannot be opened.
    pub fn open(api: &HidApi, info: PedalDeviceInfo) -> HidResult<Self> {
        let device = api.open_path(&info.path)?;
        debug!(name = %info.display_name(), "opened pedal device");

        let cell = Arc::new(LatestReportCell::new());
        let stop = Arc::new(AtomicBool::new(false));
        let reader = {
            let cell = Arc::clone(&cell);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("pedal-reader".to_string())
                .spawn(move || read_loop(&device, &cell, &stop))
                .map_err(|error| hidapi::HidError::IoError { error })?
        };

        Ok(Self {
            info,
            cell,
            stop,
            reader: Some(reader),
        })
    }

    /// Identity of the open device.
    pub fn info(&self) -> &PedalDeviceInfo {
        &self.info
    }

    /// Shared handle to the latest-report cell.
    pub fn cell(&self) -> Arc<LatestReportCell> {
        Arc::clone(&self.cell)
    }
}

impl ReportSampler for HidPedals {
    fn sample(&self) -> Option<SampledReport> {
        self.cell.sample()
    }
}

impl Drop for HidPedals {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader.take()
            && handle.join().is_err()
        {
            warn!("pedal reader thread panicked");
        }
    }
}

fn read_loop(device: &HidDevice, cell: &LatestReportCell, stop: &AtomicBool) {
    let mut buf = [0u8; REPORT_BUF_LEN];
    while !stop.load(Ordering::Relaxed) {
        match device.read_timeout(&mut buf, READ_TIMEOUT_MS) {
            // Timeout with no data; poll again.
            Ok(0) => {}
            Ok(n) => {
                if let Some(bytes) = buf.get(..n) {
                    cell.publish(bytes);
                }
            }
            Err(err) => {
                warn!(%err, "pedal read failed");
                thread::sleep(READ_ERROR_BACKOFF);
            }
        }
    }
}
