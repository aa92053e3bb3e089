//! Operator-guided calibration procedure.
//!
//! The procedure is an explicit state machine driven through two seams: a
//! [`ReportSampler`] supplying the freshest raw report and an [`Operator`]
//! answering prompts. Both are traits so the whole flow is testable without
//! hardware or a terminal; the CLI wires in the real HID cell and stdin.
//!
//! Steps, in order: `AwaitFirstReport` → `ObserveThrottle` → `ObserveBrake` →
//! `PickOffsets` → `MeasureRest` → `MeasureThrottleMax` → `MeasureBrakeMax`.
//! Every waiting step has a bounded timeout; the wizard never hangs on a
//! device that stops reporting.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::diff::{DEFAULT_NOISE_THRESHOLD, MovementObserver};
use crate::types::{PedalAxisCalibration, PedalsCalibration, axis16_le};
use crate::{CalibrationError, CalibrationResult};

/// Which pedal axis a prompt or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedalAxis {
    /// Accelerator pedal.
    Throttle,
    /// Brake pedal.
    Brake,
}

impl fmt::Display for PedalAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PedalAxis::Throttle => write!(f, "throttle"),
            PedalAxis::Brake => write!(f, "brake"),
        }
    }
}

/// Timing and sensitivity knobs for the guided procedure.
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    /// How long each observation window lasts.
    pub observe_window: Duration,
    /// Bound on waiting for the device's first report.
    pub first_report_timeout: Duration,
    /// Minimum per-byte movement to count as signal.
    pub noise_threshold: u8,
    /// Sleep between report polls.
    pub poll_interval: Duration,
    /// Grace period after a prompt before sampling, so the operator's hands
    /// have settled.
    pub settle_delay: Duration,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            observe_window: Duration::from_secs(3),
            first_report_timeout: Duration::from_secs(3),
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            poll_interval: Duration::from_millis(10),
            settle_delay: Duration::from_millis(300),
        }
    }
}

/// One raw report snapshot plus the publish generation it was taken at.
///
/// The generation lets the wizard distinguish "same bytes again" from "the
/// device stopped talking": a fresh report has a new generation even when
/// its bytes are identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledReport {
    /// Monotonic publish counter from the report source.
    pub generation: u64,
    /// The report bytes.
    pub bytes: Vec<u8>,
}

/// Source of the freshest raw report from the device under calibration.
pub trait ReportSampler {
    /// The latest report, or `None` if nothing has arrived yet.
    fn sample(&self) -> Option<SampledReport>;
}

/// Operator interaction seam: prompts and choices.
///
/// Implementations may return [`CalibrationError::Cancelled`] from any
/// method to abort the procedure.
pub trait Operator {
    /// Show `message` and wait for acknowledgement.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::Cancelled`] when the operator aborts.
    fn instruct(&mut self, message: &str) -> CalibrationResult<()>;

    /// Informational line; no acknowledgement expected.
    fn notify(&mut self, message: &str);

    /// Choose the low-byte offset for `axis` given the observed candidates.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::Cancelled`] when the operator aborts.
    fn pick_offset(&mut self, axis: PedalAxis, candidates: &[usize]) -> CalibrationResult<usize>;
}

/// States of the guided procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Waiting for the device's first report.
    AwaitFirstReport,
    /// Observing which bytes move while the throttle is worked.
    ObserveThrottle,
    /// Observing which bytes move while the brake is worked.
    ObserveBrake,
    /// Operator picks the low-byte offset per axis.
    PickOffsets,
    /// Sampling both pedals at rest.
    MeasureRest,
    /// Sampling the throttle fully pressed.
    MeasureThrottleMax,
    /// Sampling the brake fully pressed.
    MeasureBrakeMax,
    /// Procedure finished.
    Complete,
}

/// The guided pedal calibration procedure.
pub struct PedalWizard<'a> {
    config: CalibrationConfig,
    sampler: &'a dyn ReportSampler,
    operator: &'a mut dyn Operator,
    step: WizardStep,
    last_generation: u64,
}

impl<'a> PedalWizard<'a> {
    /// Creates a wizard with default timing.
    pub fn new(sampler: &'a dyn ReportSampler, operator: &'a mut dyn Operator) -> Self {
        Self::with_config(CalibrationConfig::default(), sampler, operator)
    }

    /// Creates a wizard with explicit timing, mainly for tests.
    pub fn with_config(
        config: CalibrationConfig,
        sampler: &'a dyn ReportSampler,
        operator: &'a mut dyn Operator,
    ) -> Self {
        Self {
            config,
            sampler,
            operator,
            step: WizardStep::AwaitFirstReport,
            last_generation: 0,
        }
    }

    /// Current step, for progress display.
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Runs the full procedure to completion.
    ///
    /// # Errors
    ///
    /// Any [`CalibrationError`]; [`CalibrationError::is_recoverable`] errors
    /// mean the operator should simply re-run the procedure.
    pub fn run(&mut self) -> CalibrationResult<PedalsCalibration> {
        let first = self.await_first_report()?;
        debug!(report_len = first.len(), "first pedal report received");

        self.step = WizardStep::ObserveThrottle;
        let thr_candidates = self.observe(PedalAxis::Throttle, &first)?;
        self.step = WizardStep::ObserveBrake;
        let brk_candidates = self.observe(PedalAxis::Brake, &first)?;

        self.step = WizardStep::PickOffsets;
        self.operator
            .notify("Pick LOW-byte indices for each 16-bit axis (little-endian).");
        let thr_lo = self.pick(PedalAxis::Throttle, &thr_candidates, first.len())?;
        let brk_lo = self.pick(PedalAxis::Brake, &brk_candidates, first.len())?;

        self.step = WizardStep::MeasureRest;
        let rest = self.measure("Release BOTH pedals fully, then press Enter...")?;
        let thr_min = self.read_axis(&rest, thr_lo)?;
        let brk_min = self.read_axis(&rest, brk_lo)?;
        self.operator
            .notify(&format!("Rest: throttle={thr_min} brake={brk_min}"));

        self.step = WizardStep::MeasureThrottleMax;
        let report = self.measure("Press THROTTLE fully and hold, then press Enter...")?;
        let thr_max = self.read_axis(&report, thr_lo)?;
        self.operator.notify(&format!("Throttle max={thr_max}"));

        self.step = WizardStep::MeasureBrakeMax;
        let report =
            self.measure("Release throttle. Press BRAKE fully and hold, then press Enter...")?;
        let brk_max = self.read_axis(&report, brk_lo)?;
        self.operator.notify(&format!("Brake max={brk_max}"));

        self.step = WizardStep::Complete;
        Ok(PedalsCalibration {
            throttle: PedalAxisCalibration {
                byte_offset: thr_lo,
                rest_raw: thr_min,
                min_raw: thr_min,
                max_raw: thr_max,
            },
            brake: PedalAxisCalibration {
                byte_offset: brk_lo,
                rest_raw: brk_min,
                min_raw: brk_min,
                max_raw: brk_max,
            },
        })
    }

    fn await_first_report(&mut self) -> CalibrationResult<Vec<u8>> {
        let deadline = Instant::now() + self.config.first_report_timeout;
        loop {
            if let Some(report) = self.sampler.sample() {
                self.last_generation = report.generation;
                return Ok(report.bytes);
            }
            if Instant::now() >= deadline {
                return Err(CalibrationError::NoFirstReport {
                    waited: self.config.first_report_timeout,
                });
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Observes one axis for the configured window and returns the moving
    /// byte indices, ascending.
    ///
    /// The baseline is re-sampled right after the prompt so the previous
    /// step's end state does not read as movement; `fallback` covers the
    /// case where the device has produced nothing new.
    fn observe(&mut self, axis: PedalAxis, fallback: &[u8]) -> CalibrationResult<Vec<usize>> {
        self.operator.instruct(&format!(
            "Press Enter, then press/release {axis} for ~{}s...",
            self.config.observe_window.as_secs_f32()
        ))?;

        let baseline = match self.sampler.sample() {
            Some(report) => {
                self.last_generation = report.generation;
                report.bytes
            }
            None => fallback.to_vec(),
        };

        let mut observer = MovementObserver::new(baseline, self.config.noise_threshold);
        let end = Instant::now() + self.config.observe_window;
        while Instant::now() < end {
            if let Some(report) = self.sampler.sample() {
                self.last_generation = report.generation;
                observer.observe(&report.bytes);
            }
            thread::sleep(self.config.poll_interval);
        }

        let moved = observer.moved();
        debug!(%axis, ?moved, "observation window complete");
        self.operator
            .notify(&format!("{axis} moving indices: {moved:?}"));
        if moved.is_empty() {
            return Err(CalibrationError::NoMovingBytes { axis });
        }
        Ok(moved)
    }

    fn pick(
        &mut self,
        axis: PedalAxis,
        candidates: &[usize],
        report_len: usize,
    ) -> CalibrationResult<usize> {
        let offset = self.operator.pick_offset(axis, candidates)?;
        if offset.saturating_add(1) >= report_len {
            return Err(CalibrationError::OffsetOutOfRange { offset, report_len });
        }
        Ok(offset)
    }

    /// Prompts, waits for the operator's hands to settle, then returns a
    /// report published after the prompt.
    fn measure(&mut self, message: &str) -> CalibrationResult<Vec<u8>> {
        self.operator.instruct(message)?;
        thread::sleep(self.config.settle_delay);
        self.await_fresh_report()
    }

    /// Bounded wait for a report newer than the last one this wizard saw.
    fn await_fresh_report(&mut self) -> CalibrationResult<Vec<u8>> {
        let deadline = Instant::now() + self.config.observe_window;
        loop {
            if let Some(report) = self.sampler.sample() {
                if report.generation != self.last_generation {
                    self.last_generation = report.generation;
                    return Ok(report.bytes);
                }
            }
            if Instant::now() >= deadline {
                return Err(CalibrationError::DeviceUnresponsive {
                    waited: self.config.observe_window,
                });
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    fn read_axis(&self, report: &[u8], offset: usize) -> CalibrationResult<u16> {
        axis16_le(report, offset).ok_or(CalibrationError::OffsetOutOfRange {
            offset,
            report_len: report.len(),
        })
    }
}

impl fmt::Debug for PedalWizard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PedalWizard")
            .field("config", &self.config)
            .field("step", &self.step)
            .field("last_generation", &self.last_generation)
            .finish_non_exhaustive()
    }
}
