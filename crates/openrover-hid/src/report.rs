//! Latest-report cell shared between the reader thread and consumers.

use parking_lot::Mutex;

use openrover_calibration::{ReportSampler, SampledReport};
use tracing::trace;

#[derive(Debug, Default)]
struct CellState {
    bytes: Option<Vec<u8>>,
    generation: u64,
    expected_len: Option<usize>,
}

/// Single-slot mailbox holding the freshest pedal report.
///
/// The reader thread publishes, consumers sample; only the latest report is
/// retained. The first report fixes the expected length and later reports of
/// a different length are dropped, so a transient short read cannot shift
/// the calibrated byte offsets mid-run. Every accepted publish bumps the
/// generation, which is how samplers tell "fresh report, same bytes" apart
/// from "device went quiet".
#[derive(Debug, Default)]
pub struct LatestReportCell {
    state: Mutex<CellState>,
}

impl LatestReportCell {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a report, replacing the previous one.
    ///
    /// Returns whether the report was accepted. Empty reports and reports
    /// whose length disagrees with the first accepted report are dropped.
    pub fn publish(&self, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return false;
        }
        let mut state = self.state.lock();
        match state.expected_len {
            None => state.expected_len = Some(bytes.len()),
            Some(expected) if expected != bytes.len() => {
                trace!(
                    expected,
                    got = bytes.len(),
                    "dropping report with unexpected length"
                );
                return false;
            }
            Some(_) => {}
        }
        state.bytes = Some(bytes.to_vec());
        state.generation += 1;
        true
    }

    /// Report length fixed by the first accepted publish, if any.
    pub fn expected_len(&self) -> Option<usize> {
        self.state.lock().expected_len
    }
}

impl ReportSampler for LatestReportCell {
    fn sample(&self) -> Option<SampledReport> {
        let state = self.state.lock();
        state.bytes.as_ref().map(|bytes| SampledReport {
            generation: state.generation,
            bytes: bytes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_samples_none() {
        let cell = LatestReportCell::new();
        assert!(cell.sample().is_none());
        assert_eq!(cell.expected_len(), None);
    }

    #[test]
    fn test_publish_then_sample() {
        let cell = LatestReportCell::new();
        assert!(cell.publish(&[1, 2, 3, 4]));

        let report = cell.sample().expect("report present");
        assert_eq!(report.bytes, vec![1, 2, 3, 4]);
        assert_eq!(report.generation, 1);
        assert_eq!(cell.expected_len(), Some(4));
    }

    #[test]
    fn test_generation_bumps_even_for_identical_bytes() {
        let cell = LatestReportCell::new();
        cell.publish(&[9, 9]);
        cell.publish(&[9, 9]);

        let report = cell.sample().expect("report present");
        assert_eq!(report.generation, 2);
    }

    #[test]
    fn test_only_latest_report_retained() {
        let cell = LatestReportCell::new();
        cell.publish(&[1, 1]);
        cell.publish(&[2, 2]);

        let report = cell.sample().expect("report present");
        assert_eq!(report.bytes, vec![2, 2]);
    }

    #[test]
    fn test_mismatched_length_dropped() {
        let cell = LatestReportCell::new();
        assert!(cell.publish(&[1, 2, 3, 4]));
        assert!(!cell.publish(&[1, 2]));

        let report = cell.sample().expect("report present");
        assert_eq!(report.bytes, vec![1, 2, 3, 4]);
        assert_eq!(report.generation, 1);
    }

    #[test]
    fn test_empty_report_dropped() {
        let cell = LatestReportCell::new();
        assert!(!cell.publish(&[]));
        assert!(cell.sample().is_none());
    }
}
