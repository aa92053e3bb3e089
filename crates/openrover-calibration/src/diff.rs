//! Moving-byte detection for unlabelled raw reports.

use std::collections::BTreeSet;

/// Default difference threshold; a byte must move at least this far from the
/// baseline to count, which rejects electrical noise on analog sensors.
pub const DEFAULT_NOISE_THRESHOLD: u8 = 2;

/// Byte indices where `current` differs from `baseline` by at least `threshold`.
///
/// Reports of mismatched length are treated as "no data" and yield an empty
/// set; report length is constant for the lifetime of a device session.
pub fn moving_bytes(baseline: &[u8], current: &[u8], threshold: u8) -> Vec<usize> {
    if baseline.len() != current.len() {
        return Vec::new();
    }
    baseline
        .iter()
        .zip(current)
        .enumerate()
        .filter_map(|(i, (a, b))| (a.abs_diff(*b) >= threshold).then_some(i))
        .collect()
}

/// Accumulates the union of moving byte indices over an observation window.
///
/// The engine never guesses which index is authoritative; the accumulated
/// set is presented to the operator for disambiguation.
#[derive(Debug)]
pub struct MovementObserver {
    baseline: Vec<u8>,
    threshold: u8,
    moved: BTreeSet<usize>,
}

impl MovementObserver {
    /// Starts observing against `baseline` with the given threshold.
    pub fn new(baseline: Vec<u8>, threshold: u8) -> Self {
        Self {
            baseline,
            threshold,
            moved: BTreeSet::new(),
        }
    }

    /// Folds one report into the moving set.
    pub fn observe(&mut self, report: &[u8]) {
        for i in moving_bytes(&self.baseline, report, self.threshold) {
            self.moved.insert(i);
        }
    }

    /// The accumulated moving indices, ascending.
    pub fn moved(&self) -> Vec<usize> {
        self.moved.iter().copied().collect()
    }

    /// True when nothing has moved yet.
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
    }
}
