//! Scheduler error types.

use thiserror::Error;

/// Errors from scheduler construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// Requested frequency is zero, negative, or not finite.
    #[error("invalid send frequency: {hz} Hz")]
    InvalidFrequency {
        /// The rejected frequency.
        hz: f64,
    },
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::InvalidFrequency { hz: 0.0 };
        assert_eq!(err.to_string(), "invalid send frequency: 0 Hz");
    }
}
