//! Input hardware error types.

use thiserror::Error;

/// Errors from device discovery and opening.
#[derive(Debug, Error)]
pub enum HidError {
    /// The HID backend failed (init, open, or read setup).
    #[error("HID backend error: {0}")]
    Backend(#[from] hidapi::HidError),

    /// No connected HID device looked like a pedal set.
    #[error("no pedal-like HID device found")]
    NoPedalsFound,

    /// A configured pedal device path is no longer present.
    #[error("pedal device not found at path '{path}'")]
    PedalDeviceNotFound {
        /// The stale path from the saved session.
        path: String,
    },

    /// The game-controller backend failed to initialize.
    #[error("steering backend error: {0}")]
    SteeringInit(String),

    /// A configured steering device index no longer exists.
    #[error("steering device index {index} out of range ({available} connected)")]
    SteeringIndexOutOfRange {
        /// The stale index from the saved session.
        index: usize,
        /// How many controllers are connected now.
        available: usize,
    },
}

/// Result alias for input hardware operations.
pub type HidResult<T> = Result<T, HidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HidError::SteeringIndexOutOfRange {
            index: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "steering device index 3 out of range (1 connected)"
        );

        let err = HidError::PedalDeviceNotFound {
            path: "/dev/hidraw7".to_string(),
        };
        assert!(err.to_string().contains("/dev/hidraw7"));
    }
}
