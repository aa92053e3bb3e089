//! Hardware input for the send loop: raw HID pedals and a game-controller
//! steering device.
//!
//! Pedal reports arrive on a dedicated reader thread and land in a
//! [`LatestReportCell`]; the control loop and the calibration procedure both
//! sample the cell without ever blocking on the device. Steering goes through
//! the [`SteeringPort`] seam, implemented for real hardware by
//! [`GilrsSteeringPort`] and for tests by [`mock::MockSteeringPort`].

pub mod error;
pub mod pedals;
pub mod report;
pub mod wheel;

pub use error::{HidError, HidResult};
pub use pedals::{HidPedals, PedalDeviceInfo, enumerate_pedals, find_pedals_by_path};
pub use report::LatestReportCell;
pub use wheel::{GilrsSteeringPort, SteeringDeviceInfo, SteeringPort, mock};
