//! Steering input via the system game-controller stack.
//!
//! Wheels enumerate as ordinary game controllers, so steering goes through
//! gilrs rather than raw HID: the OS driver already maps the wheel's axes
//! and buttons. Axes and buttons are addressed by discovery index, matching
//! what the saved session stores.

use gilrs::{Event, EventType, Gilrs, GamepadId, ev::Code};
use tracing::debug;

use crate::error::{HidError, HidResult};

/// One connected steering candidate, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteeringDeviceInfo {
    /// Position in the enumeration order; stable within a session.
    pub index: usize,
    /// Controller name from the driver.
    pub name: String,
}

/// Steering device seam used by the control loop and the setup flow.
pub trait SteeringPort {
    /// Currently connected steering candidates.
    fn devices(&self) -> Vec<SteeringDeviceInfo>;

    /// Selects the device at `index` for input.
    ///
    /// # Errors
    ///
    /// [`HidError::SteeringIndexOutOfRange`] when `index` does not name a
    /// connected device.
    fn select(&mut self, index: usize) -> HidResult<SteeringDeviceInfo>;

    /// Drains pending input events, updating axis and button state.
    fn pump(&mut self);

    /// Value of the axis at `axis_index`, 0.0 when absent.
    fn axis(&self, axis_index: usize) -> f32;

    /// Whether the button at `button_index` is currently held.
    fn button(&self, button_index: u32) -> bool;
}

/// Real steering input backed by gilrs.
///
/// Axis and button slots are assigned in the order their codes are first
/// seen, seeded from the driver's snapshot at selection time so values are
/// meaningful before the first event arrives.
pub struct GilrsSteeringPort {
    gilrs: Gilrs,
    selected: Option<GamepadId>,
    axis_codes: Vec<Code>,
    axis_values: Vec<f32>,
    button_codes: Vec<Code>,
    button_pressed: Vec<bool>,
}

impl GilrsSteeringPort {
    /// Initializes the game-controller backend.
    ///
    /// # Errors
    ///
    /// [`HidError::SteeringInit`] when the platform backend fails.
    pub fn new() -> HidResult<Self> {
        let gilrs = Gilrs::new().map_err(|err| HidError::SteeringInit(err.to_string()))?;
        Ok(Self {
            gilrs,
            selected: None,
            axis_codes: Vec::new(),
            axis_values: Vec::new(),
            button_codes: Vec::new(),
            button_pressed: Vec::new(),
        })
    }

    fn axis_slot(&mut self, code: Code) -> usize {
        slot_for(&mut self.axis_codes, code)
    }

    fn button_slot(&mut self, code: Code) -> usize {
        slot_for(&mut self.button_codes, code)
    }
}

fn slot_for(codes: &mut Vec<Code>, code: Code) -> usize {
    match codes.iter().position(|c| *c == code) {
        Some(slot) => slot,
        None => {
            codes.push(code);
            codes.len() - 1
        }
    }
}

fn store<T: Copy + Default>(values: &mut Vec<T>, slot: usize, value: T) {
    if slot >= values.len() {
        values.resize(slot + 1, T::default());
    }
    if let Some(entry) = values.get_mut(slot) {
        *entry = value;
    }
}

impl SteeringPort for GilrsSteeringPort {
    fn devices(&self) -> Vec<SteeringDeviceInfo> {
        self.gilrs
            .gamepads()
            .enumerate()
            .map(|(index, (_, gamepad))| SteeringDeviceInfo {
                index,
                name: gamepad.name().to_string(),
            })
            .collect()
    }

    fn select(&mut self, index: usize) -> HidResult<SteeringDeviceInfo> {
        let available = self.gilrs.gamepads().count();
        let (id, name) = self
            .gilrs
            .gamepads()
            .nth(index)
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .ok_or(HidError::SteeringIndexOutOfRange { index, available })?;

        self.selected = Some(id);
        self.axis_codes.clear();
        self.axis_values.clear();
        self.button_codes.clear();
        self.button_pressed.clear();

        // Seed from the driver's snapshot; events only report changes.
        let snapshot: (Vec<(Code, f32)>, Vec<(Code, bool)>) = {
            let gamepad = self.gilrs.gamepad(id);
            let state = gamepad.state();
            (
                state.axes().map(|(code, data)| (code, data.value())).collect(),
                state
                    .buttons()
                    .map(|(code, data)| (code, data.is_pressed()))
                    .collect(),
            )
        };
        for (code, value) in snapshot.0 {
            let slot = self.axis_slot(code);
            store(&mut self.axis_values, slot, value);
        }
        for (code, pressed) in snapshot.1 {
            let slot = self.button_slot(code);
            store(&mut self.button_pressed, slot, pressed);
        }

        debug!(index, %name, "selected steering device");
        Ok(SteeringDeviceInfo { index, name })
    }

    fn pump(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if self.selected != Some(id) {
                continue;
            }
            match event {
                EventType::AxisChanged(_, value, code) => {
                    let slot = self.axis_slot(code);
                    store(&mut self.axis_values, slot, value);
                }
                EventType::ButtonPressed(_, code) => {
                    let slot = self.button_slot(code);
                    store(&mut self.button_pressed, slot, true);
                }
                EventType::ButtonReleased(_, code) => {
                    let slot = self.button_slot(code);
                    store(&mut self.button_pressed, slot, false);
                }
                _ => {}
            }
        }
    }

    fn axis(&self, axis_index: usize) -> f32 {
        self.axis_values.get(axis_index).copied().unwrap_or(0.0)
    }

    fn button(&self, button_index: u32) -> bool {
        usize::try_from(button_index)
            .ok()
            .and_then(|index| self.button_pressed.get(index))
            .copied()
            .unwrap_or(false)
    }
}

/// In-memory steering port for tests.
pub mod mock {
    use super::{SteeringDeviceInfo, SteeringPort};
    use crate::error::{HidError, HidResult};

    /// Scriptable [`SteeringPort`] with settable axis and button state.
    #[derive(Debug, Default)]
    pub struct MockSteeringPort {
        devices: Vec<SteeringDeviceInfo>,
        selected: Option<usize>,
        axes: Vec<f32>,
        buttons: Vec<bool>,
    }

    impl MockSteeringPort {
        /// Creates a port with no devices.
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a named device and returns its index.
        pub fn add_device(&mut self, name: impl Into<String>) -> usize {
            let index = self.devices.len();
            self.devices.push(SteeringDeviceInfo {
                index,
                name: name.into(),
            });
            index
        }

        /// Sets the value reported for an axis.
        pub fn set_axis(&mut self, axis_index: usize, value: f32) {
            if axis_index >= self.axes.len() {
                self.axes.resize(axis_index + 1, 0.0);
            }
            if let Some(entry) = self.axes.get_mut(axis_index) {
                *entry = value;
            }
        }

        /// Sets the held state reported for a button.
        pub fn set_button(&mut self, button_index: usize, pressed: bool) {
            if button_index >= self.buttons.len() {
                self.buttons.resize(button_index + 1, false);
            }
            if let Some(entry) = self.buttons.get_mut(button_index) {
                *entry = pressed;
            }
        }

        /// The index passed to the last successful `select`, if any.
        pub fn selected(&self) -> Option<usize> {
            self.selected
        }
    }

    impl SteeringPort for MockSteeringPort {
        fn devices(&self) -> Vec<SteeringDeviceInfo> {
            self.devices.clone()
        }

        fn select(&mut self, index: usize) -> HidResult<SteeringDeviceInfo> {
            match self.devices.get(index) {
                Some(info) => {
                    self.selected = Some(index);
                    Ok(info.clone())
                }
                None => Err(HidError::SteeringIndexOutOfRange {
                    index,
                    available: self.devices.len(),
                }),
            }
        }

        fn pump(&mut self) {}

        fn axis(&self, axis_index: usize) -> f32 {
            self.axes.get(axis_index).copied().unwrap_or(0.0)
        }

        fn button(&self, button_index: u32) -> bool {
            usize::try_from(button_index)
                .ok()
                .and_then(|index| self.buttons.get(index))
                .copied()
                .unwrap_or(false)
        }
    }
}
