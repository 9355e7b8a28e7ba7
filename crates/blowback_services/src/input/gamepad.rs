//! Gamepad sampling
//!
//! Gamepads are polled, not evented: each frame the backend hands over a
//! raw [`PadState`] and every button is re-derived from its bitmask.

use super::{Button, ButtonState, ControllerInput};

/// Raw left-stick magnitude below which input is treated as centered.
pub const STICK_DEAD_ZONE: i16 = 7849;

/// Digital button bits of a [`PadState`], XInput layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadButtons;

impl PadButtons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

const BUTTON_BITS: [(Button, u16); Button::COUNT] = [
    (Button::MoveUp, PadButtons::DPAD_UP),
    (Button::MoveDown, PadButtons::DPAD_DOWN),
    (Button::MoveLeft, PadButtons::DPAD_LEFT),
    (Button::MoveRight, PadButtons::DPAD_RIGHT),
    (Button::ActionUp, PadButtons::Y),
    (Button::ActionDown, PadButtons::A),
    (Button::ActionLeft, PadButtons::X),
    (Button::ActionRight, PadButtons::B),
    (Button::LeftShoulder, PadButtons::LEFT_SHOULDER),
    (Button::RightShoulder, PadButtons::RIGHT_SHOULDER),
    (Button::Start, PadButtons::START),
    (Button::Back, PadButtons::BACK),
];

/// One sample of a connected gamepad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadState {
    pub buttons: u16,
    pub stick_x: i16,
    pub stick_y: i16,
}

impl PadState {
    #[inline]
    pub fn is_down(&self, bit: u16) -> bool {
        self.buttons & bit == bit
    }
}

/// Map a raw stick axis to [-1, 1], zero inside the dead zone.
pub fn normalize_stick(value: i16, dead_zone: i16) -> f32 {
    let value = i32::from(value);
    let dead_zone = i32::from(dead_zone);
    if value < -dead_zone {
        (value + dead_zone) as f32 / (32768 - dead_zone) as f32
    } else if value > dead_zone {
        (value - dead_zone) as f32 / (32767 - dead_zone) as f32
    } else {
        0.0
    }
}

/// Set one button from a live bitmask.
#[inline]
pub fn process_digital_button(
    buttons: u16,
    bit: u16,
    previous: ButtonState,
    current: &mut ButtonState,
) {
    current.observe(previous, buttons & bit == bit);
}

/// Fill `current` from a live sample, deriving edges from `previous`.
pub fn process_pad_state(pad: &PadState, previous: &ControllerInput, current: &mut ControllerInput) {
    current.is_connected = true;

    for (button, bit) in BUTTON_BITS {
        process_digital_button(pad.buttons, bit, previous.button(button), current.button_mut(button));
    }

    current.stick_average_x = normalize_stick(pad.stick_x, STICK_DEAD_ZONE);
    current.stick_average_y = normalize_stick(pad.stick_y, STICK_DEAD_ZONE);
    current.is_analog = current.stick_average_x != 0.0 || current.stick_average_y != 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_zone_reads_centered() {
        assert_eq!(normalize_stick(0, STICK_DEAD_ZONE), 0.0);
        assert_eq!(normalize_stick(STICK_DEAD_ZONE, STICK_DEAD_ZONE), 0.0);
        assert_eq!(normalize_stick(-STICK_DEAD_ZONE, STICK_DEAD_ZONE), 0.0);
    }

    #[test]
    fn test_full_deflection_reaches_unit_range() {
        assert!((normalize_stick(i16::MAX, STICK_DEAD_ZONE) - 1.0).abs() < 1e-6);
        assert!((normalize_stick(i16::MIN, STICK_DEAD_ZONE) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bitmask_drives_every_button() {
        let previous = ControllerInput::default();
        let mut current = ControllerInput::default();

        for (button, bit) in BUTTON_BITS {
            let pad = PadState {
                buttons: bit,
                ..Default::default()
            };
            process_pad_state(&pad, &previous, &mut current);

            assert!(current.is_connected);
            assert!(current.button(button).ended_down, "{:?}", button);
            assert_eq!(current.button(button).half_transition_count, 1);
            for other in Button::ALL.iter().filter(|&&b| b != button) {
                assert!(!current.button(*other).ended_down, "{:?}", other);
            }
        }
    }

    #[test]
    fn test_held_pad_button_has_no_edge() {
        let pad = PadState {
            buttons: PadButtons::DPAD_RIGHT | PadButtons::A,
            ..Default::default()
        };

        let mut first = ControllerInput::default();
        process_pad_state(&pad, &ControllerInput::default(), &mut first);

        let mut second = ControllerInput::default();
        process_pad_state(&pad, &first, &mut second);

        assert!(second.button(Button::MoveRight).ended_down);
        assert_eq!(second.button(Button::MoveRight).half_transition_count, 0);
        assert_eq!(second.button(Button::ActionDown).half_transition_count, 0);
    }

    #[test]
    fn test_stick_outside_dead_zone_marks_analog() {
        let pad = PadState {
            stick_x: 20000,
            ..Default::default()
        };
        let mut current = ControllerInput::default();
        process_pad_state(&pad, &ControllerInput::default(), &mut current);

        assert!(current.is_analog);
        assert!(current.stick_average_x > 0.0);
        assert_eq!(current.stick_average_y, 0.0);
    }
}
