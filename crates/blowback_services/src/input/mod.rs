//! Input snapshots and the double buffer that records them
//!
//! Every frame the platform fills the *current* [`FrameInput`] and the game
//! reads it. Edges are derived by comparing against the *previous* snapshot,
//! then the two swap roles. Keyboard and mouse state is event driven, so
//! [`InputBuffer::begin_frame`] carries it forward explicitly; gamepad state
//! is re-sampled from the device every frame.

mod gamepad;

pub use gamepad::{
    normalize_stick, process_digital_button, process_pad_state, PadButtons, PadState,
    STICK_DEAD_ZONE,
};

/// Controller slots per snapshot. Slot 0 is the keyboard.
pub const MAX_CONTROLLERS: usize = 4;
pub const KEYBOARD_SLOT: usize = 0;
pub const MOUSE_BUTTON_COUNT: usize = 3;

//--- ButtonState -----------------------------------------------------------

/// State of one digital button at the end of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub ended_down: bool,
    /// Press/release edges since the previous snapshot (0 or 1).
    pub half_transition_count: u32,
}

impl ButtonState {
    /// Derive this frame's state from a live sample.
    #[inline]
    pub fn observe(&mut self, previous: ButtonState, is_down: bool) {
        self.ended_down = is_down;
        self.half_transition_count = u32::from(previous.ended_down != is_down);
    }

    /// Same held state as `previous`, no edges.
    #[inline]
    pub fn carried(previous: ButtonState) -> Self {
        Self {
            ended_down: previous.ended_down,
            half_transition_count: 0,
        }
    }

    #[inline]
    pub fn was_pressed(&self) -> bool {
        self.ended_down && self.half_transition_count > 0
    }

    #[inline]
    pub fn was_released(&self) -> bool {
        !self.ended_down && self.half_transition_count > 0
    }
}

//--- Button ----------------------------------------------------------------

/// Logical role of a controller button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ActionUp,
    ActionDown,
    ActionLeft,
    ActionRight,
    LeftShoulder,
    RightShoulder,
    Start,
    Back,
}

impl Button {
    pub const COUNT: usize = 12;

    pub const ALL: [Button; Button::COUNT] = [
        Button::MoveUp,
        Button::MoveDown,
        Button::MoveLeft,
        Button::MoveRight,
        Button::ActionUp,
        Button::ActionDown,
        Button::ActionLeft,
        Button::ActionRight,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::Start,
        Button::Back,
    ];

    pub const DIRECTIONAL: [Button; 4] = [
        Button::MoveRight,
        Button::MoveUp,
        Button::MoveDown,
        Button::MoveLeft,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

//--- ControllerInput -------------------------------------------------------

/// One logical input device: the keyboard or a gamepad.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerInput {
    pub is_connected: bool,
    pub is_analog: bool,
    /// Left stick, normalized to [-1, 1] after the dead zone.
    pub stick_average_x: f32,
    pub stick_average_y: f32,
    buttons: [ButtonState; Button::COUNT],
}

impl ControllerInput {
    #[inline]
    pub fn button(&self, button: Button) -> ButtonState {
        self.buttons[button.index()]
    }

    #[inline]
    pub fn button_mut(&mut self, button: Button) -> &mut ButtonState {
        &mut self.buttons[button.index()]
    }

    /// Set or clear a button from a discrete press/release event.
    pub fn apply_event(&mut self, previous: &ControllerInput, button: Button, is_down: bool) {
        let before = previous.button(button);
        self.button_mut(button).observe(before, is_down);
    }

    pub fn any_directional_down(&self) -> bool {
        Button::DIRECTIONAL
            .iter()
            .any(|&button| self.button(button).ended_down)
    }

    fn carry_from(&mut self, previous: &ControllerInput) {
        for (slot, before) in self.buttons.iter_mut().zip(previous.buttons.iter()) {
            *slot = ButtonState::carried(*before);
        }
    }
}

//--- Mouse -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Pointer position in logical pixels plus button states.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseInput {
    pub x: f32,
    pub y: f32,
    buttons: [ButtonState; MOUSE_BUTTON_COUNT],
}

impl MouseInput {
    #[inline]
    pub fn button(&self, button: MouseButton) -> ButtonState {
        self.buttons[button.index()]
    }

    pub fn apply_event(&mut self, previous: &MouseInput, button: MouseButton, is_down: bool) {
        let before = previous.button(button);
        self.buttons[button.index()].observe(before, is_down);
    }
}

//--- FrameInput ------------------------------------------------------------

/// Everything the game sees about input for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub mouse: MouseInput,
    /// Seconds this frame is expected to cover.
    pub dt: f32,
    pub controllers: [ControllerInput; MAX_CONTROLLERS],
}

impl FrameInput {
    #[inline]
    pub fn keyboard(&self) -> &ControllerInput {
        &self.controllers[KEYBOARD_SLOT]
    }

    #[inline]
    pub fn keyboard_mut(&mut self) -> &mut ControllerInput {
        &mut self.controllers[KEYBOARD_SLOT]
    }

    /// Gamepad slots, after the keyboard.
    #[inline]
    pub fn gamepads(&self) -> &[ControllerInput] {
        &self.controllers[KEYBOARD_SLOT + 1..]
    }

    #[inline]
    pub fn gamepads_mut(&mut self) -> &mut [ControllerInput] {
        &mut self.controllers[KEYBOARD_SLOT + 1..]
    }

    /// Controller the game should steer with this frame: the first connected
    /// gamepad holding a direction, otherwise the keyboard.
    pub fn active_controller(&self) -> &ControllerInput {
        self.gamepads()
            .iter()
            .find(|pad| pad.is_connected && pad.any_directional_down())
            .unwrap_or_else(|| self.keyboard())
    }
}

//--- InputBuffer -----------------------------------------------------------

/// Two [`FrameInput`] records whose roles alternate every frame.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    snapshots: [FrameInput; 2],
    current: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        let mut snapshots = [FrameInput::default(); 2];
        for snapshot in &mut snapshots {
            snapshot.keyboard_mut().is_connected = true;
        }
        Self {
            snapshots,
            current: 0,
        }
    }

    #[inline]
    pub fn current(&self) -> &FrameInput {
        &self.snapshots[self.current]
    }

    #[inline]
    pub fn previous(&self) -> &FrameInput {
        &self.snapshots[1 - self.current]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut FrameInput {
        &mut self.snapshots[self.current]
    }

    /// Mutable current snapshot alongside the previous one.
    pub fn split(&mut self) -> (&mut FrameInput, &FrameInput) {
        let [first, second] = &mut self.snapshots;
        if self.current == 0 {
            (first, &*second)
        } else {
            (second, &*first)
        }
    }

    /// Prepare the current snapshot, which still holds data from two frames
    /// ago, for this frame's events.
    ///
    /// Event-driven devices (keyboard, mouse) keep the state their last
    /// event set; gamepads start disconnected and must be re-sampled.
    pub fn begin_frame(&mut self) {
        let (current, previous) = self.split();

        current.keyboard_mut().carry_from(previous.keyboard());
        current.keyboard_mut().is_connected = true;

        current.mouse.x = previous.mouse.x;
        current.mouse.y = previous.mouse.y;
        for (slot, before) in current
            .mouse
            .buttons
            .iter_mut()
            .zip(previous.mouse.buttons.iter())
        {
            *slot = ButtonState::carried(*before);
        }

        for pad in current.gamepads_mut() {
            *pad = ControllerInput::default();
        }

        current.dt = 0.0;
    }

    /// Hand the current snapshot over to be next frame's previous.
    #[inline]
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run one frame: begin, press/release through `events`, then swap.
    fn frame(buffer: &mut InputBuffer, events: &[(Button, bool)]) -> FrameInput {
        buffer.begin_frame();
        {
            let (current, previous) = buffer.split();
            for &(button, is_down) in events {
                current
                    .keyboard_mut()
                    .apply_event(previous.keyboard(), button, is_down);
            }
        }
        let snapshot = *buffer.current();
        buffer.swap();
        snapshot
    }

    #[test]
    fn test_observe_counts_edges_against_previous() {
        let up = ButtonState::default();
        let down = ButtonState {
            ended_down: true,
            half_transition_count: 0,
        };

        let mut state = ButtonState::default();
        state.observe(up, true);
        assert_eq!(state.half_transition_count, 1);
        assert!(state.was_pressed());

        state.observe(down, true);
        assert_eq!(state.half_transition_count, 0);

        state.observe(down, false);
        assert_eq!(state.half_transition_count, 1);
        assert!(state.was_released());

        state.observe(up, false);
        assert_eq!(state.half_transition_count, 0);
    }

    #[test]
    fn test_swap_flips_roles_without_copying() {
        let mut buffer = InputBuffer::new();
        buffer.current_mut().dt = 1.0;
        buffer.swap();
        buffer.current_mut().dt = 2.0;

        assert_eq!(buffer.previous().dt, 1.0);
        assert_eq!(buffer.current().dt, 2.0);

        buffer.swap();
        assert_eq!(buffer.current().dt, 1.0);
        assert_eq!(buffer.previous().dt, 2.0);
    }

    #[test]
    fn test_half_transitions_only_on_change_for_every_button() {
        for button in Button::ALL {
            let mut buffer = InputBuffer::new();

            let pressed = frame(&mut buffer, &[(button, true)]);
            assert_eq!(pressed.keyboard().button(button).half_transition_count, 1);
            assert!(pressed.keyboard().button(button).ended_down);

            let held = frame(&mut buffer, &[]);
            assert_eq!(held.keyboard().button(button).half_transition_count, 0);
            assert!(held.keyboard().button(button).ended_down);

            let released = frame(&mut buffer, &[(button, false)]);
            assert_eq!(released.keyboard().button(button).half_transition_count, 1);
            assert!(!released.keyboard().button(button).ended_down);

            let idle = frame(&mut buffer, &[]);
            assert_eq!(idle.keyboard().button(button).half_transition_count, 0);
            assert!(!idle.keyboard().button(button).ended_down);
        }
    }

    #[test]
    fn test_press_and_release_in_one_frame_nets_zero() {
        let mut buffer = InputBuffer::new();
        let snapshot = frame(
            &mut buffer,
            &[(Button::MoveLeft, true), (Button::MoveLeft, false)],
        );

        let left = snapshot.keyboard().button(Button::MoveLeft);
        assert!(!left.ended_down);
        assert_eq!(left.half_transition_count, 0);
    }

    #[test]
    fn test_keyboard_state_survives_many_swaps() {
        let mut buffer = InputBuffer::new();
        frame(&mut buffer, &[(Button::MoveRight, true)]);

        for _ in 0..5 {
            let snapshot = frame(&mut buffer, &[]);
            assert!(snapshot.keyboard().button(Button::MoveRight).ended_down);
            assert!(snapshot.keyboard().is_connected);
        }
    }

    #[test]
    fn test_begin_frame_disconnects_stale_gamepads() {
        let mut buffer = InputBuffer::new();
        buffer.current_mut().gamepads_mut()[0].is_connected = true;
        buffer.swap();
        buffer.swap();

        buffer.begin_frame();
        assert!(!buffer.current().gamepads()[0].is_connected);
    }

    #[test]
    fn test_mouse_is_carried_forward() {
        let mut buffer = InputBuffer::new();
        buffer.begin_frame();
        {
            let (current, previous) = buffer.split();
            current.mouse.x = 12.0;
            current.mouse.y = 34.0;
            current
                .mouse
                .apply_event(&previous.mouse, MouseButton::Left, true);
        }
        buffer.swap();
        buffer.begin_frame();

        let mouse = buffer.current().mouse;
        assert_eq!((mouse.x, mouse.y), (12.0, 34.0));
        assert!(mouse.button(MouseButton::Left).ended_down);
        assert_eq!(mouse.button(MouseButton::Left).half_transition_count, 0);
    }

    #[test]
    fn test_active_controller_prefers_steering_gamepad() {
        let mut input = FrameInput::default();
        input.keyboard_mut().is_connected = true;
        assert!(std::ptr::eq(input.active_controller(), input.keyboard()));

        let pad = &mut input.gamepads_mut()[1];
        pad.is_connected = true;
        pad.button_mut(Button::MoveUp).ended_down = true;

        let active = input.active_controller();
        assert!(active.button(Button::MoveUp).ended_down);
        assert!(!std::ptr::eq(active, input.keyboard()));
    }

    #[test]
    fn test_disconnected_gamepad_is_never_active() {
        let mut input = FrameInput::default();
        input.gamepads_mut()[0]
            .button_mut(Button::MoveDown)
            .ended_down = true;

        assert!(std::ptr::eq(input.active_controller(), input.keyboard()));
    }
}
