//! Physical gamepad sampling
//!
//! A [`GamepadSource`] reports every connected pad as a [`PadState`] in the
//! XInput bit layout, in the slot it was first given. With the `gamepad` feature the pads come from gilrs;
//! otherwise there are none.

use blowback_services::input::{PadState, MAX_CONTROLLERS};

/// Gamepad slots after the keyboard.
pub const GAMEPAD_SLOTS: usize = MAX_CONTROLLERS - 1;

pub trait GamepadSource {
    /// Overwrite `pads` with this frame's samples, indexed by slot. Slots
    /// with no pad attached are `None`.
    fn poll(&mut self, pads: &mut [Option<PadState>]);
}

/// Source for builds or machines without gamepad support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGamepads;

impl GamepadSource for NoGamepads {
    fn poll(&mut self, pads: &mut [Option<PadState>]) {
        pads.fill(None);
    }
}

/// Sticky device-to-slot map. A pad keeps its slot until it disconnects, so
/// unplugging one pad never shifts the others.
#[derive(Debug, Clone)]
pub struct SlotAssignment<K> {
    slots: Vec<Option<K>>,
}

impl<K: PartialEq + Copy> SlotAssignment<K> {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Slot held by `id`, claiming the first free one for a new device.
    /// `None` when every slot is taken.
    pub fn slot_for(&mut self, id: K) -> Option<usize> {
        if let Some(slot) = self.slots.iter().position(|held| *held == Some(id)) {
            return Some(slot);
        }
        let free = self.slots.iter().position(Option::is_none)?;
        self.slots[free] = Some(id);
        Some(free)
    }

    /// Free the slots of devices no longer connected.
    pub fn release_missing(&mut self, connected: impl Fn(&K) -> bool) {
        for held in &mut self.slots {
            if held.as_ref().is_some_and(|id| !connected(id)) {
                *held = None;
            }
        }
    }
}

/// Best source available in this build.
pub fn default_source() -> Box<dyn GamepadSource> {
    #[cfg(feature = "gamepad")]
    {
        match gilrs_source::GilrsGamepads::new() {
            Ok(source) => return Box::new(source),
            Err(err) => {
                tracing::error!(error = %err, "Gamepad backend unavailable, continuing without gamepads");
            }
        }
    }
    Box::new(NoGamepads)
}

/// Convert an axis in [-1, 1] to the signed 16-bit range.
pub fn axis_to_raw(value: f32) -> i16 {
    let scaled = value.clamp(-1.0, 1.0) * 32767.0;
    scaled.round() as i16
}

#[cfg(feature = "gamepad")]
pub use gilrs_source::GilrsGamepads;

#[cfg(feature = "gamepad")]
mod gilrs_source {
    use super::{axis_to_raw, GamepadSource, SlotAssignment, GAMEPAD_SLOTS};
    use blowback_services::input::{PadButtons, PadState};
    use gilrs::{Axis, Button, GamepadId, Gilrs};

    const BUTTON_BITS: [(Button, u16); 12] = [
        (Button::DPadUp, PadButtons::DPAD_UP),
        (Button::DPadDown, PadButtons::DPAD_DOWN),
        (Button::DPadLeft, PadButtons::DPAD_LEFT),
        (Button::DPadRight, PadButtons::DPAD_RIGHT),
        (Button::Start, PadButtons::START),
        (Button::Select, PadButtons::BACK),
        (Button::LeftTrigger, PadButtons::LEFT_SHOULDER),
        (Button::RightTrigger, PadButtons::RIGHT_SHOULDER),
        (Button::South, PadButtons::A),
        (Button::East, PadButtons::B),
        (Button::West, PadButtons::X),
        (Button::North, PadButtons::Y),
    ];

    pub struct GilrsGamepads {
        gilrs: Gilrs,
        slots: SlotAssignment<GamepadId>,
    }

    impl GilrsGamepads {
        pub fn new() -> Result<Self, gilrs::Error> {
            let gilrs = Gilrs::new()?;
            for (id, gamepad) in gilrs.gamepads() {
                tracing::info!(?id, name = gamepad.name(), "Gamepad detected");
            }
            Ok(Self {
                gilrs,
                slots: SlotAssignment::new(GAMEPAD_SLOTS),
            })
        }
    }

    impl GamepadSource for GilrsGamepads {
        fn poll(&mut self, pads: &mut [Option<PadState>]) {
            // Events must be drained for gilrs to update cached state.
            while let Some(event) = self.gilrs.next_event() {
                tracing::trace!(id = ?event.id, event = ?event.event, "Gamepad event");
            }

            let gilrs = &self.gilrs;
            self.slots
                .release_missing(|id| gilrs.connected_gamepad(*id).is_some());

            pads.fill(None);
            for (id, gamepad) in gilrs.gamepads() {
                if !gamepad.is_connected() {
                    continue;
                }
                let Some(slot) = self.slots.slot_for(id) else {
                    continue;
                };
                let Some(target) = pads.get_mut(slot) else {
                    continue;
                };
                let buttons = BUTTON_BITS
                    .iter()
                    .filter(|(button, _)| gamepad.is_pressed(*button))
                    .fold(0u16, |bits, (_, bit)| bits | bit);

                *target = Some(PadState {
                    buttons,
                    stick_x: axis_to_raw(gamepad.value(Axis::LeftStickX)),
                    stick_y: axis_to_raw(gamepad.value(Axis::LeftStickY)),
                });
            }
        }
    }
}
