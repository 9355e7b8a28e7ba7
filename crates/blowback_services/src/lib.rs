//! Blowback Services Layer
//!
//! Platform-independent services the frame loop depends on: input
//! snapshots with edge detection, and startup settings.

pub mod input;
pub mod settings;

pub use input::{Button, ButtonState, ControllerInput, FrameInput, InputBuffer};
pub use settings::Settings;
