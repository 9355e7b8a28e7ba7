//! Blowback Runtime
//!
//! The frame loop, the winit platform shell that feeds it and gamepad
//! polling. `main.rs` wires these to the game step.

pub mod frame_loop;
pub mod gamepad;
pub mod platform;

pub use frame_loop::{FrameLoop, LoopControl, LoopSummary, Platform};
pub use platform::WinitPlatform;
