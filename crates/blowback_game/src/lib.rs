//! Blowback Game
//!
//! The per-tick simulation step. All state that outlives a frame is a
//! [`SimulationState`] stored in the permanent arena region; the step reads
//! one input snapshot and talks to the GPU only through
//! [`blowback_render::GraphicsContext`].

pub mod state;
pub mod update;

pub use state::{allocate_game_memory, SimulationState, StartupResources};
pub use update::{update_and_render, MOVE_STEP, QUAD_INDEX_COUNT};
