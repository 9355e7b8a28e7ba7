//! Simulation state kept at the head of the permanent arena region

use blowback_core::math::{CameraBasis, Vec2, Vec3};
use blowback_core::memory::{MemoryArena, MemoryError};
use blowback_render::{MeshHandle, ProgramHandle};
use bytemuck::{Pod, Zeroable};

/// Everything that survives from one frame to the next.
///
/// Lives inside [`MemoryArena`]; a zeroed arena is a valid, uninitialized
/// instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SimulationState {
    pub camera_position: Vec3,
    pub camera_front: Vec3,
    pub camera_world_up: Vec3,
    pub camera_target: Vec3,
    pub camera_direction: Vec3,
    pub camera_right: Vec3,
    pub camera_up: Vec3,

    pub position: Vec2,
    pub movement: Vec2,

    pub last_dt: f32,
    pub elapsed_seconds: f32,
    pub frame_count: u32,
    pub fps: f32,

    pub shader_program: ProgramHandle,
    pub quad_mesh: MeshHandle,
    pub window_width: f32,
    pub window_height: f32,
}

impl SimulationState {
    pub const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.0, 3.0);
    pub const CAMERA_FRONT: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    /// First-frame values: camera on +Z looking at the origin, quad at the
    /// bottom-left corner.
    pub fn initial(resources: &StartupResources) -> Self {
        let target = Vec3::ZERO;
        let basis = CameraBasis::look_at(Self::CAMERA_POSITION, target, Vec3::Y);

        Self {
            camera_position: Self::CAMERA_POSITION,
            camera_front: Self::CAMERA_FRONT,
            camera_world_up: Vec3::Y,
            camera_target: target,
            camera_direction: basis.direction,
            camera_right: basis.right,
            camera_up: basis.up,
            position: Vec2::ZERO,
            movement: Vec2::ZERO,
            last_dt: 0.0,
            elapsed_seconds: 0.0,
            frame_count: 0,
            fps: 0.0,
            shader_program: resources.program,
            quad_mesh: resources.quad,
            window_width: resources.window_width,
            window_height: resources.window_height,
        }
    }
}

/// Objects created before the loop starts that the game refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartupResources {
    pub program: ProgramHandle,
    pub quad: MeshHandle,
    pub window_width: f32,
    pub window_height: f32,
}

/// Reserve the arena, refusing a permanent region that cannot hold
/// [`SimulationState`].
pub fn allocate_game_memory(
    permanent_size: usize,
    transient_size: usize,
) -> Result<MemoryArena, MemoryError> {
    let required = std::mem::size_of::<SimulationState>();
    if permanent_size < required {
        return Err(MemoryError::RegionTooSmall {
            required,
            available: permanent_size,
        });
    }

    let arena = MemoryArena::new(permanent_size, transient_size)?;
    tracing::info!(
        permanent = arena.permanent_size(),
        transient = arena.transient_size(),
        state_bytes = required,
        "Game memory reserved"
    );
    Ok(arena)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blowback_core::memory::kilobytes;

    fn resources() -> StartupResources {
        StartupResources {
            program: ProgramHandle(1),
            quad: MeshHandle(1),
            window_width: 1280.0,
            window_height: 720.0,
        }
    }

    #[test]
    fn test_zeroed_arena_reads_as_zeroed_state() {
        let arena = allocate_game_memory(kilobytes(4), 0).unwrap();
        let state = arena.state::<SimulationState>().unwrap();
        assert_eq!(*state, SimulationState::zeroed());
    }

    #[test]
    fn test_initial_camera_basis() {
        let state = SimulationState::initial(&resources());

        assert_eq!(state.camera_position, Vec3::new(0.0, 0.0, 3.0));
        assert!(state.camera_direction.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(state.camera_right.abs_diff_eq(Vec3::X, 1e-6));
        assert!(state.camera_up.abs_diff_eq(Vec3::Y, 1e-6));
        assert_eq!(state.position, Vec2::ZERO);
        assert_eq!(state.window_width, 1280.0);
    }

    #[test]
    fn test_permanent_region_must_hold_state() {
        let err = allocate_game_memory(8, 0).unwrap_err();
        assert!(matches!(err, MemoryError::RegionTooSmall { available: 8, .. }));
    }
}
