use crate::state::{SimulationState, StartupResources};
use blowback_core::math::{screen_orthographic, Mat4, Vec2, Vec3};
use blowback_core::memory::MemoryArena;
use blowback_render::{GraphicsContext, MeshData, Uniform};
use blowback_services::{Button, FrameInput};

/// Units moved per frame for each held direction.
pub const MOVE_STEP: f32 = 10.0;

/// Size of the drawn quad in screen units.
pub const SPRITE_SCALE: Vec3 = Vec3::new(50.0, 50.0, 0.0);

pub const NEAR_PLANE: f32 = -0.1;
pub const FAR_PLANE: f32 = 1000.0;

/// Index count of [`MeshData::quad`].
pub const QUAD_INDEX_COUNT: u32 = 6;

/// Advance the simulation one tick and issue its draw calls.
///
/// Motion is per frame rather than per second, so speed follows the
/// achieved frame rate.
pub fn update_and_render(
    arena: &mut MemoryArena,
    input: &FrameInput,
    gfx: &mut dyn GraphicsContext,
    resources: &StartupResources,
) {
    let first_frame = !arena.is_initialized();

    let state = match arena.state_mut::<SimulationState>() {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "Simulation state does not fit in the arena");
            return;
        }
    };

    if first_frame {
        *state = SimulationState::initial(resources);
        tracing::info!(
            width = state.window_width,
            height = state.window_height,
            "Simulation state initialized"
        );
    }

    state.last_dt = input.dt;
    state.elapsed_seconds += input.dt;
    state.frame_count = state.frame_count.wrapping_add(1);
    state.fps = if input.dt > 0.0 { 1.0 / input.dt } else { 0.0 };

    let drawable = !state.shader_program.is_none() && !state.quad_mesh.is_none();

    if drawable {
        let view = Mat4::look_at_rh(
            state.camera_position,
            state.camera_position + state.camera_front,
            state.camera_up,
        );
        let projection = screen_orthographic(
            state.window_width,
            state.window_height,
            NEAR_PLANE,
            FAR_PLANE,
        );

        gfx.bind_program(state.shader_program);
        gfx.set_uniform_mat4(Uniform::View, &view);
        gfx.set_uniform_mat4(Uniform::Projection, &projection);
    }

    state.movement = movement_for(input);
    state.position += state.movement;

    if drawable {
        gfx.set_uniform_mat4(Uniform::Model, &sprite_model(state.position));
        gfx.set_uniform_f32(Uniform::Time, state.elapsed_seconds);
        gfx.draw_indexed(state.quad_mesh, QUAD_INDEX_COUNT);
    } else {
        tracing::trace!("No program or mesh, draw skipped");
    }

    if first_frame {
        arena.mark_initialized();
    }
}

/// Displacement from the active controller's held directions. Opposite
/// directions cancel.
pub fn movement_for(input: &FrameInput) -> Vec2 {
    let controller = input.active_controller();
    let mut movement = Vec2::ZERO;

    for button in Button::DIRECTIONAL {
        if !controller.button(button).ended_down {
            continue;
        }
        match button {
            Button::MoveRight => movement.x += MOVE_STEP,
            Button::MoveUp => movement.y += MOVE_STEP,
            Button::MoveDown => movement.y -= MOVE_STEP,
            Button::MoveLeft => movement.x -= MOVE_STEP,
            _ => {}
        }
    }

    movement
}

/// Scale to sprite size, then place it so `position` is its bottom-left
/// corner.
pub fn sprite_model(position: Vec2) -> Mat4 {
    let mut model = Mat4::from_scale(SPRITE_SCALE);
    model.w_axis = (position.extend(0.0) + SPRITE_SCALE).extend(1.0);
    model
}

/// Mesh uploaded at startup and drawn every frame.
pub fn quad_mesh() -> MeshData {
    MeshData::quad()
}
