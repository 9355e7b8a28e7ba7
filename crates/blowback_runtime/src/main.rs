//! Blowback Runtime
//!
//! Boots the window, reserves game memory and runs the frame loop until the
//! window closes or Escape is pressed.

use anyhow::{Context, Result};
use blowback_core::time::SystemClock;
use blowback_game::{allocate_game_memory, update::quad_mesh, update_and_render, StartupResources};
use blowback_render::window::WindowConfig;
use blowback_render::{GraphicsContext, ProgramHandle, ShaderSources};
use blowback_runtime::{gamepad, FrameLoop, Platform, WinitPlatform};
use blowback_services::settings::SETTINGS_ENV_VAR;
use blowback_services::{InputBuffer, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Blowback v{}", blowback_core::VERSION);

    let settings_path = std::env::var_os(SETTINGS_ENV_VAR).map(PathBuf::from);
    let settings = Settings::resolve(settings_path.as_deref()).context("failed to load settings")?;

    let permanent = settings
        .memory
        .permanent_bytes()
        .context("permanent memory size is out of range")?;
    let transient = settings
        .memory
        .transient_bytes()
        .context("transient memory size is out of range")?;
    let mut arena =
        allocate_game_memory(permanent, transient).context("failed to reserve game memory")?;

    let window_config = WindowConfig {
        title: settings.window.title.clone(),
        width: settings.window.width,
        height: settings.window.height,
        fullscreen: settings.window.fullscreen,
    };
    let mut platform = WinitPlatform::new(
        window_config,
        settings.render.clear_color,
        gamepad::default_source(),
    )
    .context("failed to create event loop")?;

    if !platform.wait_until_ready() {
        tracing::info!("Stopped before the window was ready");
        return Ok(());
    }

    let sources = ShaderSources::load_or_embedded(&settings.shaders.vertex, &settings.shaders.fragment);
    let program = match platform.graphics().compile_program(&sources) {
        Ok(program) => program,
        Err(err) => {
            tracing::error!(error = %err, "Sprite program unavailable, drawing disabled");
            ProgramHandle::NONE
        }
    };
    let quad = platform
        .graphics()
        .upload_mesh(&quad_mesh())
        .context("failed to upload quad mesh")?;

    let (window_width, window_height) = platform.logical_size();
    let resources = StartupResources {
        program,
        quad,
        window_width,
        window_height,
    };

    let mut inputs = InputBuffer::new();
    let mut frame_loop = FrameLoop::new(SystemClock::new(), settings.timing.pacing_policy());
    let summary = frame_loop.run(&mut platform, &mut inputs, |input, gfx| {
        update_and_render(&mut arena, input, gfx, &resources);
    });

    tracing::info!(
        frames = summary.frames,
        missed = summary.missed_frames,
        "Shutdown complete"
    );
    Ok(())
}
