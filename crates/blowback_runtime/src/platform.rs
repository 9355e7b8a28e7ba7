//! winit platform shell
//!
//! The loop owns control flow, so winit is pumped (zero timeout) once per
//! frame instead of being handed the thread. Events collected during a pump
//! are applied to the current input snapshot afterwards.

use crate::frame_loop::{LoopControl, Platform};
use crate::gamepad::{GamepadSource, GAMEPAD_SLOTS};
use blowback_render::window::{
    create_event_loop, toggled_fullscreen, window_attributes, WindowConfig,
};
use blowback_render::{GraphicsContext, RecordingGraphics, WgpuGraphics};
use blowback_services::input::{process_pad_state, MouseButton, PadState};
use blowback_services::{Button, FrameInput};
use std::sync::Arc;
use std::time::Duration;
use winit::{
    application::ApplicationHandler,
    error::EventLoopError,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowId},
};

/// What a key does, independent of the frame it arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press(Button),
    ToggleFullscreen,
    Quit,
    Ignored,
}

pub fn map_key(code: KeyCode) -> KeyAction {
    match code {
        KeyCode::ArrowUp | KeyCode::KeyW => KeyAction::Press(Button::MoveUp),
        KeyCode::ArrowDown | KeyCode::KeyS => KeyAction::Press(Button::MoveDown),
        KeyCode::ArrowLeft | KeyCode::KeyA => KeyAction::Press(Button::MoveLeft),
        KeyCode::ArrowRight | KeyCode::KeyD => KeyAction::Press(Button::MoveRight),
        KeyCode::KeyQ => KeyAction::Press(Button::LeftShoulder),
        KeyCode::KeyE => KeyAction::Press(Button::RightShoulder),
        KeyCode::Space => KeyAction::Press(Button::ActionDown),
        KeyCode::Enter => KeyAction::Press(Button::Start),
        KeyCode::Backspace => KeyAction::Press(Button::Back),
        KeyCode::KeyF => KeyAction::ToggleFullscreen,
        KeyCode::Escape => KeyAction::Quit,
        _ => KeyAction::Ignored,
    }
}

fn map_mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

/// Input observed during one pump, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum InputEvent {
    Key { button: Button, is_down: bool },
    Mouse { button: MouseButton, is_down: bool },
    CursorMoved { x: f32, y: f32 },
}

fn apply_events(events: &[InputEvent], current: &mut FrameInput, previous: &FrameInput) {
    for event in events {
        match *event {
            InputEvent::Key { button, is_down } => {
                current
                    .keyboard_mut()
                    .apply_event(previous.keyboard(), button, is_down);
            }
            InputEvent::Mouse { button, is_down } => {
                current.mouse.apply_event(&previous.mouse, button, is_down);
            }
            InputEvent::CursorMoved { x, y } => {
                current.mouse.x = x;
                current.mouse.y = y;
            }
        }
    }
}

/// Fill gamepad slots from samples. Empty samples leave their slot
/// disconnected and extra samples beyond the slots are dropped.
fn apply_pads(pads: &[Option<PadState>], current: &mut FrameInput, previous: &FrameInput) {
    for ((slot, before), pad) in current
        .gamepads_mut()
        .iter_mut()
        .zip(previous.gamepads())
        .zip(pads)
    {
        if let Some(pad) = pad {
            process_pad_state(pad, before, slot);
        }
    }
}

/// Where draws go. Without a GPU adapter the game still runs, drawing into
/// a recorder that is emptied every present.
enum Renderer {
    Gpu(WgpuGraphics),
    Headless(RecordingGraphics),
}

impl Renderer {
    fn context(&mut self) -> &mut dyn GraphicsContext {
        match self {
            Renderer::Gpu(gpu) => gpu,
            Renderer::Headless(recorder) => recorder,
        }
    }

    fn present(&mut self) {
        match self {
            Renderer::Gpu(gpu) => gpu.present(),
            Renderer::Headless(recorder) => recorder.clear(),
        }
    }
}

struct PlatformApp {
    window_config: WindowConfig,
    clear_color: [f64; 4],
    window: Option<Arc<Window>>,
    renderer: Renderer,
    events: Vec<InputEvent>,
    stop_requested: bool,
}

impl PlatformApp {
    fn handle_key(&mut self, event: &KeyEvent) {
        if event.repeat {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let is_down = event.state == ElementState::Pressed;

        match map_key(code) {
            KeyAction::Press(button) => self.events.push(InputEvent::Key { button, is_down }),
            KeyAction::Quit if is_down => {
                tracing::info!("Escape pressed, stopping");
                self.stop_requested = true;
            }
            KeyAction::ToggleFullscreen if is_down => self.toggle_fullscreen(),
            KeyAction::ToggleFullscreen | KeyAction::Quit | KeyAction::Ignored => {}
        }
    }

    fn toggle_fullscreen(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let next = toggled_fullscreen(window.fullscreen().as_ref());
        tracing::info!(fullscreen = next.is_some(), "Toggling fullscreen");
        window.set_fullscreen(next);
    }
}

impl ApplicationHandler for PlatformApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes(&self.window_config)) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(error = %err, "Failed to create window");
                self.stop_requested = true;
                return;
            }
        };
        tracing::info!(
            title = %self.window_config.title,
            width = self.window_config.width,
            height = self.window_config.height,
            fullscreen = self.window_config.fullscreen,
            "Window created"
        );

        match WgpuGraphics::new_blocking(window.clone(), self.clear_color) {
            Ok(gpu) => {
                let caps = gpu.capabilities();
                tracing::info!(
                    backend = ?caps.backend,
                    adapter = %caps.adapter_name,
                    max_texture_size = caps.max_texture_size,
                    supports_compute = caps.supports_compute,
                    "Graphics ready"
                );
                self.renderer = Renderer::Gpu(gpu);
            }
            Err(err) => {
                tracing::error!(error = %err, "Graphics unavailable, running without drawing");
            }
        }

        self.window = Some(window);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                self.stop_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let Renderer::Gpu(gpu) = &mut self.renderer {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = map_mouse_button(button) {
                    self.events.push(InputEvent::Mouse {
                        button,
                        is_down: state == ElementState::Pressed,
                    });
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                let logical = position.to_logical::<f32>(scale);
                self.events.push(InputEvent::CursorMoved {
                    x: logical.x,
                    y: logical.y,
                });
            }
            _ => {}
        }
    }
}

/// Desktop platform: one window, its wgpu surface and polled gamepads.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    app: PlatformApp,
    gamepads: Box<dyn GamepadSource>,
    pads: [Option<PadState>; GAMEPAD_SLOTS],
}

impl WinitPlatform {
    pub fn new(
        window_config: WindowConfig,
        clear_color: [f64; 4],
        gamepads: Box<dyn GamepadSource>,
    ) -> Result<Self, EventLoopError> {
        let event_loop = create_event_loop()?;
        Ok(Self {
            event_loop,
            app: PlatformApp {
                window_config,
                clear_color,
                window: None,
                renderer: Renderer::Headless(RecordingGraphics::new()),
                events: Vec::new(),
                stop_requested: false,
            },
            gamepads,
            pads: [None; GAMEPAD_SLOTS],
        })
    }

    /// Pump until the window exists. Returns false if the platform asked to
    /// stop first.
    pub fn wait_until_ready(&mut self) -> bool {
        while self.app.window.is_none() {
            if self.pump(Some(Duration::from_millis(10))) == LoopControl::Stop {
                return false;
            }
        }
        self.app.events.clear();
        true
    }

    /// Logical size the game projects onto.
    pub fn logical_size(&self) -> (f32, f32) {
        self.app.window_config.logical_size()
    }

    fn pump(&mut self, timeout: Option<Duration>) -> LoopControl {
        match self.event_loop.pump_app_events(timeout, &mut self.app) {
            PumpStatus::Continue if !self.app.stop_requested => LoopControl::Continue,
            PumpStatus::Continue => LoopControl::Stop,
            PumpStatus::Exit(code) => {
                tracing::info!(code, "Event loop exited");
                LoopControl::Stop
            }
        }
    }
}

impl Platform for WinitPlatform {
    fn pump_events(&mut self, current: &mut FrameInput, previous: &FrameInput) -> LoopControl {
        let control = self.pump(Some(Duration::ZERO));

        apply_events(&self.app.events, current, previous);
        self.app.events.clear();

        self.gamepads.poll(&mut self.pads);
        apply_pads(&self.pads, current, previous);

        control
    }

    fn graphics(&mut self) -> &mut dyn GraphicsContext {
        self.app.renderer.context()
    }

    fn present(&mut self) {
        self.app.renderer.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blowback_services::input::PadButtons;
    use blowback_services::InputBuffer;

    #[test]
    fn test_arrows_and_wasd_share_directions() {
        assert_eq!(map_key(KeyCode::ArrowUp), map_key(KeyCode::KeyW));
        assert_eq!(map_key(KeyCode::ArrowDown), map_key(KeyCode::KeyS));
        assert_eq!(map_key(KeyCode::ArrowLeft), map_key(KeyCode::KeyA));
        assert_eq!(map_key(KeyCode::ArrowRight), KeyAction::Press(Button::MoveRight));
    }

    #[test]
    fn test_special_keys() {
        assert_eq!(map_key(KeyCode::Escape), KeyAction::Quit);
        assert_eq!(map_key(KeyCode::Space), KeyAction::Press(Button::ActionDown));
        assert_eq!(map_key(KeyCode::Enter), KeyAction::Press(Button::Start));
        assert_eq!(map_key(KeyCode::Backspace), KeyAction::Press(Button::Back));
        assert_eq!(map_key(KeyCode::KeyF), KeyAction::ToggleFullscreen);
        assert_eq!(map_key(KeyCode::F1), KeyAction::Ignored);
    }

    #[test]
    fn test_press_then_release_in_one_pump() {
        let mut inputs = InputBuffer::new();
        inputs.begin_frame();
        let (current, previous) = inputs.split();

        apply_events(
            &[
                InputEvent::Key { button: Button::MoveUp, is_down: true },
                InputEvent::Key { button: Button::MoveUp, is_down: false },
                InputEvent::CursorMoved { x: 12.0, y: 34.0 },
                InputEvent::Mouse { button: MouseButton::Left, is_down: true },
            ],
            current,
            previous,
        );

        let up = current.keyboard().button(Button::MoveUp);
        assert!(!up.ended_down);
        assert_eq!(up.half_transition_count, 0);
        assert_eq!((current.mouse.x, current.mouse.y), (12.0, 34.0));
        assert!(current.mouse.button(MouseButton::Left).was_pressed());
    }

    #[test]
    fn test_extra_pads_are_clamped() {
        let mut inputs = InputBuffer::new();
        inputs.begin_frame();
        let (current, previous) = inputs.split();

        let pad = PadState {
            buttons: PadButtons::DPAD_RIGHT,
            ..PadState::default()
        };
        apply_pads(&[Some(pad); 6], current, previous);

        assert!(current.gamepads().iter().all(|slot| slot.is_connected));
        assert!(current.active_controller().button(Button::MoveRight).ended_down);
        assert!(!current.keyboard().button(Button::MoveRight).ended_down);
    }

    #[test]
    fn test_empty_pad_slot_stays_disconnected() {
        let mut inputs = InputBuffer::new();
        inputs.begin_frame();
        let (current, previous) = inputs.split();

        let pad = PadState {
            buttons: PadButtons::DPAD_UP,
            ..PadState::default()
        };
        apply_pads(&[None, Some(pad), None], current, previous);

        let slots = current.gamepads();
        assert!(!slots[0].is_connected);
        assert!(slots[1].is_connected);
        assert!(slots[1].button(Button::MoveUp).ended_down);
        assert!(!slots[2].is_connected);
    }
}
