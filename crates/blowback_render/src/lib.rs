//! Blowback Render System
//!
//! Graphics capability trait, its wgpu implementation and a recording stub,
//! window configuration and shader source loading.

pub mod backend;
pub mod gpu;
pub mod shader;
pub mod window;

pub use backend::{
    GraphicsCommand, GraphicsContext, MeshData, MeshHandle, ProgramHandle, RecordingGraphics,
    Uniform, Vertex,
};
pub use gpu::WgpuGraphics;
pub use shader::ShaderSources;

pub use wgpu;
pub use winit;

use thiserror::Error;

/// Rendering backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Metal (macOS, iOS)
    Metal,
    /// DirectX 12 (Windows)
    DirectX12,
    /// Vulkan (cross-platform)
    Vulkan,
    /// OpenGL / GLES (cross-platform, fallback)
    OpenGL,
    /// WebGPU (web)
    WebGpu,
    /// No hardware backend
    Software,
}

impl From<wgpu::Backend> for BackendType {
    fn from(backend: wgpu::Backend) -> Self {
        match backend {
            wgpu::Backend::Metal => BackendType::Metal,
            wgpu::Backend::Dx12 => BackendType::DirectX12,
            wgpu::Backend::Vulkan => BackendType::Vulkan,
            wgpu::Backend::Gl => BackendType::OpenGL,
            wgpu::Backend::BrowserWebGpu => BackendType::WebGpu,
            _ => BackendType::Software,
        }
    }
}

/// Capability probe result
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    pub backend: BackendType,
    pub adapter_name: String,
    pub max_texture_size: u32,
    pub supports_compute: bool,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("shader '{label}' failed to compile: {message}")]
    ShaderCompilation { label: String, message: String },

    #[error("shader program failed to link: {message}")]
    ProgramLink { message: String },

    #[error("mesh has no vertices or no indices")]
    EmptyMesh,

    #[error("mesh index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}
