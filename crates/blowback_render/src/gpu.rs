//! wgpu implementation of [`GraphicsContext`]
//!
//! The game issues GL-style calls (bind, set uniform, draw) during
//! update-and-render. Those are staged on the CPU: every draw snapshots the
//! current uniform block and is queued. [`WgpuGraphics::present`] then
//! acquires the surface, uploads the snapshots into one dynamic-offset
//! uniform buffer, and replays the queue inside a single render pass.

use crate::backend::{GraphicsContext, MeshData, MeshHandle, ProgramHandle, Uniform};
use crate::shader::{ShaderSources, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::{DeviceCapabilities, RenderError};
use blowback_core::math::Mat4;
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use std::num::NonZeroU64;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Draws that fit in one frame's uniform buffer.
const MAX_DRAWS_PER_FRAME: u64 = 64;

/// Uniform block shared by the sprite vertex and fragment stages.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SpriteUniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    time: f32,
    _padding: [f32; 3],
}

impl SpriteUniforms {
    fn identity() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            time: 0.0,
            _padding: [0.0; 3],
        }
    }
}

const UNIFORM_SIZE: u64 = std::mem::size_of::<SpriteUniforms>() as u64;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct QueuedDraw {
    pipeline: usize,
    mesh: usize,
    index_count: u32,
    uniforms: SpriteUniforms,
}

pub struct WgpuGraphics {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    capabilities: DeviceCapabilities,
    clear_color: wgpu::Color,

    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,

    pipelines: Vec<wgpu::RenderPipeline>,
    meshes: Vec<GpuMesh>,

    bound_program: ProgramHandle,
    staged: SpriteUniforms,
    draws: Vec<QueuedDraw>,
    warned_unbound: bool,
}

impl WgpuGraphics {
    /// Blocking wrapper around [`WgpuGraphics::new`].
    pub fn new_blocking(window: Arc<Window>, clear_color: [f64; 4]) -> Result<Self, RenderError> {
        pollster::block_on(Self::new(window, clear_color))
    }

    pub async fn new(window: Arc<Window>, clear_color: [f64; 4]) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Blowback Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let capabilities = DeviceCapabilities {
            backend: info.backend.into(),
            adapter_name: info.name.clone(),
            max_texture_size: device.limits().max_texture_dimension_2d,
            supports_compute: adapter
                .get_downlevel_capabilities()
                .flags
                .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
        };

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RenderError::NoAdapter)?;

        // Frame pacing is the loop's job, so avoid stacking vsync on top of it
        // where the surface allows.
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let uniform_stride = wgpu::util::align_to(
            UNIFORM_SIZE,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Uniform Buffer"),
            size: uniform_stride * MAX_DRAWS_PER_FRAME,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORM_SIZE),
                }),
            }],
        });

        let [r, g, b, a] = clear_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            capabilities,
            clear_color: wgpu::Color { r, g, b, a },
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            pipelines: Vec::new(),
            meshes: Vec::new(),
            bound_program: ProgramHandle::NONE,
            staged: SpriteUniforms::identity(),
            draws: Vec::new(),
            warned_unbound: false,
        })
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Reconfigure the surface. Only the swapchain follows the window; the
    /// game keeps its logical size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Clear the surface, replay every queued draw and present.
    pub fn present(&mut self) {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.draws.clear();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("Timed out acquiring surface texture, skipping frame");
                self.draws.clear();
                return;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to acquire surface texture");
                self.draws.clear();
                return;
            }
        };

        for (slot, draw) in self.draws.iter().enumerate() {
            self.queue.write_buffer(
                &self.uniform_buffer,
                slot as u64 * self.uniform_stride,
                bytemuck::bytes_of(&draw.uniforms),
            );
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (slot, draw) in self.draws.iter().enumerate() {
                let mesh = &self.meshes[draw.mesh];
                let offset = (slot as u64 * self.uniform_stride) as wgpu::DynamicOffset;

                render_pass.set_pipeline(&self.pipelines[draw.pipeline]);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.draws.clear();
    }

    fn compile_stage(&self, label: &str, source: &str) -> Result<wgpu::ShaderModule, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
            });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::ShaderCompilation {
                label: label.to_string(),
                message: err.to_string(),
            }),
            None => {
                tracing::info!(shader = label, "Shader compiled");
                Ok(module)
            }
        }
    }

    fn pipeline_index(&self, program: ProgramHandle) -> Option<usize> {
        let index = (program.0 as usize).checked_sub(1)?;
        (index < self.pipelines.len()).then_some(index)
    }

    fn mesh_index(&self, mesh: MeshHandle) -> Option<usize> {
        let index = (mesh.0 as usize).checked_sub(1)?;
        (index < self.meshes.len()).then_some(index)
    }
}

impl GraphicsContext for WgpuGraphics {
    fn compile_program(&mut self, sources: &ShaderSources) -> Result<ProgramHandle, RenderError> {
        let vertex = self.compile_stage(&sources.vertex_label, &sources.vertex)?;
        let fragment = self.compile_stage(&sources.fragment_label, &sources.fragment)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Sprite Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<crate::Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ProgramLink {
                message: err.to_string(),
            });
        }

        self.pipelines.push(pipeline);
        tracing::info!("Shader program linked");
        Ok(ProgramHandle(self.pipelines.len() as u32))
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, RenderError> {
        mesh.validate()?;

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        });
        Ok(MeshHandle(self.meshes.len() as u32))
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        self.bound_program = program;
    }

    fn set_uniform_mat4(&mut self, uniform: Uniform, value: &Mat4) {
        let cols = value.to_cols_array_2d();
        match uniform {
            Uniform::View => self.staged.view = cols,
            Uniform::Projection => self.staged.projection = cols,
            Uniform::Model => self.staged.model = cols,
            Uniform::Time => tracing::warn!(?uniform, "Uniform is not a matrix"),
        }
    }

    fn set_uniform_f32(&mut self, uniform: Uniform, value: f32) {
        match uniform {
            Uniform::Time => self.staged.time = value,
            _ => tracing::warn!(?uniform, "Uniform is not a scalar"),
        }
    }

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32) {
        let (Some(pipeline), Some(mesh)) = (
            self.pipeline_index(self.bound_program),
            self.mesh_index(mesh),
        ) else {
            if !self.warned_unbound {
                tracing::warn!(
                    program = ?self.bound_program,
                    ?mesh,
                    "Draw skipped: no valid program or mesh"
                );
                self.warned_unbound = true;
            }
            return;
        };

        if self.draws.len() as u64 >= MAX_DRAWS_PER_FRAME {
            tracing::warn!(max = MAX_DRAWS_PER_FRAME, "Draw skipped: per-frame draw limit reached");
            return;
        }

        self.draws.push(QueuedDraw {
            pipeline,
            mesh,
            index_count: index_count.min(self.meshes[mesh].index_count),
            uniforms: self.staged,
        });
    }
}
