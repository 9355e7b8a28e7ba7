//! Graphics capability boundary
//!
//! The game only needs a handful of operations from the graphics API: build
//! a program from a shader pair, upload a mesh, bind, set uniforms and draw.
//! [`GraphicsContext`] is that surface. `WgpuGraphics` implements it on the
//! GPU; [`RecordingGraphics`] records calls so the game can be tested
//! without a window.

use crate::shader::ShaderSources;
use crate::RenderError;
use blowback_core::math::Mat4;
use bytemuck::{Pod, Zeroable};

/// Linked shader program. `NONE` means no usable program.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct ProgramHandle(pub u32);

impl ProgramHandle {
    pub const NONE: ProgramHandle = ProgramHandle(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Uploaded vertex + index buffers. `NONE` means nothing was uploaded.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct MeshHandle(pub u32);

impl MeshHandle {
    pub const NONE: MeshHandle = MeshHandle(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Named uniform slots shared by every sprite program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    View,
    Projection,
    Model,
    Time,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

/// CPU-side indexed mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit quad spanning -1..1, two triangles sharing the
    /// bottom-right/top-left diagonal.
    pub fn quad() -> Self {
        Self {
            vertices: vec![
                Vertex { position: [1.0, 1.0, 0.0] },   // top right
                Vertex { position: [1.0, -1.0, 0.0] },  // bottom right
                Vertex { position: [-1.0, -1.0, 0.0] }, // bottom left
                Vertex { position: [-1.0, 1.0, 0.0] },  // top left
            ],
            indices: vec![0, 1, 3, 1, 2, 3],
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Mesh is non-empty and every index points at a vertex.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(RenderError::EmptyMesh);
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(RenderError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(())
    }
}

/// Operations the update-and-render step needs from a graphics API.
pub trait GraphicsContext {
    fn compile_program(&mut self, sources: &ShaderSources) -> Result<ProgramHandle, RenderError>;
    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, RenderError>;
    fn bind_program(&mut self, program: ProgramHandle);
    fn set_uniform_mat4(&mut self, uniform: Uniform, value: &Mat4);
    fn set_uniform_f32(&mut self, uniform: Uniform, value: f32);
    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32);
}

//--- RecordingGraphics ------------------------------------------------------

/// One call made against a [`RecordingGraphics`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    CompileProgram(ProgramHandle),
    UploadMesh(MeshHandle),
    BindProgram(ProgramHandle),
    SetMat4(Uniform, Mat4),
    SetF32(Uniform, f32),
    DrawIndexed { mesh: MeshHandle, index_count: u32 },
}

/// Graphics context that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingGraphics {
    commands: Vec<GraphicsCommand>,
    programs: u32,
    meshes: u32,
    fail_compilation: bool,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose program compilation always fails.
    pub fn failing_compilation() -> Self {
        Self {
            fail_compilation: true,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Most recent matrix uploaded to `uniform`.
    pub fn last_mat4(&self, uniform: Uniform) -> Option<Mat4> {
        self.commands.iter().rev().find_map(|command| match command {
            GraphicsCommand::SetMat4(slot, value) if *slot == uniform => Some(*value),
            _ => None,
        })
    }

    /// Most recent scalar uploaded to `uniform`.
    pub fn last_f32(&self, uniform: Uniform) -> Option<f32> {
        self.commands.iter().rev().find_map(|command| match command {
            GraphicsCommand::SetF32(slot, value) if *slot == uniform => Some(*value),
            _ => None,
        })
    }

    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, GraphicsCommand::DrawIndexed { .. }))
            .count()
    }
}

impl GraphicsContext for RecordingGraphics {
    fn compile_program(&mut self, sources: &ShaderSources) -> Result<ProgramHandle, RenderError> {
        if self.fail_compilation {
            return Err(RenderError::ShaderCompilation {
                label: sources.vertex_label.clone(),
                message: "compilation disabled for this context".to_string(),
            });
        }
        self.programs += 1;
        let handle = ProgramHandle(self.programs);
        self.commands.push(GraphicsCommand::CompileProgram(handle));
        Ok(handle)
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, RenderError> {
        mesh.validate()?;
        self.meshes += 1;
        let handle = MeshHandle(self.meshes);
        self.commands.push(GraphicsCommand::UploadMesh(handle));
        Ok(handle)
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        self.commands.push(GraphicsCommand::BindProgram(program));
    }

    fn set_uniform_mat4(&mut self, uniform: Uniform, value: &Mat4) {
        self.commands.push(GraphicsCommand::SetMat4(uniform, *value));
    }

    fn set_uniform_f32(&mut self, uniform: Uniform, value: f32) {
        self.commands.push(GraphicsCommand::SetF32(uniform, value));
    }

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32) {
        self.commands
            .push(GraphicsCommand::DrawIndexed { mesh, index_count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_is_two_triangles_over_four_vertices() {
        let quad = MeshData::quad();
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.index_count(), 6);
        assert!(quad.validate().is_ok());
    }

    #[test]
    fn test_mesh_validation() {
        let empty = MeshData {
            vertices: Vec::new(),
            indices: Vec::new(),
        };
        assert!(matches!(empty.validate(), Err(RenderError::EmptyMesh)));

        let mut broken = MeshData::quad();
        broken.indices.push(9);
        assert!(matches!(
            broken.validate(),
            Err(RenderError::IndexOutOfRange {
                index: 9,
                vertex_count: 4
            })
        ));
    }

    #[test]
    fn test_recording_handles_are_never_none() {
        let mut gfx = RecordingGraphics::new();
        let program = gfx.compile_program(&ShaderSources::embedded_sprite()).unwrap();
        let mesh = gfx.upload_mesh(&MeshData::quad()).unwrap();

        assert!(!program.is_none());
        assert!(!mesh.is_none());
    }

    #[test]
    fn test_recording_keeps_latest_uniform() {
        let mut gfx = RecordingGraphics::new();
        gfx.set_uniform_mat4(Uniform::Model, &Mat4::IDENTITY);
        gfx.set_uniform_mat4(Uniform::View, &Mat4::ZERO);
        gfx.set_uniform_mat4(Uniform::Model, &Mat4::from_scale([2.0, 2.0, 2.0].into()));
        gfx.set_uniform_f32(Uniform::Time, 1.25);

        assert_eq!(
            gfx.last_mat4(Uniform::Model),
            Some(Mat4::from_scale([2.0, 2.0, 2.0].into()))
        );
        assert_eq!(gfx.last_mat4(Uniform::View), Some(Mat4::ZERO));
        assert_eq!(gfx.last_mat4(Uniform::Projection), None);
        assert_eq!(gfx.last_f32(Uniform::Time), Some(1.25));
    }

    #[test]
    fn test_failing_compilation_context() {
        let mut gfx = RecordingGraphics::failing_compilation();
        let err = gfx
            .compile_program(&ShaderSources::embedded_sprite())
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompilation { .. }));
        assert!(gfx.commands().is_empty());
    }
}
