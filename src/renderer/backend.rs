//! Graphics backend contract.
//!
//! The scene graph and the render-state layer never talk to a graphics API
//! directly. Everything they need goes through [`GraphicsBackend`], whose
//! handles are opaque integers minted by the backend. A backend is passed
//! explicitly into every call that needs it; there is no global context.

use crate::errors::Result;
use crate::renderer::protocol::{BlendFactor, FrameBufferTarget, TextureSlot};
use crate::scene::id_registry::EntityId;

/// Handle to a linked program / pipeline object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub u32);

/// Handle to a uniform buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Handle to a texture owned by an asset system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to vertex data (a model / quad) owned by an asset system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexSource(pub u32);

impl VertexSource {
    /// The unit quad every backend provides.
    pub const QUAD: Self = Self(0);
}

/// Programmable stage of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Source text for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSource {
    pub stage: ShaderStage,
    pub source: String,
}

/// Everything a backend needs to build one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDescriptor {
    pub label: String,
    pub stages: Vec<StageSource>,
    /// Sampler name → texture unit.
    pub samplers: Vec<(&'static str, TextureSlot)>,
    /// Uniform block name → binding location.
    pub uniform_blocks: Vec<(&'static str, u32)>,
}

/// Narrow interface onto the GPU.
///
/// Implementations report failures with
/// [`EaselError::ShaderCompile`](crate::errors::EaselError::ShaderCompile) or
/// [`EaselError::BackendFatal`](crate::errors::EaselError::BackendFatal);
/// the renderer treats both as frame-aborting.
pub trait GraphicsBackend {
    /// Compiles and links a program.
    fn compile_program(&mut self, descriptor: &ProgramDescriptor) -> Result<PipelineHandle>;

    fn destroy_program(&mut self, pipeline: PipelineHandle);

    /// Makes `pipeline` the active program.
    fn bind_program(&mut self, pipeline: PipelineHandle);

    /// Attaches uniform buffers to the block bindings of `pipeline`, in
    /// binding order.
    fn bind_uniform_buffers(&mut self, pipeline: PipelineHandle, buffers: &[BufferHandle]);

    /// Creates a uniform buffer initialised with `contents`.
    fn create_buffer(&mut self, label: &str, contents: &[u8]) -> Result<BufferHandle>;

    /// Overwrites `bytes.len()` bytes of `buffer` starting at `offset`.
    fn upload_buffer_range(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8]) -> Result<()>;

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn bind_texture(&mut self, slot: TextureSlot, texture: TextureHandle);

    fn set_blend_function(&mut self, src: BlendFactor, dst: BlendFactor);

    /// Selects the attachments written by subsequent draws. `count` is 1
    /// (target only) or 2 (target + ID attachment).
    fn set_draw_targets(&mut self, target: FrameBufferTarget, count: u32);

    fn issue_draw_call(&mut self, pipeline: PipelineHandle, vertices: VertexSource) -> Result<()>;

    /// Destroys and recreates the framebuffer attachments at the given size.
    fn recreate_framebuffer(&mut self, width: u32, height: u32) -> Result<()>;

    /// Clears all attachments at the start of a frame.
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<()>;

    /// Presents the scene attachment.
    fn end_frame(&mut self) -> Result<()>;

    /// Reads the entity id written at a framebuffer position.
    fn read_entity_id(&self, x: u32, y: u32) -> Result<EntityId>;

    /// Releases framebuffer resources.
    fn destroy_framebuffer(&mut self);
}
