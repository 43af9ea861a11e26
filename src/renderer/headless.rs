//! Headless backend.
//!
//! [`RecordingBackend`] implements [`GraphicsBackend`] without a GPU. Every
//! state-changing call is appended to a log of [`BackendCall`]s, buffers are
//! plain byte vectors, and the ID attachment is a CPU-side grid that tests
//! (or a CPU rasterizer) can fill in. It backs the integration tests, the
//! benchmark and the demo.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::errors::{EaselError, Result};
use crate::renderer::backend::{
    BufferHandle, GraphicsBackend, PipelineHandle, ProgramDescriptor, TextureHandle, VertexSource,
};
use crate::renderer::protocol::{BlendFactor, FrameBufferTarget, TextureSlot};
use crate::scene::id_registry::EntityId;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CompileProgram { label: String, pipeline: PipelineHandle },
    DestroyProgram(PipelineHandle),
    BindProgram(PipelineHandle),
    BindUniformBuffers { pipeline: PipelineHandle, buffers: Vec<BufferHandle> },
    CreateBuffer { label: String, buffer: BufferHandle, size: usize },
    UploadRange { buffer: BufferHandle, offset: usize, size: usize },
    ReleaseBuffer(BufferHandle),
    BindTexture { slot: TextureSlot, texture: TextureHandle },
    SetBlend { src: BlendFactor, dst: BlendFactor },
    SetDrawTargets { target: FrameBufferTarget, count: u32 },
    Draw { pipeline: PipelineHandle, vertices: VertexSource },
    RecreateFramebuffer { width: u32, height: u32 },
    BeginFrame,
    EndFrame,
    DestroyFramebuffer,
}

/// CPU-only backend that records every call it receives.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    buffers: FxHashMap<BufferHandle, Vec<u8>>,
    programs: FxHashMap<PipelineHandle, String>,
    next_pipeline: u32,
    next_buffer: u32,

    width: u32,
    height: u32,
    id_attachment: Vec<u32>,

    released_buffers: VecDeque<BufferHandle>,

    /// When set, the next `compile_program` fails with this message.
    pub fail_next_compile: Option<String>,
    /// When set, `create_buffer` hands out released handles again (in release
    /// order), the way GL buffer names are recycled.
    pub reuse_buffer_handles: bool,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    #[must_use]
    pub fn compile_count(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::CompileProgram { .. }))
    }

    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::UploadRange { .. }))
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Draw { .. }))
    }

    /// `(offset, size)` of every recorded upload into `buffer`.
    #[must_use]
    pub fn uploads_to(&self, buffer: BufferHandle) -> Vec<(usize, usize)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::UploadRange { buffer: b, offset, size } if *b == buffer => {
                    Some((*offset, *size))
                }
                _ => None,
            })
            .collect()
    }

    /// Current contents of a live buffer.
    #[must_use]
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn framebuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Writes `id` into the ID attachment at `(x, y)`.
    pub fn write_id(&mut self, x: u32, y: u32, id: EntityId) -> Result<()> {
        let index = self.pixel_index(x, y)?;
        self.id_attachment[index] = id.raw();
        Ok(())
    }

    fn pixel_index(&self, x: u32, y: u32) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(EaselError::OutOfRange {
                index: (y as usize) * (self.width as usize) + x as usize,
                len: self.id_attachment.len(),
            });
        }
        Ok((y as usize) * (self.width as usize) + x as usize)
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile_program(&mut self, descriptor: &ProgramDescriptor) -> Result<PipelineHandle> {
        if let Some(message) = self.fail_next_compile.take() {
            return Err(EaselError::ShaderCompile(format!("{}: {message}", descriptor.label)));
        }
        self.next_pipeline += 1;
        let pipeline = PipelineHandle(self.next_pipeline);
        self.programs.insert(pipeline, descriptor.label.clone());
        self.calls.push(BackendCall::CompileProgram {
            label: descriptor.label.clone(),
            pipeline,
        });
        Ok(pipeline)
    }

    fn destroy_program(&mut self, pipeline: PipelineHandle) {
        self.programs.remove(&pipeline);
        self.calls.push(BackendCall::DestroyProgram(pipeline));
    }

    fn bind_program(&mut self, pipeline: PipelineHandle) {
        self.calls.push(BackendCall::BindProgram(pipeline));
    }

    fn bind_uniform_buffers(&mut self, pipeline: PipelineHandle, buffers: &[BufferHandle]) {
        self.calls.push(BackendCall::BindUniformBuffers {
            pipeline,
            buffers: buffers.to_vec(),
        });
    }

    fn create_buffer(&mut self, label: &str, contents: &[u8]) -> Result<BufferHandle> {
        let recycled = if self.reuse_buffer_handles {
            self.released_buffers.pop_front()
        } else {
            None
        };
        let buffer = recycled.unwrap_or_else(|| {
            self.next_buffer += 1;
            BufferHandle(self.next_buffer)
        });
        self.buffers.insert(buffer, contents.to_vec());
        self.calls.push(BackendCall::CreateBuffer {
            label: label.to_owned(),
            buffer,
            size: contents.len(),
        });
        Ok(buffer)
    }

    fn upload_buffer_range(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8]) -> Result<()> {
        let storage = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| EaselError::BackendFatal(format!("upload into released buffer {buffer:?}")))?;
        let end = offset + bytes.len();
        if end > storage.len() {
            return Err(EaselError::BackendFatal(format!(
                "upload {offset}..{end} past end of buffer {buffer:?} ({} bytes)",
                storage.len()
            )));
        }
        storage[offset..end].copy_from_slice(bytes);
        self.calls.push(BackendCall::UploadRange {
            buffer,
            offset,
            size: bytes.len(),
        });
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            self.released_buffers.push_back(buffer);
        }
        self.calls.push(BackendCall::ReleaseBuffer(buffer));
    }

    fn bind_texture(&mut self, slot: TextureSlot, texture: TextureHandle) {
        self.calls.push(BackendCall::BindTexture { slot, texture });
    }

    fn set_blend_function(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.calls.push(BackendCall::SetBlend { src, dst });
    }

    fn set_draw_targets(&mut self, target: FrameBufferTarget, count: u32) {
        self.calls.push(BackendCall::SetDrawTargets { target, count });
    }

    fn issue_draw_call(&mut self, pipeline: PipelineHandle, vertices: VertexSource) -> Result<()> {
        if !self.programs.contains_key(&pipeline) {
            return Err(EaselError::BackendFatal(format!("draw with unknown program {pipeline:?}")));
        }
        self.calls.push(BackendCall::Draw { pipeline, vertices });
        Ok(())
    }

    fn recreate_framebuffer(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(EaselError::BackendFatal(format!(
                "incomplete framebuffer {width}x{height}"
            )));
        }
        self.width = width;
        self.height = height;
        self.id_attachment = vec![EntityId::UNASSIGNED.raw(); (width as usize) * (height as usize)];
        self.calls.push(BackendCall::RecreateFramebuffer { width, height });
        Ok(())
    }

    fn begin_frame(&mut self, _clear_color: [f32; 4]) -> Result<()> {
        if self.id_attachment.is_empty() {
            return Err(EaselError::BackendFatal("frame begun without a framebuffer".into()));
        }
        self.calls.push(BackendCall::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push(BackendCall::EndFrame);
        Ok(())
    }

    fn read_entity_id(&self, x: u32, y: u32) -> Result<EntityId> {
        let index = self.pixel_index(x, y)?;
        Ok(EntityId::from_raw(self.id_attachment[index]))
    }

    fn destroy_framebuffer(&mut self) {
        self.width = 0;
        self.height = 0;
        self.id_attachment.clear();
        self.calls.push(BackendCall::DestroyFramebuffer);
    }
}
