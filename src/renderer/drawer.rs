//! Per-entity paint state diffing.
//!
//! A [`Drawer`] owns the two uniform buffers of one drawable entity and the
//! snapshots of what was last submitted to them. Each submission is first
//! compared as a whole against the snapshot (the common "nothing changed"
//! path costs one struct comparison and no backend calls), then field by
//! field through the tables in [`uniforms`](super::uniforms), uploading only
//! the byte ranges that changed.
//!
//! The byte comparison runs against a shadow copy of the GPU contents rather
//! than the previous request: a feature-gated field that changed while its
//! feature was off is still stale on the GPU, and is uploaded as soon as the
//! feature is switched back on.

use crate::errors::Result;
use crate::renderer::backend::{BufferHandle, GraphicsBackend};
use crate::renderer::paint::PaintState;
use crate::renderer::protocol::RenderFeatures;
use crate::renderer::uniforms::{
    ENTITY_FIELDS, EntityUniforms, PAINT_FIELDS, PaintUniforms, changed_fields,
};
use crate::scene::id_registry::EntityId;
use crate::scene::transform::Metrics;

#[derive(Debug)]
pub struct Drawer {
    entity_buffer: BufferHandle,
    paint_buffer: BufferHandle,

    saved_metrics: Metrics,
    saved_id: EntityId,
    saved_state: PaintState,

    entity_gpu: EntityUniforms,
    paint_gpu: PaintUniforms,
}

impl Drawer {
    /// Allocates both uniform buffers, initialised from the current entity
    /// metrics and paint state.
    pub fn create(
        backend: &mut dyn GraphicsBackend,
        id: EntityId,
        metrics: &Metrics,
        state: &PaintState,
    ) -> Result<Self> {
        let entity_gpu = EntityUniforms::pack(metrics, id);
        let paint_gpu = PaintUniforms::pack(state);

        let entity_buffer = backend.create_buffer("EntityData", bytemuck::bytes_of(&entity_gpu))?;
        let paint_buffer = match backend.create_buffer("PainterData", bytemuck::bytes_of(&paint_gpu)) {
            Ok(buffer) => buffer,
            Err(e) => {
                backend.release_buffer(entity_buffer);
                return Err(e);
            }
        };

        Ok(Self {
            entity_buffer,
            paint_buffer,
            saved_metrics: *metrics,
            saved_id: id,
            saved_state: *state,
            entity_gpu,
            paint_gpu,
        })
    }

    /// Buffers in uniform block binding order.
    #[inline]
    #[must_use]
    pub fn buffers(&self) -> [BufferHandle; 2] {
        [self.entity_buffer, self.paint_buffer]
    }

    #[inline]
    #[must_use]
    pub fn saved_state(&self) -> &PaintState {
        &self.saved_state
    }

    #[inline]
    #[must_use]
    pub fn saved_metrics(&self) -> &Metrics {
        &self.saved_metrics
    }

    /// Brings the entity block up to date with `metrics`.
    ///
    /// Returns the number of partial uploads issued.
    pub fn clean(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        metrics: &Metrics,
        id: EntityId,
    ) -> Result<usize> {
        if *metrics == self.saved_metrics && id == self.saved_id {
            return Ok(0);
        }

        let packed = EntityUniforms::pack(metrics, id);
        let new_bytes = bytemuck::bytes_of(&packed);
        let mut uploads = 0;

        for field in changed_fields(
            &ENTITY_FIELDS,
            bytemuck::bytes_of(&self.entity_gpu),
            new_bytes,
            RenderFeatures::all(),
        ) {
            backend.upload_buffer_range(self.entity_buffer, field.offset, &new_bytes[field.range()])?;
            uploads += 1;
        }

        if id != self.saved_id {
            let offset = std::mem::offset_of!(EntityUniforms, id);
            backend.upload_buffer_range(self.entity_buffer, offset, bytemuck::bytes_of(&packed.id))?;
            uploads += 1;
        }

        self.entity_gpu = packed;
        self.saved_metrics = *metrics;
        self.saved_id = id;
        Ok(uploads)
    }

    /// Brings the paint block up to date with `state`.
    ///
    /// Fields the shader does not read under `state.features` are left
    /// untouched on the GPU. Returns the number of partial uploads issued.
    pub fn load_settings(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        state: &PaintState,
    ) -> Result<usize> {
        if *state == self.saved_state {
            return Ok(0);
        }

        let packed = PaintUniforms::pack(state);
        let new_bytes = bytemuck::bytes_of(&packed);
        let gpu_bytes = bytemuck::bytes_of_mut(&mut self.paint_gpu);
        let mut uploads = 0;

        for field in &PAINT_FIELDS {
            let range = field.range();
            if !field.is_read_with(state.features) || gpu_bytes[range.clone()] == new_bytes[range.clone()] {
                continue;
            }
            backend.upload_buffer_range(self.paint_buffer, field.offset, &new_bytes[range.clone()])?;
            gpu_bytes[range.clone()].copy_from_slice(&new_bytes[range]);
            uploads += 1;
        }

        self.saved_state = *state;
        Ok(uploads)
    }

    /// Returns both buffers to the backend.
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.release_buffer(self.entity_buffer);
        backend.release_buffer(self.paint_buffer);
    }
}
