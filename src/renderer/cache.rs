//! Render Protocol Cache
//!
//! Central owner of every compiled program of one graphics context, keyed by
//! [`ProtocolKey`] (`brush × features`). Programs are built lazily on first
//! request and never evicted: the key space is bounded (six brushes × 256
//! feature sets), and compilation is the most expensive thing the renderer
//! does, so each key is compiled at most once for the lifetime of the cache.
//!
//! # Bound-state memo
//!
//! Besides the protocol map, the cache remembers what is currently bound on
//! the backend (protocol key, program, uniform buffers, blend pair, draw
//! target count) and only issues the state changes that actually differ:
//!
//! - blend function: only when the blend pair differs from the previous protocol
//! - draw targets: only when the multi-target flag (or the target) differs
//! - program: whenever the program identity differs, even for an equal key
//! - uniform buffers: whenever the program or the drawer's buffers differ,
//!   or the bound buffers were released since

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::renderer::backend::{BufferHandle, GraphicsBackend, PipelineHandle};
use crate::renderer::protocol::{BlendPair, Brush, FrameBufferTarget, ProtocolKey, RenderFeatures};
use crate::renderer::shader_gen;

/// A compiled program and the fixed-function state it expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProtocol {
    pub pipeline: PipelineHandle,
    pub blend: BlendPair,
    /// Writes the ID attachment alongside the selected target.
    pub multitarget: bool,
}

impl RenderProtocol {
    #[inline]
    #[must_use]
    pub fn draw_target_count(&self) -> u32 {
        if self.multitarget { 2 } else { 1 }
    }
}

/// Lazily-built protocol store plus the memo of currently bound state.
#[derive(Debug, Default)]
pub struct ProtocolCache {
    protocols: FxHashMap<ProtocolKey, RenderProtocol>,

    current: Option<ProtocolKey>,
    bound_pipeline: Option<PipelineHandle>,
    bound_buffers: Option<(PipelineHandle, [BufferHandle; 2])>,
    bound_blend: Option<BlendPair>,
    bound_targets: Option<(FrameBufferTarget, u32)>,
    target: FrameBufferTarget,

    builds: u64,
}

impl ProtocolCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            protocols: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ..Self::default()
        }
    }

    /// Number of cached protocols.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Total number of program builds performed by this cache.
    #[inline]
    #[must_use]
    pub fn builds(&self) -> u64 {
        self.builds
    }

    #[must_use]
    pub fn get(&self, key: ProtocolKey) -> Option<&RenderProtocol> {
        self.protocols.get(&key)
    }

    /// Key of the protocol bound by the last [`bind_protocol`](Self::bind_protocol).
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<ProtocolKey> {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> FrameBufferTarget {
        self.target
    }

    /// Returns the protocol for `key`, building it on first use.
    pub fn get_or_create(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        key: ProtocolKey,
    ) -> Result<RenderProtocol> {
        if let Some(protocol) = self.protocols.get(&key) {
            return Ok(*protocol);
        }

        let descriptor = shader_gen::program_descriptor(key);
        let pipeline = backend.compile_program(&descriptor)?;

        let protocol = match key.brush {
            Brush::MultiComponentBlend => RenderProtocol {
                pipeline,
                blend: BlendPair::DUAL_SOURCE,
                multitarget: false,
            },
            _ => RenderProtocol {
                pipeline,
                blend: BlendPair::ALPHA,
                multitarget: true,
            },
        };

        self.builds += 1;
        log::debug!(
            "Built render protocol {} ({:?}, features {:#04x})",
            descriptor.label,
            pipeline,
            key.features.bits()
        );

        self.protocols.insert(key, protocol);
        Ok(protocol)
    }

    /// Binds the protocol for `(brush, features)` together with a drawer's
    /// uniform buffers, issuing only the backend calls whose state differs
    /// from what is already bound.
    pub fn bind_protocol(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        buffers: [BufferHandle; 2],
        brush: Brush,
        features: RenderFeatures,
    ) -> Result<PipelineHandle> {
        let key = ProtocolKey::new(brush, features);
        let protocol = self.get_or_create(backend, key)?;

        if self.current != Some(key) {
            self.current = Some(key);

            if self.bound_blend != Some(protocol.blend) {
                backend.set_blend_function(protocol.blend.src, protocol.blend.dst);
                self.bound_blend = Some(protocol.blend);
            }

            self.bind_draw_targets(backend, protocol.draw_target_count());
        }

        if self.bound_pipeline != Some(protocol.pipeline) {
            backend.bind_program(protocol.pipeline);
            self.bound_pipeline = Some(protocol.pipeline);
        }

        if self.bound_buffers != Some((protocol.pipeline, buffers)) {
            backend.bind_uniform_buffers(protocol.pipeline, &buffers);
            self.bound_buffers = Some((protocol.pipeline, buffers));
        }

        Ok(protocol.pipeline)
    }

    /// Switches the attachment family written by subsequent draws.
    pub fn set_target(&mut self, backend: &mut dyn GraphicsBackend, target: FrameBufferTarget) {
        if target == self.target {
            return;
        }
        self.target = target;
        let count = self.current_target_count();
        self.bind_draw_targets(backend, count);
    }

    /// Re-applies blend and draw targets of the current protocol after the
    /// backend reset them (frame start, framebuffer recreation).
    pub fn restore_bound_state(&mut self, backend: &mut dyn GraphicsBackend) {
        self.bound_targets = None;
        self.bound_blend = None;

        let Some(protocol) = self.current.and_then(|key| self.protocols.get(&key)).copied() else {
            return;
        };
        backend.set_blend_function(protocol.blend.src, protocol.blend.dst);
        self.bound_blend = Some(protocol.blend);
        self.bind_draw_targets(backend, protocol.draw_target_count());
    }

    /// Drops the uniform-buffer memo if it refers to any of `buffers`.
    ///
    /// Must be called before those buffers are released: a backend may hand
    /// the same handles to the next buffers it creates, and those still need
    /// to be bound.
    pub fn forget_buffers(&mut self, buffers: &[BufferHandle]) {
        if self
            .bound_buffers
            .is_some_and(|(_, bound)| bound.iter().any(|b| buffers.contains(b)))
        {
            self.bound_buffers = None;
        }
    }

    /// Destroys every cached program. The cache is empty afterwards.
    pub fn destroy(&mut self, backend: &mut dyn GraphicsBackend) {
        for (_, protocol) in self.protocols.drain() {
            backend.destroy_program(protocol.pipeline);
        }
        log::debug!("Render protocol cache destroyed after {} builds", self.builds);
        self.current = None;
        self.bound_pipeline = None;
        self.bound_buffers = None;
        self.bound_blend = None;
        self.bound_targets = None;
    }

    fn current_target_count(&self) -> u32 {
        self.current
            .and_then(|key| self.protocols.get(&key))
            .map_or(1, RenderProtocol::draw_target_count)
    }

    fn bind_draw_targets(&mut self, backend: &mut dyn GraphicsBackend, count: u32) {
        let wanted = (self.target, count);
        if self.bound_targets != Some(wanted) {
            backend.set_draw_targets(self.target, count);
            self.bound_targets = Some(wanted);
        }
    }
}
