//! Rendering Module
//!
//! Turns the entity tree into the minimal stream of backend calls.
//!
//! # Frame Flow
//!
//! 1. Release drawers retired by destroyed entities
//! 2. Clean pass: recompute inherited transforms of dirty nodes
//! 3. `begin_frame` and restore the bound blend/target state
//! 4. For every visible node in draw order:
//!    - component `render` hooks
//!    - create the node's [`Drawer`] on first draw
//!    - diff-upload the entity block ([`Drawer::clean`]) and the paint block
//!      ([`Drawer::load_settings`])
//!    - bind the render protocol through the [`ProtocolCache`]
//!    - bind textures and issue the draw
//! 5. `end_frame`
//!
//! Any backend error aborts the frame and is returned to the caller; GPU
//! state is not trusted after a partial pass.
//!
//! # Submodules
//!
//! - [`backend`]: the [`GraphicsBackend`] contract and opaque handles
//! - [`headless`]: a recording, GPU-less backend
//! - [`protocol`] / [`shader_gen`] / [`cache`]: render protocols and their cache
//! - [`paint`] / [`uniforms`] / [`drawer`]: per-entity state diffing
//! - [`settings`]: renderer configuration

pub mod backend;
pub mod cache;
pub mod drawer;
pub mod headless;
pub mod paint;
pub mod protocol;
pub mod settings;
pub mod shader_gen;
pub mod uniforms;

pub use backend::GraphicsBackend;
pub use cache::ProtocolCache;
pub use drawer::Drawer;
pub use headless::RecordingBackend;
pub use paint::PaintState;
pub use protocol::{Brush, FrameBufferTarget, RenderFeatures};
pub use settings::RendererSettings;

use crate::errors::{EaselError, Result};
use crate::scene::{CleanStats, EntityTree, NodeKey, Painter};

/// Counters of one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub clean: CleanStats,
    /// Entities with a painter that were drawn.
    pub drawn: usize,
    /// Partial uniform uploads issued.
    pub uploads: usize,
    /// Drawers of destroyed entities released at frame start.
    pub released_drawers: usize,
}

/// Per-context render state: protocol cache, framebuffer size, target and
/// hover tracking.
pub struct Renderer {
    settings: RendererSettings,
    cache: ProtocolCache,

    size: (u32, u32),
    initialized: bool,
    hovered: Option<NodeKey>,
    frame_count: u64,
}

impl Renderer {
    /// Creates a renderer configuration. Backend resources are not touched
    /// until [`init`](Self::init).
    #[must_use]
    pub fn new(settings: RendererSettings) -> Self {
        let cache = ProtocolCache::with_capacity(settings.protocol_capacity);
        Self {
            settings,
            cache,
            size: (0, 0),
            initialized: false,
            hovered: None,
            frame_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ProtocolCache {
        &self.cache
    }

    /// Framebuffer size as `(width, height)`.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Entity under the pointer after the last hover pass.
    #[inline]
    #[must_use]
    pub fn hovered(&self) -> Option<NodeKey> {
        self.hovered
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// A painter for `brush` using the configured default features.
    #[must_use]
    pub fn painter(&self, brush: Brush) -> Painter {
        Painter::new(brush, self.settings.default_features)
    }

    fn ensure_initialized(&self, operation: &str) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(EaselError::InvalidState(format!("renderer {operation} before init")))
        }
    }

    /// Creates the framebuffer at the configured size.
    pub fn init(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        if self.initialized {
            return Err(EaselError::InvalidState("renderer initialized twice".into()));
        }
        let (width, height) = self.settings.clamped_size();
        backend.recreate_framebuffer(width, height)?;
        log::debug!("Framebuffer created at {width}x{height}");

        self.size = (width, height);
        self.initialized = true;
        log::info!("Renderer initialized ({width}x{height})");
        Ok(())
    }

    /// Recreates the framebuffer at the new size. Dimensions are clamped to
    /// at least 1 (minimized windows report 0). Cached protocols survive.
    pub fn resize(&mut self, backend: &mut dyn GraphicsBackend, width: u32, height: u32) -> Result<()> {
        self.ensure_initialized("resize")?;
        let size = (width.max(1), height.max(1));
        if size == self.size {
            return Ok(());
        }

        backend.recreate_framebuffer(size.0, size.1)?;
        self.cache.restore_bound_state(backend);
        self.size = size;
        log::info!("Renderer resized to {}x{}", size.0, size.1);
        Ok(())
    }

    /// Selects the attachment family written by subsequent draws.
    pub fn set_target(&mut self, backend: &mut dyn GraphicsBackend, target: FrameBufferTarget) {
        self.cache.set_target(backend, target);
    }

    /// Releases the GPU buffers of drawers retired by destroyed entities.
    pub fn release_retired(&mut self, tree: &mut EntityTree, backend: &mut dyn GraphicsBackend) -> usize {
        let retired = tree.take_retired_drawers();
        let count = retired.len();
        for drawer in retired {
            self.cache.forget_buffers(&drawer.buffers());
            drawer.release(backend);
        }
        count
    }

    /// Renders one frame of `tree`.
    pub fn render_frame(
        &mut self,
        tree: &mut EntityTree,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<FrameStats> {
        self.ensure_initialized("render")?;

        let mut stats = FrameStats {
            released_drawers: self.release_retired(tree, backend),
            ..FrameStats::default()
        };
        stats.clean = tree.clean_pass();

        backend.begin_frame(self.settings.clear_color)?;
        self.cache.restore_bound_state(backend);

        for key in tree.render_order() {
            tree.render_components(key);
            if let Some(uploads) = self.draw_entity(tree, backend, key)? {
                stats.drawn += 1;
                stats.uploads += uploads;
            }
        }

        backend.end_frame()?;
        self.frame_count += 1;
        Ok(stats)
    }

    /// Draws one entity. Returns `None` if it has nothing to draw, or the
    /// number of partial uploads issued.
    fn draw_entity(
        &mut self,
        tree: &mut EntityTree,
        backend: &mut dyn GraphicsBackend,
        key: NodeKey,
    ) -> Result<Option<usize>> {
        let Some(node) = tree.node_mut(key) else {
            return Ok(None);
        };
        let metrics = node.metrics();
        let id = node.id;
        let Some(painter) = node.painter.as_mut() else {
            return Ok(None);
        };

        if painter.drawer.is_none() {
            painter.drawer = Some(Drawer::create(backend, id, &metrics, &painter.state)?);
        }
        let Some(drawer) = painter.drawer.as_mut() else {
            return Ok(None);
        };

        let mut uploads = drawer.clean(backend, &metrics, id)?;
        uploads += drawer.load_settings(backend, &painter.state)?;

        let pipeline = self
            .cache
            .bind_protocol(backend, drawer.buffers(), painter.brush, painter.state.features)?;
        for &(slot, texture) in &painter.textures {
            backend.bind_texture(slot, texture);
        }
        backend.issue_draw_call(pipeline, painter.model)?;
        Ok(Some(uploads))
    }

    /// Picks the entity under `(x, y)` from the ID attachment, moves the
    /// hovered bit onto it and runs its `hover` hooks.
    ///
    /// Positions outside the framebuffer clear the hover.
    pub fn hover_pass(
        &mut self,
        tree: &mut EntityTree,
        backend: &mut dyn GraphicsBackend,
        x: u32,
        y: u32,
    ) -> Result<Option<NodeKey>> {
        self.ensure_initialized("hover")?;

        let target = if x < self.size.0 && y < self.size.1 {
            let id = backend.read_entity_id(x, y)?;
            let key = tree.get_entity_by_id(id);
            if key.is_none() && id.is_assigned() {
                log::warn!("ID attachment holds {id:?}, which maps to no live entity");
            }
            key
        } else {
            None
        };

        if let Some(previous) = self.hovered
            && Some(previous) != target
        {
            tree.unhover(previous);
        }
        if let Some(key) = target {
            tree.hover(key)?;
        }
        self.hovered = target;
        Ok(target)
    }

    /// Drops the current hover, e.g. when the pointer left the window.
    pub fn clear_hover(&mut self, tree: &mut EntityTree) {
        if let Some(previous) = self.hovered.take() {
            tree.unhover(previous);
        }
    }

    /// Releases every backend resource held for `tree`: retired drawers,
    /// drawers of live entities, cached programs and the framebuffer.
    pub fn destroy(&mut self, tree: &mut EntityTree, backend: &mut dyn GraphicsBackend) -> Result<()> {
        self.ensure_initialized("destroy")?;

        let mut released = self.release_retired(tree, backend);
        for node in tree.nodes.values_mut() {
            if let Some(drawer) = node.painter.as_mut().and_then(|p| p.drawer.take()) {
                self.cache.forget_buffers(&drawer.buffers());
                drawer.release(backend);
                released += 1;
            }
        }

        self.cache.destroy(backend);
        backend.destroy_framebuffer();

        self.initialized = false;
        self.hovered = None;
        self.size = (0, 0);
        log::info!("Renderer destroyed ({released} drawers released)");
        Ok(())
    }
}
