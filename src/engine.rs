//! Engine Core Module
//!
//! [`Engine`] ties an [`EntityTree`], a [`Renderer`] and a backend together
//! and drives them once per frame. It owns no window: the host feeds it
//! pointer positions and resize notifications and calls
//! [`frame`](Engine::frame) from its own loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use easel::{Engine, RecordingBackend, RendererSettings};
//!
//! let mut engine = Engine::new(RendererSettings::default(), RecordingBackend::new());
//! engine.init()?;
//!
//! loop {
//!     engine.set_pointer(Some((x, y)));
//!     let stats = engine.frame()?;
//! }
//! ```

use crate::errors::Result;
use crate::renderer::backend::GraphicsBackend;
use crate::renderer::settings::RendererSettings;
use crate::renderer::{FrameStats, Renderer};
use crate::scene::EntityTree;

/// Per-frame driver: update → render → hover.
///
/// # Lifecycle
///
/// 1. Create with [`Engine::new`]
/// 2. Initialize tree and framebuffer with [`Engine::init`]
/// 3. Call [`Engine::frame`] once per frame
/// 4. Release everything with [`Engine::shutdown`]
pub struct Engine<B: GraphicsBackend> {
    pub tree: EntityTree,
    pub renderer: Renderer,
    pub backend: B,

    pointer: Option<(u32, u32)>,
    frame_count: u64,
}

impl<B: GraphicsBackend> Engine<B> {
    #[must_use]
    pub fn new(settings: RendererSettings, backend: B) -> Self {
        Self {
            tree: EntityTree::new(),
            renderer: Renderer::new(settings),
            backend,
            pointer: None,
            frame_count: 0,
        }
    }

    /// Initializes the tree (issuing ids) and the framebuffer.
    pub fn init(&mut self) -> Result<()> {
        self.tree.init()?;
        self.renderer.init(&mut self.backend)?;
        Ok(())
    }

    /// Returns the total number of frames completed since startup.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Latest pointer position in framebuffer pixels; `None` when the
    /// pointer left the window.
    pub fn set_pointer(&mut self, pointer: Option<(u32, u32)>) {
        self.pointer = pointer;
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.renderer.resize(&mut self.backend, width, height)
    }

    /// Runs one frame.
    ///
    /// Backend-fatal errors are logged and returned; the host is expected to
    /// stop driving the engine after one.
    pub fn frame(&mut self) -> Result<FrameStats> {
        let result = self.run_frame();
        if let Err(e) = &result
            && e.is_backend_fatal()
        {
            log::error!("Frame {} aborted: {e}", self.frame_count);
        }
        result
    }

    fn run_frame(&mut self) -> Result<FrameStats> {
        self.tree.update()?;
        let stats = self.renderer.render_frame(&mut self.tree, &mut self.backend)?;

        if self.renderer.settings().hover_picking {
            match self.pointer {
                Some((x, y)) => {
                    self.renderer.hover_pass(&mut self.tree, &mut self.backend, x, y)?;
                }
                None => self.renderer.clear_hover(&mut self.tree),
            }
        }

        self.frame_count += 1;
        Ok(stats)
    }

    /// Destroys the tree and releases every backend resource.
    pub fn shutdown(&mut self) -> Result<()> {
        self.tree.destroy()?;
        self.renderer.destroy(&mut self.tree, &mut self.backend)?;
        Ok(())
    }
}
