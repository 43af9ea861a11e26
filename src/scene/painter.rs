use smallvec::SmallVec;

use crate::renderer::backend::{TextureHandle, VertexSource};
use crate::renderer::drawer::Drawer;
use crate::renderer::paint::PaintState;
use crate::renderer::protocol::{Brush, RenderFeatures, TextureSlot};

/// Drawable part of an entity.
///
/// Holds what the renderer needs to draw the node (brush, paint state,
/// vertex source, textures) and the node's [`Drawer`], which is created
/// lazily on the first frame the node is drawn and owned by the node from
/// then on.
#[derive(Debug)]
pub struct Painter {
    pub(crate) brush: Brush,
    pub(crate) state: PaintState,
    pub(crate) model: VertexSource,
    pub(crate) textures: SmallVec<[(TextureSlot, TextureHandle); 3]>,
    pub(crate) drawer: Option<Drawer>,
}

impl Painter {
    #[must_use]
    pub fn new(brush: Brush, features: RenderFeatures) -> Self {
        Self {
            brush,
            state: PaintState::new(features),
            model: VertexSource::QUAD,
            textures: SmallVec::new(),
            drawer: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: PaintState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: VertexSource) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_texture(mut self, slot: TextureSlot, texture: TextureHandle) -> Self {
        self.set_texture(slot, texture);
        self
    }

    #[inline]
    #[must_use]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &PaintState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> VertexSource {
        self.model
    }

    #[must_use]
    pub fn textures(&self) -> &[(TextureSlot, TextureHandle)] {
        &self.textures
    }

    /// Whether the GPU side of this painter has been created.
    #[inline]
    #[must_use]
    pub fn drawer(&self) -> Option<&Drawer> {
        self.drawer.as_ref()
    }

    /// Binds `texture` to `slot`, replacing any texture already there.
    /// Returns `false` if the slot already held this texture.
    pub(crate) fn set_texture(&mut self, slot: TextureSlot, texture: TextureHandle) -> bool {
        match self.textures.iter_mut().find(|(s, _)| *s == slot) {
            Some((_, current)) if *current == texture => false,
            Some((_, current)) => {
                *current = texture;
                true
            }
            None => {
                self.textures.push((slot, texture));
                true
            }
        }
    }
}
