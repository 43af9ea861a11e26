use glam::{Mat4, Vec4};

use crate::renderer::protocol::RenderFeatures;
use crate::scene::transform::Transform;

/// Visual parameters of one draw call.
///
/// A [`Drawer`](super::drawer::Drawer) keeps the last submitted state as its
/// snapshot and re-uploads only the fields that differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintState {
    /// Painter-local placement inside the entity.
    pub transformation: Transform,
    /// Brush-specific parameters (blend factor, mask range...).
    pub data: Vec4,

    pub foreground_color: Vec4,
    pub foreground_transform: Vec4,
    pub background_color: Vec4,
    pub background_transform: Vec4,
    pub mask_color: Vec4,
    pub mask_transform: Vec4,

    /// Color filter applied when `RenderFeatures::FILTER` is set.
    pub filter: Mat4,

    pub features: RenderFeatures,
}

impl PaintState {
    /// Texture transform covering the whole texture (`offset = 0`, `scale = 1`).
    pub const FULL_TEXTURE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

    #[must_use]
    pub fn new(features: RenderFeatures) -> Self {
        Self {
            features,
            ..Self::default()
        }
    }

    /// Returns a copy with the foreground color replaced.
    #[must_use]
    pub fn with_foreground_color(mut self, color: Vec4) -> Self {
        self.foreground_color = color;
        self
    }

    /// Returns a copy with `opacity` written to the alpha of the foreground color.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.foreground_color.w = opacity;
        self
    }
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            transformation: Transform::IDENTITY,
            data: Vec4::ZERO,
            foreground_color: Vec4::ZERO,
            foreground_transform: Self::FULL_TEXTURE,
            background_color: Vec4::ZERO,
            background_transform: Self::FULL_TEXTURE,
            mask_color: Vec4::ZERO,
            mask_transform: Self::FULL_TEXTURE,
            filter: Mat4::IDENTITY,
            features: RenderFeatures::DEFAULT,
        }
    }
}
