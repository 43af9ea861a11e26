//! Render protocol keys.
//!
//! A render protocol is the compiled program plus blend / target
//! configuration used to draw with one [`Brush`] under one set of
//! [`RenderFeatures`]. The pair forms the [`ProtocolKey`] of the
//! [`ProtocolCache`](super::cache::ProtocolCache). Both halves are closed sets
//! (an enum and an 8-bit flag set), so the key space is bounded.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::errors::{EaselError, Result};

/// Visual effect selecting the fragment stage of a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Brush {
    /// Foreground texture as-is.
    Texture = 0,
    /// Foreground color as-is.
    Color = 1,
    /// Foreground texture masked by the mask texture.
    Mask = 2,
    /// Foreground or background texture depending on whether the mask value
    /// lies in `[data.x, data.y]`.
    ConditionalMask = 3,
    /// Linear blend between foreground and background by `data.x`.
    Blend = 4,
    /// Foreground blended with the background texture as a per-channel alpha
    /// (subpixel text). Never writes the ID target.
    MultiComponentBlend = 5,
}

impl Brush {
    pub const ALL: [Self; 6] = [
        Self::Texture,
        Self::Color,
        Self::Mask,
        Self::ConditionalMask,
        Self::Blend,
        Self::MultiComponentBlend,
    ];

    /// Texture slots sampled by this brush, in sampler declaration order.
    #[must_use]
    pub fn samplers(self) -> &'static [(&'static str, TextureSlot)] {
        match self {
            Self::Color => &[],
            Self::Texture => &[("tex", TextureSlot::Foreground)],
            Self::Mask => &[("tex", TextureSlot::Foreground), ("mask", TextureSlot::Mask)],
            Self::ConditionalMask => &[
                ("tex1", TextureSlot::Foreground),
                ("tex2", TextureSlot::Background),
                ("mask", TextureSlot::Mask),
            ],
            Self::Blend | Self::MultiComponentBlend => &[
                ("tex1", TextureSlot::Foreground),
                ("tex2", TextureSlot::Background),
            ],
        }
    }
}

impl TryFrom<u8> for Brush {
    type Error = EaselError;

    fn try_from(raw: u8) -> Result<Self> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(EaselError::UnsupportedBrush(raw))
    }
}

bitflags! {
    /// Optional effect toggles layered on a brush.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct RenderFeatures: u8 {
        const DISCARD_INVISIBLE   = 0x01;
        const FILTER              = 0x02;
        const TEXTURE             = 0x04;
        const TEXTURE_TRANSFORM   = 0x08;
        const INHERIT_TRANSLATION = 0x10;
        const INHERIT_SCALE       = 0x20;
        const INHERIT_ROTATION    = 0x40;
        const STORE_ID            = 0x80;
    }
}

impl RenderFeatures {
    pub const NONE: Self = Self::empty();

    pub const DEFAULT: Self = Self::FILTER
        .union(Self::TEXTURE)
        .union(Self::TEXTURE_TRANSFORM)
        .union(Self::INHERIT_TRANSLATION)
        .union(Self::INHERIT_SCALE)
        .union(Self::INHERIT_ROTATION)
        .union(Self::STORE_ID);

    /// Preprocessor-style define name for each feature, in bit order.
    #[must_use]
    pub fn define_names(self) -> impl Iterator<Item = &'static str> {
        self.iter_names().map(|(name, _)| name)
    }
}

impl Default for RenderFeatures {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Cache key of a render protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolKey {
    pub brush: Brush,
    pub features: RenderFeatures,
}

impl ProtocolKey {
    #[must_use]
    pub fn new(brush: Brush, features: RenderFeatures) -> Self {
        Self { brush, features }
    }

    /// Packed 16-bit form (`brush << 8 | features`), unique per key.
    #[inline]
    #[must_use]
    pub fn packed(self) -> u16 {
        (u16::from(self.brush as u8) << 8) | u16::from(self.features.bits())
    }
}

/// Blend factors a protocol may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    Src1Color,
    OneMinusSrc1Color,
}

/// Source / destination blend pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendPair {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendPair {
    /// Standard premultiplied-free alpha blending.
    pub const ALPHA: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Dual-source blending for per-channel coverage.
    pub const DUAL_SOURCE: Self = Self {
        src: BlendFactor::Src1Color,
        dst: BlendFactor::OneMinusSrc1Color,
    };
}

impl Default for BlendPair {
    fn default() -> Self {
        Self::ALPHA
    }
}

/// Which family of attachments draw calls write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FrameBufferTarget {
    /// Scene color (+ ID when the protocol is multi-target).
    #[default]
    Color,
    /// Auxiliary data attachment (+ ID when the protocol is multi-target).
    Data,
}

/// Texture unit assignment shared by every brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Foreground = 0,
    Background = 1,
    Mask = 2,
}
