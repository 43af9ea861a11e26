//! Renderer Settings
//!
//! Plain configuration consumed by [`Renderer::new`](super::Renderer::new).
//! Every field has a sensible default, so partial JSON documents are accepted:
//!
//! ```rust,ignore
//! use easel::renderer::RendererSettings;
//!
//! let settings = RendererSettings::from_json(r#"{ "hover_picking": false }"#)?;
//! assert_eq!(settings.initial_width, 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::renderer::protocol::RenderFeatures;

/// Configuration for the renderer and its framebuffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Clear color of the scene attachment, in linear RGBA.
    pub clear_color: [f32; 4],

    /// Framebuffer size used by [`Renderer::init`](super::Renderer::init).
    /// Values below 1 are clamped to 1.
    pub initial_width: u32,
    pub initial_height: u32,

    /// Pre-allocated slots in the protocol cache.
    pub protocol_capacity: usize,

    /// Features new paint states start with.
    pub default_features: RenderFeatures,

    /// Run the hover pass after each frame when a pointer position is known.
    pub hover_picking: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            initial_width: 1,
            initial_height: 1,
            protocol_capacity: 16,
            default_features: RenderFeatures::DEFAULT,
            hover_picking: true,
        }
    }
}

impl RendererSettings {
    /// Parses settings from a JSON document. Missing fields take their
    /// default values.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Framebuffer size with both dimensions clamped to at least 1.
    #[inline]
    #[must_use]
    pub fn clamped_size(&self) -> (u32, u32) {
        (self.initial_width.max(1), self.initial_height.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = RendererSettings::from_json(r#"{ "initial_width": 640 }"#).unwrap();
        assert_eq!(settings.initial_width, 640);
        assert_eq!(settings.initial_height, 1);
        assert_eq!(settings.default_features, RenderFeatures::DEFAULT);
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = RendererSettings::from_json("{ nope").unwrap_err();
        assert!(matches!(err, crate::errors::EaselError::Config(_)));
    }

    #[test]
    fn zero_size_is_clamped() {
        let settings = RendererSettings {
            initial_width: 0,
            initial_height: 0,
            ..Default::default()
        };
        assert_eq!(settings.clamped_size(), (1, 1));
    }
}
