//! Easel: retained-mode 2D scene graph with dirty propagation and
//! render-state caching.
//!
//! - [`scene`]: the entity tree, its components and the dirty/clean protocol
//! - [`renderer`]: protocol cache, per-entity state diffing, backend contract
//! - [`engine`]: per-frame driver tying both to a backend

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod engine;
pub mod errors;
pub mod renderer;
pub mod scene;

pub use engine::Engine;
pub use errors::{EaselError, Result};
pub use renderer::{
    Brush, FrameBufferTarget, FrameStats, GraphicsBackend, PaintState, ProtocolCache,
    RecordingBackend, RenderFeatures, Renderer, RendererSettings,
};
pub use scene::{
    CleanStats, Component, ComponentContext, ComponentState, EntityFlags, EntityId, EntityMut,
    EntityTree, Metrics, NodeKey, Painter, Transform,
};
