//! Scene Graph
//!
//! Retained-mode tree of drawable entities:
//! - [`EntityTree`]: arena owning every node, the id registry and the structural operations
//! - [`EntityNode`]: hierarchy links, transform, flags, components and painter of one entity
//! - [`Component`]: attachable behaviour with its own init/update/destroy lifecycle
//! - Dirty propagation and the top-down clean pass (`dirty` module)
//! - Update / render-order / hover / destroy passes (`passes` module)
//!
//! Parent links are plain arena keys. A child never keeps its parent alive,
//! and a stale key simply fails to resolve.

pub mod component;
pub mod dirty;
pub mod flags;
pub mod id_registry;
pub mod node;
pub mod painter;
pub mod passes;
pub mod transform;
pub mod tree;
pub mod wrapper;

pub use component::{Component, ComponentContext, ComponentState};
pub use dirty::CleanStats;
pub use flags::EntityFlags;
pub use id_registry::{EntityId, IdRegistry};
pub use node::EntityNode;
pub use painter::Painter;
pub use transform::{Metrics, Transform};
pub use tree::EntityTree;
pub use wrapper::EntityMut;

use slotmap::new_key_type;

new_key_type! {
    /// Arena key of one [`EntityNode`].
    pub struct NodeKey;
}
