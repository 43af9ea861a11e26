use std::any::TypeId;

use rustc_hash::FxHashMap;

use crate::scene::NodeKey;
use crate::scene::component::Component;
use crate::scene::flags::EntityFlags;
use crate::scene::id_registry::EntityId;
use crate::scene::painter::Painter;
use crate::scene::transform::{Metrics, Transform};

/// One entity of an [`EntityTree`](super::tree::EntityTree).
///
/// # Hierarchy
///
/// - `parent`: non-owning key of the parent (`None` for the root and for
///   detached nodes)
/// - `children`: owned children, in draw order
///
/// # Placement
///
/// `transform` is the entity's own placement; `inherited` is the cached
/// composition of every ancestor, refreshed by the clean pass whenever
/// `DIRTY` is set.
pub struct EntityNode {
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,

    pub(crate) id: EntityId,
    pub(crate) flags: EntityFlags,

    pub(crate) transform: Transform,
    pub(crate) inherited: Transform,
    /// World placement computed by the last clean of this node.
    pub(crate) last_world: Option<Transform>,

    pub(crate) components: FxHashMap<TypeId, Box<dyn Component>>,
    pub(crate) painter: Option<Painter>,
}

impl EntityNode {
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            id: EntityId::UNASSIGNED,
            flags: EntityFlags::DIRTY,
            transform: Transform::IDENTITY,
            inherited: Transform::IDENTITY,
            last_world: None,
            components: FxHashMap::default(),
            painter: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(EntityFlags::DIRTY)
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.flags.contains(EntityFlags::INIT)
    }

    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    #[must_use]
    pub fn inherited(&self) -> &Transform {
        &self.inherited
    }

    #[inline]
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        Metrics {
            transform: self.transform,
            inherited: self.inherited,
        }
    }

    #[inline]
    #[must_use]
    pub fn painter(&self) -> Option<&Painter> {
        self.painter.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

impl std::fmt::Debug for EntityNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityNode")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("parent", &self.parent)
            .field("children", &self.children.len())
            .field("transform", &self.transform)
            .field("components", &self.components.len())
            .field("painter", &self.painter.as_ref().map(Painter::brush))
            .finish()
    }
}
