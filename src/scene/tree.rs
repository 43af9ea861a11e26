//! Entity tree.
//!
//! [`EntityTree`] owns every node in a slotmap arena. Nodes refer to each
//! other by [`NodeKey`]: a parent owns its children (removing a child
//! destroys it), while the child's `parent` key is only an observer.
//!
//! # Error mapping
//!
//! | Situation                                        | Error            |
//! |--------------------------------------------------|------------------|
//! | key does not resolve to a live node              | `NullReference`  |
//! | child index past the end                         | `OutOfRange`     |
//! | child / painter not present                      | `NotFound`       |
//! | attaching the root, a parented node or an ancestor | `InvalidState` |
//! | second component of the same type                | `InvalidState`   |
//!
//! Every transform and paint mutator compares the new value against the
//! current one first and does nothing (in particular, does not mark the node
//! dirty) when they are equal.

use std::any::{Any, TypeId};

use glam::{Vec3, Vec4};
use slotmap::SlotMap;

use crate::errors::{EaselError, Result};
use crate::renderer::backend::TextureHandle;
use crate::renderer::drawer::Drawer;
use crate::renderer::paint::PaintState;
use crate::renderer::protocol::{Brush, TextureSlot};
use crate::scene::NodeKey;
use crate::scene::component::{Component, ComponentContext};
use crate::scene::flags::EntityFlags;
use crate::scene::id_registry::{EntityId, IdRegistry};
use crate::scene::node::EntityNode;
use crate::scene::painter::Painter;
use crate::scene::transform::{Metrics, Transform};
use crate::scene::wrapper::EntityMut;

/// Arena-backed tree of entities with a single root.
pub struct EntityTree {
    pub(crate) nodes: SlotMap<NodeKey, EntityNode>,
    pub(crate) root: NodeKey,
    pub(crate) registry: IdRegistry,
    /// Drawers of destroyed nodes, waiting for the renderer to release them.
    pub(crate) retired: Vec<Drawer>,
}

impl Default for EntityTree {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityTree {
    /// Creates a tree holding only an uninitialized root.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(EntityNode::new());
        Self {
            nodes,
            root,
            registry: IdRegistry::new(),
            retired: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Creates a detached node. It has no parent and no id until it is
    /// attached below an initialized node.
    pub fn create_node(&mut self) -> NodeKey {
        self.nodes.insert(EntityNode::new())
    }

    /// Creates a node and attaches it as the last child of `parent`.
    pub fn create_child(&mut self, parent: NodeKey) -> Result<NodeKey> {
        self.live(parent)?;
        let child = self.create_node();
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Number of nodes in the arena, detached ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&EntityNode> {
        self.nodes.get(key)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Option<&mut EntityNode> {
        self.nodes.get_mut(key)
    }

    pub(crate) fn live(&self, key: NodeKey) -> Result<&EntityNode> {
        self.nodes
            .get(key)
            .ok_or_else(|| EaselError::NullReference(format!("{key:?} is not a live node")))
    }

    pub(crate) fn live_mut(&mut self, key: NodeKey) -> Result<&mut EntityNode> {
        self.nodes
            .get_mut(key)
            .ok_or_else(|| EaselError::NullReference(format!("{key:?} is not a live node")))
    }

    /// Chainable mutator wrapper for `key`.
    pub fn entity(&mut self, key: NodeKey) -> EntityMut<'_> {
        EntityMut::new(self, key)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Children of `key`, empty for a stale key.
    #[must_use]
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    pub fn child_at(&self, parent: NodeKey, index: usize) -> Result<NodeKey> {
        let node = self.live(parent)?;
        node.children
            .get(index)
            .copied()
            .ok_or(EaselError::OutOfRange {
                index,
                len: node.children.len(),
            })
    }

    /// Position of `child` among the children of `parent`.
    #[must_use]
    pub fn index_of(&self, parent: NodeKey, child: NodeKey) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    #[must_use]
    pub fn has_child(&self, parent: NodeKey, child: NodeKey) -> bool {
        self.index_of(parent, child).is_some()
    }

    /// Whether `ancestor` is `key` itself or lies on its parent chain.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut cursor = Some(key);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Appends `child` to the children of `parent`.
    ///
    /// Marks `parent` dirty. If `parent` is already initialized, the child
    /// subtree is initialized (ids issued) before returning.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.live(parent)?;
        let child_node = self.live(child)?;

        if child == self.root {
            return Err(EaselError::InvalidState("the root cannot become a child".into()));
        }
        if child_node.parent.is_some() {
            return Err(EaselError::InvalidState(format!("{child:?} already has a parent")));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(EaselError::InvalidState(format!(
                "attaching {child:?} under {parent:?} would create a cycle"
            )));
        }

        let child_initialized = child_node.is_initialized();
        let parent_node = self.live_mut(parent)?;
        parent_node.children.push(child);
        let parent_initialized = parent_node.is_initialized();
        self.live_mut(child)?.parent = Some(parent);

        self.make_dirty(parent);
        self.make_dirty(child);

        if parent_initialized && !child_initialized {
            self.init_subtree(child);
        }
        Ok(())
    }

    /// Removes and destroys the child at `index`.
    pub fn remove_child_at(&mut self, parent: NodeKey, index: usize) -> Result<()> {
        let node = self.live_mut(parent)?;
        if index >= node.children.len() {
            return Err(EaselError::OutOfRange {
                index,
                len: node.children.len(),
            });
        }
        let child = node.children.remove(index);
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }

        self.make_dirty(parent);
        self.destroy_subtree(child);
        Ok(())
    }

    /// Removes and destroys `child`.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.live(parent)?;
        let index = self
            .index_of(parent, child)
            .ok_or_else(|| EaselError::NotFound(format!("{child:?} is not a child of {parent:?}")))?;
        self.remove_child_at(parent, index)
    }

    /// Removes and destroys every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeKey) -> Result<()> {
        let children = std::mem::take(&mut self.live_mut(parent)?.children);
        self.make_dirty(parent);
        for child in children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
            self.destroy_subtree(child);
        }
        Ok(())
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Id of `key`; [`EntityId::UNASSIGNED`] for uninitialized or stale nodes.
    #[must_use]
    pub fn entity_id(&self, key: NodeKey) -> EntityId {
        self.nodes.get(key).map_or(EntityId::UNASSIGNED, |n| n.id)
    }

    #[must_use]
    pub fn get_entity_by_id(&self, id: EntityId) -> Option<NodeKey> {
        self.registry.get_entity_by_id(id)
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    // ========================================================================
    // Flags
    // ========================================================================

    /// Whether every bit of `flag` is set on `key`. `false` for stale keys.
    #[must_use]
    pub fn get_property(&self, key: NodeKey, flag: EntityFlags) -> bool {
        self.nodes.get(key).is_some_and(|n| n.flags.contains(flag))
    }

    /// Sets or clears `flag` on `key`.
    ///
    /// Changing any bit other than `DIRTY` or `HOVERED` marks the node dirty.
    /// `INIT` is owned by the lifecycle and cannot be set from outside.
    pub fn set_property(&mut self, key: NodeKey, flag: EntityFlags, value: bool) -> Result<()> {
        if flag.intersects(EntityFlags::INIT) {
            return Err(EaselError::InvalidState("INIT is managed by init/destroy".into()));
        }
        let node = self.live_mut(key)?;
        let unchanged = if value {
            node.flags.contains(flag)
        } else {
            !node.flags.intersects(flag)
        };
        if unchanged {
            return Ok(());
        }
        node.flags.set(flag, value);
        if EntityFlags::dirties_on_change(flag) {
            self.make_dirty(key);
        }
        Ok(())
    }

    // ========================================================================
    // Transform
    // ========================================================================

    #[must_use]
    pub fn transform(&self, key: NodeKey) -> Option<&Transform> {
        self.nodes.get(key).map(|n| &n.transform)
    }

    #[must_use]
    pub fn metrics(&self, key: NodeKey) -> Option<Metrics> {
        self.nodes.get(key).map(EntityNode::metrics)
    }

    fn mutate_transform(&mut self, key: NodeKey, f: impl FnOnce(&mut Transform)) -> Result<()> {
        let node = self.live_mut(key)?;
        let mut next = node.transform;
        f(&mut next);
        if next == node.transform {
            return Ok(());
        }
        node.transform = next;
        self.make_dirty(key);
        Ok(())
    }

    pub fn set_transformation(&mut self, key: NodeKey, transform: Transform) -> Result<()> {
        self.mutate_transform(key, |t| *t = transform)
    }

    pub fn set_x(&mut self, key: NodeKey, x: f32) -> Result<()> {
        self.mutate_transform(key, |t| t.translation.x = x)
    }

    pub fn set_y(&mut self, key: NodeKey, y: f32) -> Result<()> {
        self.mutate_transform(key, |t| t.translation.y = y)
    }

    /// Sets the depth used for draw ordering.
    pub fn set_z(&mut self, key: NodeKey, z: f32) -> Result<()> {
        self.mutate_transform(key, |t| t.translation.z = z)
    }

    pub fn set_width(&mut self, key: NodeKey, width: f32) -> Result<()> {
        self.mutate_transform(key, |t| t.scale.x = width)
    }

    pub fn set_height(&mut self, key: NodeKey, height: f32) -> Result<()> {
        self.mutate_transform(key, |t| t.scale.y = height)
    }

    pub fn set_depth(&mut self, key: NodeKey, depth: f32) -> Result<()> {
        self.mutate_transform(key, |t| t.scale.z = depth)
    }

    pub fn translate(&mut self, key: NodeKey, delta: Vec3) -> Result<()> {
        self.mutate_transform(key, |t| t.translate(delta))
    }

    pub fn rotate(&mut self, key: NodeKey, delta: Vec3) -> Result<()> {
        self.mutate_transform(key, |t| t.rotate(delta))
    }

    pub fn scale(&mut self, key: NodeKey, factor: Vec3) -> Result<()> {
        self.mutate_transform(key, |t| t.scale_by(factor))
    }

    // ========================================================================
    // Painter
    // ========================================================================

    #[must_use]
    pub fn painter(&self, key: NodeKey) -> Option<&Painter> {
        self.nodes.get(key).and_then(|n| n.painter.as_ref())
    }

    /// Installs the painter of `key`, retiring the drawer of any previous one.
    ///
    /// Always marks the node dirty: the painter is replaced, not compared.
    pub fn set_painter(&mut self, key: NodeKey, painter: Painter) -> Result<()> {
        let node = self.live_mut(key)?;
        if let Some(drawer) = node.painter.replace(painter).and_then(|old| old.drawer) {
            self.retired.push(drawer);
        }
        self.make_dirty(key);
        Ok(())
    }

    fn painter_mut(&mut self, key: NodeKey) -> Result<&mut Painter> {
        self.live_mut(key)?
            .painter
            .as_mut()
            .ok_or_else(|| EaselError::NotFound(format!("{key:?} has no painter")))
    }

    /// Applies `f` to a copy of the paint state and stores it if it changed.
    pub fn update_paint(&mut self, key: NodeKey, f: impl FnOnce(&mut PaintState)) -> Result<()> {
        let painter = self.painter_mut(key)?;
        let mut next = painter.state;
        f(&mut next);
        if next == painter.state {
            return Ok(());
        }
        painter.state = next;
        self.make_dirty(key);
        Ok(())
    }

    pub fn set_paint_state(&mut self, key: NodeKey, state: PaintState) -> Result<()> {
        self.update_paint(key, |s| *s = state)
    }

    pub fn set_foreground_color(&mut self, key: NodeKey, color: Vec4) -> Result<()> {
        self.update_paint(key, |s| s.foreground_color = color)
    }

    pub fn set_opacity(&mut self, key: NodeKey, opacity: f32) -> Result<()> {
        self.update_paint(key, |s| s.foreground_color.w = opacity)
    }

    pub fn set_brush(&mut self, key: NodeKey, brush: Brush) -> Result<()> {
        let painter = self.painter_mut(key)?;
        if painter.brush == brush {
            return Ok(());
        }
        painter.brush = brush;
        self.make_dirty(key);
        Ok(())
    }

    pub fn set_texture(&mut self, key: NodeKey, slot: TextureSlot, texture: TextureHandle) -> Result<()> {
        if self.painter_mut(key)?.set_texture(slot, texture) {
            self.make_dirty(key);
        }
        Ok(())
    }

    /// Drains drawers of destroyed nodes. Their GPU buffers must be released
    /// on the backend that created them.
    pub fn take_retired_drawers(&mut self) -> Vec<Drawer> {
        std::mem::take(&mut self.retired)
    }

    #[must_use]
    pub fn retired_drawer_count(&self) -> usize {
        self.retired.len()
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches `component` to `key` and runs its `init` hook.
    pub fn add_component<T: Component>(&mut self, key: NodeKey, component: T) -> Result<()> {
        let type_id = TypeId::of::<T>();
        if self.live(key)?.components.contains_key(&type_id) {
            return Err(EaselError::InvalidState(format!(
                "{key:?} already has a {}",
                std::any::type_name::<T>()
            )));
        }

        let mut component: Box<dyn Component> = Box::new(component);
        component.init(&mut ComponentContext { tree: self, node: key });
        self.reattach_component(key, type_id, component);
        Ok(())
    }

    #[must_use]
    pub fn has_component<T: Component>(&self, key: NodeKey) -> bool {
        self.nodes
            .get(key)
            .is_some_and(|n| n.components.contains_key(&TypeId::of::<T>()))
    }

    #[must_use]
    pub fn get_component<T: Component>(&self, key: NodeKey) -> Option<&T> {
        let component = self.nodes.get(key)?.components.get(&TypeId::of::<T>())?;
        (component.as_ref() as &dyn Any).downcast_ref::<T>()
    }

    pub fn get_component_mut<T: Component>(&mut self, key: NodeKey) -> Option<&mut T> {
        let component = self.nodes.get_mut(key)?.components.get_mut(&TypeId::of::<T>())?;
        (component.as_mut() as &mut dyn Any).downcast_mut::<T>()
    }

    /// Puts a component back on its node after a hook ran with it detached.
    ///
    /// If the node died in the meantime the component is destroyed; if a
    /// component of the same type was attached in the meantime, the newcomer
    /// is kept out and destroyed.
    pub(crate) fn reattach_component(&mut self, key: NodeKey, type_id: TypeId, mut component: Box<dyn Component>) {
        match self.nodes.get(key).map(|n| n.components.contains_key(&type_id)) {
            Some(false) => {
                if let Some(node) = self.nodes.get_mut(key) {
                    node.components.insert(type_id, component);
                }
            }
            Some(true) => {
                log::warn!("Duplicate component attached to {key:?} during a hook; destroying it");
                component.destroy(&mut ComponentContext { tree: self, node: key });
            }
            None => {
                component.destroy(&mut ComponentContext { tree: self, node: key });
            }
        }
    }
}

impl std::fmt::Debug for EntityTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityTree")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("live_ids", &self.registry.live_count())
            .field("retired", &self.retired.len())
            .finish()
    }
}
