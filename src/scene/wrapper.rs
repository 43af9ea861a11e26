//! Chainable entity mutator.
//!
//! [`EntityMut`] borrows an [`EntityTree`] mutably and exposes the tree's
//! mutators as a fluent API bound to one node.
//!
//! All methods silently no-op when the key is stale (or, for paint setters,
//! when the node has no painter), so chains never panic.
//!
//! # Example
//!
//! ```rust,ignore
//! tree.entity(key)
//!     .set_x(0.5)
//!     .set_width(2.0)
//!     .set_opacity(0.8)
//!     .set_enabled(false);
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Vec3, Vec4};

use crate::errors::Result;
use crate::renderer::paint::PaintState;
use crate::renderer::protocol::Brush;
use crate::scene::NodeKey;
use crate::scene::component::Component;
use crate::scene::flags::EntityFlags;
use crate::scene::painter::Painter;
use crate::scene::transform::Transform;
use crate::scene::tree::EntityTree;

/// Temporary mutable borrow of one entity for chainable operations.
pub struct EntityMut<'a> {
    tree: &'a mut EntityTree,
    key: NodeKey,
}

impl<'a> EntityMut<'a> {
    #[inline]
    pub fn new(tree: &'a mut EntityTree, key: NodeKey) -> Self {
        Self { tree, key }
    }

    /// Returns the underlying key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    fn apply(self, op: impl FnOnce(&mut EntityTree, NodeKey) -> Result<()>) -> Self {
        if let Err(e) = op(&mut *self.tree, self.key) {
            log::trace!("EntityMut on {:?} ignored: {e}", self.key);
        }
        self
    }

    // -- Transform --

    pub fn set_x(self, x: f32) -> Self {
        self.apply(|tree, key| tree.set_x(key, x))
    }

    pub fn set_y(self, y: f32) -> Self {
        self.apply(|tree, key| tree.set_y(key, y))
    }

    pub fn set_z(self, z: f32) -> Self {
        self.apply(|tree, key| tree.set_z(key, z))
    }

    pub fn set_width(self, width: f32) -> Self {
        self.apply(|tree, key| tree.set_width(key, width))
    }

    pub fn set_height(self, height: f32) -> Self {
        self.apply(|tree, key| tree.set_height(key, height))
    }

    pub fn set_depth(self, depth: f32) -> Self {
        self.apply(|tree, key| tree.set_depth(key, depth))
    }

    pub fn translate(self, delta: Vec3) -> Self {
        self.apply(|tree, key| tree.translate(key, delta))
    }

    pub fn rotate(self, delta: Vec3) -> Self {
        self.apply(|tree, key| tree.rotate(key, delta))
    }

    pub fn scale(self, factor: Vec3) -> Self {
        self.apply(|tree, key| tree.scale(key, factor))
    }

    pub fn set_transformation(self, transform: Transform) -> Self {
        self.apply(|tree, key| tree.set_transformation(key, transform))
    }

    // -- Paint --

    pub fn with_painter(self, painter: Painter) -> Self {
        self.apply(|tree, key| tree.set_painter(key, painter))
    }

    pub fn set_brush(self, brush: Brush) -> Self {
        self.apply(|tree, key| tree.set_brush(key, brush))
    }

    pub fn set_paint_state(self, state: PaintState) -> Self {
        self.apply(|tree, key| tree.set_paint_state(key, state))
    }

    pub fn set_foreground_color(self, color: Vec4) -> Self {
        self.apply(|tree, key| tree.set_foreground_color(key, color))
    }

    pub fn set_opacity(self, opacity: f32) -> Self {
        self.apply(|tree, key| tree.set_opacity(key, opacity))
    }

    // -- State --

    /// Enables or disables update and rendering of the subtree.
    pub fn set_enabled(self, enabled: bool) -> Self {
        self.apply(|tree, key| tree.set_property(key, EntityFlags::DISABLED, !enabled))
    }

    pub fn kill(self) -> Self {
        self.apply(EntityTree::kill)
    }

    pub fn with_component<T: Component>(self, component: T) -> Self {
        self.apply(|tree, key| tree.add_component(key, component))
    }
}
