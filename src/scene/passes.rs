//! Tree-wide passes: init, update, destroy, render order and hover.
//!
//! All traversals are iterative (explicit stack) and visit children in
//! sequence order, parents before children.

use std::any::TypeId;

use smallvec::SmallVec;

use crate::errors::{EaselError, Result};
use crate::scene::NodeKey;
use crate::scene::component::{Component, ComponentContext};
use crate::scene::flags::EntityFlags;
use crate::scene::id_registry::EntityId;
use crate::scene::tree::EntityTree;

impl EntityTree {
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.get_property(self.root, EntityFlags::INIT)
    }

    fn ensure_initialized(&self, operation: &str) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(EaselError::InvalidState(format!("{operation} before init")))
        }
    }

    /// Initializes the root and every node already attached below it.
    pub fn init(&mut self) -> Result<()> {
        if self.is_initialized() {
            return Err(EaselError::InvalidState("tree initialized twice".into()));
        }
        self.init_subtree(self.root);
        log::debug!("Entity tree initialized with {} ids", self.registry.live_count());
        Ok(())
    }

    /// Issues ids to, and sets INIT on, every uninitialized node of the subtree.
    pub(crate) fn init_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if !node.is_initialized() {
                let id = self.registry.generate_id(current);
                if let Some(node) = self.nodes.get_mut(current) {
                    node.id = id;
                    node.flags.insert(EntityFlags::INIT | EntityFlags::DIRTY);
                }
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        self.make_dirty(key);
    }

    /// Runs one update pass.
    ///
    /// Disabled nodes are skipped with their subtree. For every other node
    /// the component `update` hooks run first (finished components are
    /// destroyed and detached), then children flagged `DEAD` are removed
    /// and destroyed, then the remaining children are updated.
    pub fn update(&mut self) -> Result<()> {
        self.ensure_initialized("update")?;

        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            if !self.nodes.get(key).is_some_and(|n| !n.flags.contains(EntityFlags::DISABLED)) {
                continue;
            }

            self.run_components(key, |component, ctx| component.update(ctx));

            let dead: SmallVec<[usize; 4]> = self
                .children(key)
                .iter()
                .enumerate()
                .filter(|&(_, &child)| self.get_property(child, EntityFlags::DEAD))
                .map(|(index, _)| index)
                .collect();
            for &index in dead.iter().rev() {
                self.remove_child_at(key, index)?;
            }

            stack.extend(self.children(key).iter().rev().copied());
        }
        Ok(())
    }

    /// Flags `key` for removal on the next update pass.
    pub fn kill(&mut self, key: NodeKey) -> Result<()> {
        if key == self.root {
            return Err(EaselError::InvalidState("the root cannot be killed".into()));
        }
        self.set_property(key, EntityFlags::DEAD, true)
    }

    /// Destroys every node below the root and the root's components.
    ///
    /// The root stays allocated but returns to the uninitialized state.
    pub fn destroy(&mut self) -> Result<()> {
        self.ensure_initialized("destroy")?;

        let root = self.root;
        let children = std::mem::take(&mut self.live_mut(root)?.children);
        for child in children {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
            self.destroy_subtree(child);
        }
        self.destroy_components(root);

        let node = self.live_mut(root)?;
        let id = std::mem::replace(&mut node.id, EntityId::UNASSIGNED);
        node.flags = EntityFlags::DIRTY;
        let drawer = node.painter.as_mut().and_then(|p| p.drawer.take());
        self.registry.delete_id(id);
        self.retired.extend(drawer);

        log::debug!("Entity tree destroyed");
        Ok(())
    }

    /// Destroys a detached subtree: component `destroy` hooks run parents
    /// first, then every node is freed, its id released and its drawer
    /// retired.
    pub(crate) fn destroy_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            self.destroy_components(current);
            stack.extend(self.children(current).iter().rev().copied());
        }

        stack.push(key);
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            self.registry.delete_id(node.id);
            if let Some(drawer) = node.painter.and_then(|p| p.drawer) {
                self.retired.push(drawer);
            }
            if !node.components.is_empty() {
                log::warn!(
                    "{current:?} freed with {} components attached during destroy",
                    node.components.len()
                );
            }
            stack.extend(node.children);
        }
    }

    fn destroy_components(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let components = std::mem::take(&mut node.components);
        for (_, mut component) in components {
            component.destroy(&mut ComponentContext { tree: self, node: key });
        }
    }

    /// Runs `hook` on every component of `key`. Components for which the
    /// hook returns `true` are destroyed and detached.
    ///
    /// Returns the number of components removed.
    pub(crate) fn run_components<F>(&mut self, key: NodeKey, mut hook: F) -> usize
    where
        F: FnMut(&mut dyn Component, &mut ComponentContext<'_>) -> bool,
    {
        let Some(node) = self.nodes.get_mut(key) else {
            return 0;
        };
        if node.components.is_empty() {
            return 0;
        }

        let mut components = std::mem::take(&mut node.components);
        let mut finished: SmallVec<[TypeId; 2]> = SmallVec::new();
        {
            let mut ctx = ComponentContext { tree: self, node: key };
            for (type_id, component) in &mut components {
                if hook(component.as_mut(), &mut ctx) {
                    finished.push(*type_id);
                }
            }
            for type_id in &finished {
                if let Some(mut component) = components.remove(type_id) {
                    component.destroy(&mut ctx);
                }
            }
        }

        let untouched = self.nodes.get(key).is_some_and(|n| n.components.is_empty());
        if untouched {
            if let Some(node) = self.nodes.get_mut(key) {
                node.components = components;
            }
        } else {
            for (type_id, component) in components {
                self.reattach_component(key, type_id, component);
            }
        }
        finished.len()
    }

    /// Nodes to draw this frame, in draw order (pre-order, children in
    /// sequence order). Disabled nodes are skipped with their subtree.
    #[must_use]
    pub fn render_order(&self) -> Vec<NodeKey> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if node.flags.contains(EntityFlags::DISABLED) {
                continue;
            }
            order.push(key);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Runs the component `render` hooks of `key`.
    pub fn render_components(&mut self, key: NodeKey) {
        self.run_components(key, |component, ctx| {
            component.render(ctx);
            false
        });
    }

    /// Marks `key` hovered (without dirtying it) and runs its `hover` hooks.
    pub fn hover(&mut self, key: NodeKey) -> Result<()> {
        self.set_property(key, EntityFlags::HOVERED, true)?;
        self.run_components(key, |component, ctx| {
            component.hover(ctx);
            false
        });
        Ok(())
    }

    /// Clears the hovered bit of `key`. Stale keys are ignored.
    pub fn unhover(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.flags.remove(EntityFlags::HOVERED);
        }
    }
}
