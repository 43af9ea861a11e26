//! Dirty propagation and the clean pass.
//!
//! A single `DIRTY` bit per node drives recomputation of cached placement:
//!
//! - [`EntityTree::make_dirty`] sets the bit on a node and on every ancestor
//!   up to and including the root. The walk never stops at an ancestor that
//!   is already dirty: `set_property(DIRTY)` marks a single node, so a dirty
//!   node does not imply a dirty path above it. Invariant: a clean node has
//!   no dirty descendants.
//! - [`EntityTree::clean_pass`] walks top-down from the root with an explicit
//!   stack and only descends into dirty children. A clean child is skipped
//!   together with its whole subtree, so the cost is bounded by the changed
//!   nodes plus their ancestor chains.
//!
//! For each visited node the pass sets `inherited = parent.inherited ∘
//! parent.transform` (identity for the root), clears `DIRTY` before touching
//! the children, and runs the component `clean` hooks. When the node's world
//! placement differs from the one computed at its previous clean, its direct
//! children are flagged as well, since their inherited transform is now
//! stale.

use smallvec::SmallVec;

use crate::scene::NodeKey;
use crate::scene::flags::EntityFlags;
use crate::scene::transform::Transform;
use crate::scene::tree::EntityTree;

/// Instrumentation returned by [`EntityTree::clean_pass`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Nodes whose inherited transform was recomputed.
    pub visited: usize,
    /// Visited nodes whose world placement changed.
    pub world_changed: usize,
}

impl EntityTree {
    /// Marks `key` dirty and propagates the mark toward the root.
    ///
    /// Stale keys are ignored.
    pub fn make_dirty(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        node.flags.insert(EntityFlags::DIRTY);

        let mut cursor = node.parent;
        while let Some(ancestor) = cursor {
            let Some(node) = self.nodes.get_mut(ancestor) else {
                break;
            };
            node.flags.insert(EntityFlags::DIRTY);
            cursor = node.parent;
        }
    }

    #[must_use]
    pub fn is_dirty(&self, key: NodeKey) -> bool {
        self.get_property(key, EntityFlags::DIRTY)
    }

    /// Recomputes inherited transforms of every dirty node, top-down.
    pub fn clean_pass(&mut self) -> CleanStats {
        let mut stats = CleanStats::default();
        if !self.is_dirty(self.root) {
            return stats;
        }

        let mut stack: Vec<NodeKey> = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(key) = stack.pop() {
            let inherited = match self.parent(key).and_then(|p| self.nodes.get(p)) {
                Some(parent) => parent.inherited.compose(&parent.transform),
                None => Transform::IDENTITY,
            };

            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            if !node.flags.contains(EntityFlags::DIRTY) {
                continue;
            }

            node.inherited = inherited;
            node.flags.remove(EntityFlags::DIRTY);
            stats.visited += 1;

            let world = node.inherited.compose(&node.transform);
            if node.last_world != Some(world) {
                node.last_world = Some(world);
                stats.world_changed += 1;

                let children: SmallVec<[NodeKey; 8]> = node.children.iter().copied().collect();
                for child in children {
                    if let Some(child_node) = self.nodes.get_mut(child) {
                        child_node.flags.insert(EntityFlags::DIRTY);
                    }
                }
            }

            log::trace!("Cleaned {key:?} (inherited translation {:?})", inherited.translation);

            self.run_components(key, |component, ctx| {
                component.clean(ctx);
                false
            });

            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            for &child in node.children.iter().rev() {
                if self.nodes.get(child).is_some_and(|c| c.flags.contains(EntityFlags::DIRTY)) {
                    stack.push(child);
                }
            }
        }

        stats
    }
}
