//! Component behaviour objects.
//!
//! A component is attached to exactly one node and follows its own
//! lifecycle, independent of the node's:
//!
//! ```text
//! Unattached ──add_component──▶ Initialized ──update() == true──▶ Destroyed
//!                                     │
//!                                     └──── node destroyed ─────▶ Destroyed
//! ```
//!
//! `init` runs once when the component is attached. `update` runs once per
//! update pass; returning `true` destroys and detaches the component right
//! away. There is no external remove operation. `render`, `clean` and
//! `hover` run during the corresponding passes when the owning node is
//! visible, dirty or hovered.
//!
//! Hooks receive a [`ComponentContext`] giving mutable access to the whole
//! tree. While a hook runs, the node's own component set is detached from
//! it, so looking up a sibling component of the same node from inside a
//! hook returns `None`.

use std::any::Any;

use crate::scene::NodeKey;
use crate::scene::tree::EntityTree;

/// Lifecycle stage of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentState {
    #[default]
    Unattached,
    Initialized,
    Destroyed,
}

/// Access handed to component hooks.
pub struct ComponentContext<'a> {
    pub tree: &'a mut EntityTree,
    /// The node the component is attached to.
    pub node: NodeKey,
}

/// Behaviour attached to a node. At most one instance per concrete type.
#[allow(unused_variables)]
pub trait Component: Any {
    fn init(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// Returns `true` when the component is finished and must be removed.
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> bool {
        false
    }

    fn destroy(&mut self, ctx: &mut ComponentContext<'_>) {}

    fn render(&mut self, ctx: &mut ComponentContext<'_>) {}

    fn clean(&mut self, ctx: &mut ComponentContext<'_>) {}

    fn hover(&mut self, ctx: &mut ComponentContext<'_>) {}
}
