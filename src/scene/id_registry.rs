//! Entity identifier registry.
//!
//! Every initialized node of an [`EntityTree`](super::tree::EntityTree)
//! carries an [`EntityId`] issued here. Ids are small positive integers so a
//! backend can write them into an integer ID target and read them back for
//! picking. Released ids are recycled through a free list; no two live nodes
//! ever share an id and `0` is never issued.

use std::fmt;

use crate::scene::NodeKey;

/// Identifier of an entity within one tree. `0` means "unassigned".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    /// Sentinel carried by nodes that were never initialized.
    pub const UNASSIGNED: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// Issues and recycles [`EntityId`]s, and maps them back to nodes.
#[derive(Debug, Default)]
pub struct IdRegistry {
    /// `slots[id - 1]` is the node currently holding `id`.
    slots: Vec<Option<NodeKey>>,
    free: Vec<u32>,
}

impl IdRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues an unused id for `node`. Amortized O(1).
    #[must_use]
    pub fn generate_id(&mut self, node: NodeKey) -> EntityId {
        if let Some(raw) = self.free.pop() {
            self.slots[raw as usize - 1] = Some(node);
            return EntityId(raw);
        }
        self.slots.push(Some(node));
        EntityId(self.slots.len() as u32)
    }

    /// Releases `id` for reuse. Unmapped ids are ignored.
    pub fn delete_id(&mut self, id: EntityId) {
        if !id.is_assigned() {
            return;
        }
        if let Some(slot) = self.slots.get_mut(id.0 as usize - 1)
            && slot.take().is_some()
        {
            self.free.push(id.0);
        }
    }

    /// Looks up the node holding `id`.
    #[must_use]
    pub fn get_entity_by_id(&self, id: EntityId) -> Option<NodeKey> {
        if !id.is_assigned() {
            return None;
        }
        self.slots.get(id.0 as usize - 1).copied().flatten()
    }

    /// Number of ids currently mapped.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn ids_are_positive_and_recycled() {
        let mut keys: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());

        let mut registry = IdRegistry::new();
        let id_a = registry.generate_id(a);
        let id_b = registry.generate_id(b);
        assert_eq!(id_a.raw(), 1);
        assert_eq!(id_b.raw(), 2);

        registry.delete_id(id_a);
        registry.delete_id(id_a);
        assert_eq!(registry.get_entity_by_id(id_a), None);
        assert_eq!(registry.live_count(), 1);

        let reused = registry.generate_id(a);
        assert_eq!(reused, id_a);
        assert_eq!(registry.get_entity_by_id(reused), Some(a));
        assert_eq!(registry.get_entity_by_id(EntityId::UNASSIGNED), None);
        assert_eq!(registry.get_entity_by_id(EntityId::from_raw(99)), None);
    }
}
