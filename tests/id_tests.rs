//! Entity Id Tests
//!
//! Tests for:
//! - Uniqueness of ids among live nodes
//! - `0` never being issued
//! - Id release on removal and reuse afterwards

use std::collections::HashSet;

use easel::scene::{EntityId, EntityTree, NodeKey};

fn live_keys(tree: &EntityTree) -> Vec<NodeKey> {
    let mut keys = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(key) = stack.pop() {
        keys.push(key);
        stack.extend_from_slice(tree.children(key));
    }
    keys
}

#[test]
fn ids_are_unique_and_never_zero() {
    let mut tree = EntityTree::new();
    tree.init().unwrap();
    let root = tree.root();

    let mut parents = vec![root];
    for _ in 0..4 {
        let mut next = Vec::new();
        for &parent in &parents {
            next.push(tree.create_child(parent).unwrap());
            next.push(tree.create_child(parent).unwrap());
        }
        parents = next;
    }

    let keys = live_keys(&tree);
    let ids: HashSet<EntityId> = keys.iter().map(|&k| tree.entity_id(k)).collect();
    assert_eq!(ids.len(), keys.len());
    assert!(!ids.contains(&EntityId::UNASSIGNED));
    for &key in &keys {
        assert_eq!(tree.get_entity_by_id(tree.entity_id(key)), Some(key));
    }
}

#[test]
fn released_ids_are_reused_without_collision() {
    let mut tree = EntityTree::new();
    tree.init().unwrap();
    let root = tree.root();
    let children: Vec<NodeKey> = (0..5).map(|_| tree.create_child(root).unwrap()).collect();

    let released = tree.entity_id(children[1]);
    tree.remove_child(root, children[1]).unwrap();
    assert_eq!(tree.get_entity_by_id(released), None);

    let fresh = tree.create_child(root).unwrap();
    assert_eq!(tree.entity_id(fresh), released);
    assert_eq!(tree.get_entity_by_id(released), Some(fresh));

    let keys = live_keys(&tree);
    let ids: HashSet<EntityId> = keys.iter().map(|&k| tree.entity_id(k)).collect();
    assert_eq!(ids.len(), keys.len());
}

#[test]
fn unknown_ids_map_to_nothing() {
    let mut tree = EntityTree::new();
    tree.init().unwrap();
    assert_eq!(tree.get_entity_by_id(EntityId::UNASSIGNED), None);
    assert_eq!(tree.get_entity_by_id(EntityId::from_raw(1000)), None);
    assert_eq!(tree.get_entity_by_id(EntityId::from_raw(1)), Some(tree.root()));
}

#[test]
fn detached_nodes_have_no_id() {
    let mut tree = EntityTree::new();
    tree.init().unwrap();
    let loose = tree.create_node();
    assert_eq!(tree.entity_id(loose), EntityId::UNASSIGNED);
    assert_eq!(tree.registry().live_count(), 1);
}
