//! Dirty Propagation & Clean Pass Tests
//!
//! Tests for:
//! - Dirty marks reaching the root from any node
//! - Clean pass idempotence and skip-clean-subtree instrumentation
//! - Equality short-circuit of every mutator
//! - Sibling order independence of inherited transforms

use easel::renderer::protocol::{Brush, RenderFeatures};
use easel::scene::{EntityFlags, EntityTree, NodeKey, Painter, Transform};
use glam::{Vec3, Vec4};
use std::f32::consts::FRAC_PI_2;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1e-5
}

fn transform_approx(a: &Transform, b: &Transform) -> bool {
    vec3_approx(a.translation, b.translation)
        && vec3_approx(a.rotation, b.rotation)
        && vec3_approx(a.scale, b.scale)
}

/// Root with `width` children, each with `depth` levels of single children.
fn comb(width: usize, depth: usize) -> (EntityTree, Vec<Vec<NodeKey>>) {
    let mut tree = EntityTree::new();
    tree.init().unwrap();
    let root = tree.root();
    let mut columns = Vec::new();
    for _ in 0..width {
        let mut column = Vec::new();
        let mut parent = root;
        for _ in 0..depth {
            parent = tree.create_child(parent).unwrap();
            column.push(parent);
        }
        columns.push(column);
    }
    (tree, columns)
}

fn ancestors(tree: &EntityTree, key: NodeKey) -> Vec<NodeKey> {
    let mut out = Vec::new();
    let mut cursor = tree.parent(key);
    while let Some(k) = cursor {
        out.push(k);
        cursor = tree.parent(k);
    }
    out
}

// ============================================================================
// Dirty reaches root
// ============================================================================

#[test]
fn make_dirty_marks_every_ancestor() {
    let (mut tree, columns) = comb(3, 4);
    tree.clean_pass();

    for column in &columns {
        for &key in column {
            tree.clean_pass();
            tree.make_dirty(key);
            assert!(tree.is_dirty(key));
            for ancestor in ancestors(&tree, key) {
                assert!(tree.is_dirty(ancestor), "{ancestor:?} not dirty");
            }
        }
    }
}

#[test]
fn dirty_flag_set_directly_does_not_block_propagation() {
    let (mut tree, columns) = comb(1, 3);
    let (a, b, c) = (columns[0][0], columns[0][1], columns[0][2]);
    tree.clean_pass();

    tree.set_property(a, EntityFlags::DIRTY, true).unwrap();
    assert!(!tree.is_dirty(tree.root()));

    tree.set_x(b, 5.0).unwrap();
    assert!(tree.is_dirty(tree.root()));

    tree.clean_pass();
    assert!(!tree.is_dirty(tree.root()));
    assert!(vec3_approx(
        tree.node(c).unwrap().inherited().translation,
        Vec3::new(5.0, 0.0, 0.0)
    ));
}

#[test]
fn fresh_tree_is_dirty_everywhere() {
    let (tree, columns) = comb(2, 2);
    assert!(tree.is_dirty(tree.root()));
    for key in columns.iter().flatten() {
        assert!(tree.is_dirty(*key));
    }
}

// ============================================================================
// Clean pass
// ============================================================================

#[test]
fn scenario_set_x_then_clean() {
    let mut tree = EntityTree::new();
    tree.init().unwrap();
    let root = tree.root();
    let a = tree.create_child(root).unwrap();
    assert_eq!(tree.entity_id(a).raw(), 2);
    tree.clean_pass();

    tree.set_x(a, 0.5).unwrap();
    assert!(tree.is_dirty(root));
    assert!(tree.is_dirty(a));

    tree.clean_pass();
    let node = tree.node(a).unwrap();
    assert_eq!(node.inherited().translation, tree.transform(root).unwrap().translation);
    assert!(!tree.is_dirty(a));
    assert!(!tree.is_dirty(root));
}

#[test]
fn clean_is_idempotent() {
    let (mut tree, columns) = comb(3, 3);
    tree.set_x(columns[0][0], 2.0).unwrap();
    tree.rotate(columns[1][1], Vec3::new(0.0, 0.0, FRAC_PI_2)).unwrap();

    tree.clean_pass();
    let first: Vec<Transform> = columns.iter().flatten().map(|&k| *tree.node(k).unwrap().inherited()).collect();
    for key in columns.iter().flatten() {
        assert!(!tree.is_dirty(*key));
    }

    let stats = tree.clean_pass();
    assert_eq!(stats.visited, 0);
    let second: Vec<Transform> = columns.iter().flatten().map(|&k| *tree.node(k).unwrap().inherited()).collect();
    assert_eq!(first, second);
}

#[test]
fn clean_subtrees_are_skipped() {
    let (mut tree, columns) = comb(4, 5);
    tree.clean_pass();

    let leaf = *columns[2].last().unwrap();
    tree.set_y(leaf, 1.0).unwrap();

    let stats = tree.clean_pass();
    // root + the 5 nodes of the touched column
    assert_eq!(stats.visited, 6);
}

#[test]
fn parent_change_recomputes_descendants() {
    let (mut tree, columns) = comb(1, 3);
    tree.clean_pass();
    let [a, b, c] = [columns[0][0], columns[0][1], columns[0][2]];

    tree.set_transformation(
        a,
        Transform::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, FRAC_PI_2), Vec3::splat(2.0)),
    )
    .unwrap();
    tree.set_x(b, 1.0).unwrap();
    tree.clean_pass();

    let b_inherited = *tree.node(b).unwrap().inherited();
    assert!(vec3_approx(b_inherited.translation, Vec3::new(10.0, 0.0, 0.0)));

    let c_inherited = *tree.node(c).unwrap().inherited();
    assert!(vec3_approx(c_inherited.translation, Vec3::new(10.0, 2.0, 0.0)));
    assert!(vec3_approx(c_inherited.scale, Vec3::splat(2.0)));
}

#[test]
fn sibling_order_does_not_change_inherited_transforms() {
    let placements = [
        Transform::new(Vec3::new(1.0, 2.0, 0.0), Vec3::ZERO, Vec3::splat(2.0)),
        Transform::new(Vec3::new(-3.0, 0.5, 0.1), Vec3::new(0.0, 0.0, 0.7), Vec3::ONE),
        Transform::new(Vec3::new(0.0, -1.0, 0.2), Vec3::new(0.0, 0.0, -1.2), Vec3::new(0.5, 3.0, 1.0)),
    ];

    let build = |order: &[usize]| {
        let mut tree = EntityTree::new();
        tree.init().unwrap();
        let root = tree.root();
        tree.set_transformation(root, Transform::from_translation(Vec3::new(5.0, 5.0, 0.0))).unwrap();

        let mut leaves = vec![None; placements.len()];
        for &i in order {
            let sibling = tree.create_child(root).unwrap();
            tree.set_transformation(sibling, placements[i]).unwrap();
            let leaf = tree.create_child(sibling).unwrap();
            tree.set_x(leaf, 1.0).unwrap();
            leaves[i] = Some(leaf);
        }
        tree.clean_pass();
        leaves
            .into_iter()
            .map(|leaf| *tree.node(leaf.unwrap()).unwrap().inherited())
            .collect::<Vec<_>>()
    };

    let reference = build(&[0, 1, 2]);
    for order in [[2, 1, 0], [1, 0, 2], [2, 0, 1]] {
        let permuted = build(&order);
        for (a, b) in reference.iter().zip(&permuted) {
            assert!(transform_approx(a, b), "{a:?} != {b:?}");
        }
    }
}

// ============================================================================
// Equality short-circuit
// ============================================================================

#[test]
fn equal_values_never_dirty() {
    let (mut tree, columns) = comb(1, 1);
    let a = columns[0][0];
    tree.set_painter(a, Painter::new(Brush::Color, RenderFeatures::DEFAULT)).unwrap();
    tree.set_x(a, 3.0).unwrap();
    tree.set_opacity(a, 0.5).unwrap();
    tree.set_property(a, EntityFlags::DISABLED, true).unwrap();
    tree.clean_pass();

    let current = *tree.transform(a).unwrap();
    let state = *tree.painter(a).unwrap().state();

    tree.set_x(a, 3.0).unwrap();
    tree.set_transformation(a, current).unwrap();
    tree.set_width(a, current.scale.x).unwrap();
    tree.translate(a, Vec3::ZERO).unwrap();
    tree.scale(a, Vec3::ONE).unwrap();
    tree.set_opacity(a, 0.5).unwrap();
    tree.set_paint_state(a, state).unwrap();
    tree.set_foreground_color(a, state.foreground_color).unwrap();
    tree.set_brush(a, Brush::Color).unwrap();
    tree.set_property(a, EntityFlags::DISABLED, true).unwrap();

    assert!(!tree.is_dirty(a));
    assert!(!tree.is_dirty(tree.root()));
}

#[test]
fn transient_flags_do_not_dirty() {
    let (mut tree, columns) = comb(1, 1);
    let a = columns[0][0];
    tree.clean_pass();

    tree.set_property(a, EntityFlags::HOVERED, true).unwrap();
    assert!(!tree.is_dirty(a));

    tree.set_property(a, EntityFlags::DIRTY, true).unwrap();
    assert!(tree.is_dirty(a));
    assert!(!tree.is_dirty(tree.root()));
}

#[test]
fn other_flags_dirty_the_path() {
    let (mut tree, columns) = comb(1, 2);
    tree.clean_pass();
    let leaf = columns[0][1];

    tree.set_property(leaf, EntityFlags::DISABLED, true).unwrap();
    assert!(tree.is_dirty(leaf));
    assert!(tree.is_dirty(columns[0][0]));
    assert!(tree.is_dirty(tree.root()));
}

#[test]
fn paint_change_dirties_node() {
    let (mut tree, columns) = comb(1, 1);
    let a = columns[0][0];
    tree.set_painter(a, Painter::new(Brush::Color, RenderFeatures::DEFAULT)).unwrap();
    tree.clean_pass();

    tree.set_foreground_color(a, Vec4::ONE).unwrap();
    assert!(tree.is_dirty(a));
    assert!(tree.is_dirty(tree.root()));
}

#[test]
fn replacing_a_painter_always_dirties() {
    let (mut tree, columns) = comb(1, 1);
    let a = columns[0][0];
    tree.set_painter(a, Painter::new(Brush::Color, RenderFeatures::DEFAULT)).unwrap();
    tree.clean_pass();

    tree.set_painter(a, Painter::new(Brush::Color, RenderFeatures::DEFAULT)).unwrap();
    assert!(tree.is_dirty(a));
    assert!(tree.is_dirty(tree.root()));
}
