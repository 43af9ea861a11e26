//! Drawer Diffing Tests
//!
//! Tests for:
//! - Minimal partial uploads (one changed field → one upload at its range)
//! - The equal-state short-circuit
//! - Feature-gated fields: skipped while off, uploaded once back on
//! - Entity block diffing and buffer release

use std::mem::offset_of;

use easel::renderer::headless::BackendCall;
use easel::renderer::paint::PaintState;
use easel::renderer::protocol::RenderFeatures;
use easel::renderer::uniforms::{EntityUniforms, PaintUniforms};
use easel::renderer::{Drawer, RecordingBackend};
use easel::scene::{EntityId, Metrics, Transform};
use glam::{Mat4, Vec3, Vec4};

const VEC3: usize = 12;
const VEC4: usize = 16;

fn drawer_with(state: &PaintState) -> (RecordingBackend, Drawer) {
    let mut backend = RecordingBackend::new();
    let drawer = Drawer::create(&mut backend, EntityId::from_raw(1), &Metrics::default(), state).unwrap();
    backend.clear_calls();
    (backend, drawer)
}

// ============================================================================
// Paint block
// ============================================================================

#[test]
fn one_changed_field_is_one_upload() {
    let state = PaintState::default();
    let (mut backend, mut drawer) = drawer_with(&state);
    let paint_buffer = drawer.buffers()[1];

    let next = state.with_foreground_color(Vec4::new(1.0, 0.5, 0.0, 1.0));
    let uploads = drawer.load_settings(&mut backend, &next).unwrap();

    assert_eq!(uploads, 1);
    assert_eq!(
        backend.uploads_to(paint_buffer),
        vec![(offset_of!(PaintUniforms, foreground_color), VEC4)]
    );
    assert_eq!(drawer.saved_state(), &next);
}

#[test]
fn uploaded_bytes_match_the_packed_block() {
    let state = PaintState::default();
    let (mut backend, mut drawer) = drawer_with(&state);
    let paint_buffer = drawer.buffers()[1];

    let mut next = state.with_opacity(0.75);
    next.data = Vec4::new(0.2, 0.8, 0.0, 0.0);
    drawer.load_settings(&mut backend, &next).unwrap();

    let expected = PaintUniforms::pack(&next);
    assert_eq!(backend.buffer_contents(paint_buffer).unwrap(), bytemuck::bytes_of(&expected));
    assert_eq!(backend.upload_count(), 2);
}

#[test]
fn equal_state_issues_nothing() {
    let state = PaintState::default().with_opacity(0.3);
    let (mut backend, mut drawer) = drawer_with(&state);

    assert_eq!(drawer.load_settings(&mut backend, &state).unwrap(), 0);
    assert!(backend.calls().is_empty());
}

#[test]
fn painter_transform_touches_only_changed_components() {
    let state = PaintState::default();
    let (mut backend, mut drawer) = drawer_with(&state);
    let paint_buffer = drawer.buffers()[1];

    let mut next = state;
    next.transformation = Transform::from_translation(Vec3::new(4.0, 0.0, 0.0));
    drawer.load_settings(&mut backend, &next).unwrap();

    assert_eq!(
        backend.uploads_to(paint_buffer),
        vec![(offset_of!(PaintUniforms, translation), VEC3)]
    );
}

#[test]
fn gated_fields_are_skipped_while_feature_is_off() {
    let state = PaintState::new(RenderFeatures::DEFAULT.difference(RenderFeatures::FILTER));
    let (mut backend, mut drawer) = drawer_with(&state);

    let mut next = state;
    next.filter = Mat4::from_scale(Vec3::splat(0.5));
    assert_eq!(drawer.load_settings(&mut backend, &next).unwrap(), 0);
    assert_eq!(backend.upload_count(), 0);
}

#[test]
fn gated_field_is_uploaded_once_feature_returns() {
    let state = PaintState::new(RenderFeatures::DEFAULT.difference(RenderFeatures::FILTER));
    let (mut backend, mut drawer) = drawer_with(&state);
    let paint_buffer = drawer.buffers()[1];

    let mut filtered = state;
    filtered.filter = Mat4::from_scale(Vec3::splat(0.5));
    drawer.load_settings(&mut backend, &filtered).unwrap();

    let mut enabled = filtered;
    enabled.features = RenderFeatures::DEFAULT;
    let uploads = drawer.load_settings(&mut backend, &enabled).unwrap();

    assert_eq!(uploads, 1);
    assert_eq!(
        backend.uploads_to(paint_buffer),
        vec![(offset_of!(PaintUniforms, filter), 64)]
    );
    let expected = PaintUniforms::pack(&enabled);
    assert_eq!(backend.buffer_contents(paint_buffer).unwrap(), bytemuck::bytes_of(&expected));
}

#[test]
fn texture_transforms_follow_their_gate() {
    let state = PaintState::new(RenderFeatures::NONE);
    let (mut backend, mut drawer) = drawer_with(&state);

    let mut next = state;
    next.foreground_transform = Vec4::new(0.5, 0.5, 0.5, 0.5);
    next.mask_transform = Vec4::new(0.0, 0.0, 2.0, 2.0);
    assert_eq!(drawer.load_settings(&mut backend, &next).unwrap(), 0);

    next.features = RenderFeatures::TEXTURE_TRANSFORM;
    assert_eq!(drawer.load_settings(&mut backend, &next).unwrap(), 2);
}

// ============================================================================
// Entity block
// ============================================================================

#[test]
fn entity_block_uploads_changed_transform_fields() {
    let (mut backend, mut drawer) = drawer_with(&PaintState::default());
    let entity_buffer = drawer.buffers()[0];
    let id = EntityId::from_raw(1);

    let mut metrics = Metrics::default();
    metrics.transform.translation.x = 0.5;
    assert_eq!(drawer.clean(&mut backend, &metrics, id).unwrap(), 1);
    assert_eq!(
        backend.uploads_to(entity_buffer),
        vec![(offset_of!(EntityUniforms, translation), VEC3)]
    );

    backend.clear_calls();
    assert_eq!(drawer.clean(&mut backend, &metrics, id).unwrap(), 0);
    assert!(backend.calls().is_empty());

    metrics.inherited.scale = Vec3::splat(2.0);
    metrics.inherited.rotation.z = 1.0;
    assert_eq!(drawer.clean(&mut backend, &metrics, id).unwrap(), 2);
    assert_eq!(drawer.saved_metrics(), &metrics);
}

#[test]
fn entity_block_uploads_a_new_id() {
    let (mut backend, mut drawer) = drawer_with(&PaintState::default());
    let entity_buffer = drawer.buffers()[0];

    let uploads = drawer.clean(&mut backend, &Metrics::default(), EntityId::from_raw(9)).unwrap();

    assert_eq!(uploads, 1);
    assert_eq!(backend.uploads_to(entity_buffer), vec![(offset_of!(EntityUniforms, id), 4)]);
}

#[test]
fn release_returns_both_buffers() {
    let (mut backend, drawer) = drawer_with(&PaintState::default());
    assert_eq!(backend.live_buffers(), 2);

    let [entity, paint] = drawer.buffers();
    drawer.release(&mut backend);

    assert_eq!(backend.live_buffers(), 0);
    assert_eq!(
        backend.calls(),
        &[BackendCall::ReleaseBuffer(entity), BackendCall::ReleaseBuffer(paint)]
    );
}
