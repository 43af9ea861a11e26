//! GPU uniform block layouts and their diff tables.
//!
//! Two blocks are shared by every program:
//!
//! | Block            | Binding | Content                                  | Cadence            |
//! |------------------|---------|------------------------------------------|--------------------|
//! | `EntityUniforms` | 0       | entity transform, inherited transform, id | per animation step |
//! | `PaintUniforms`  | 1       | painter transform, colors, filter, data   | per draw call      |
//!
//! Each block has a static table of [`UniformField`] rows describing the byte
//! range of every logical field and the feature bit (if any) that gates it.
//! [`changed_fields`] walks a table against two packed copies of a block and
//! yields the rows whose bytes differ, which is all a
//! [`Drawer`](super::drawer::Drawer) needs to issue minimal partial uploads.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::renderer::paint::PaintState;
use crate::renderer::protocol::RenderFeatures;
use crate::scene::id_registry::EntityId;
use crate::scene::transform::{Metrics, Transform};

pub const ENTITY_BLOCK_NAME: &str = "_easel_EntityData";
pub const ENTITY_BLOCK_BINDING: u32 = 0;
pub const PAINT_BLOCK_NAME: &str = "_easel_PainterData";
pub const PAINT_BLOCK_BINDING: u32 = 1;

const VEC3: usize = 3 * size_of::<f32>();
const VEC4: usize = 4 * size_of::<f32>();
const MAT4: usize = 16 * size_of::<f32>();

/// One diffable range of a uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformField {
    pub name: &'static str,
    /// Byte offset inside the block.
    pub offset: usize,
    /// Byte length of the range.
    pub size: usize,
    /// Features that must all be enabled for the shader to read this field.
    /// Empty means always read.
    pub gate: RenderFeatures,
}

impl UniformField {
    const fn always(name: &'static str, offset: usize, size: usize) -> Self {
        Self {
            name,
            offset,
            size,
            gate: RenderFeatures::empty(),
        }
    }

    const fn gated(name: &'static str, offset: usize, size: usize, gate: RenderFeatures) -> Self {
        Self {
            name,
            offset,
            size,
            gate,
        }
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size
    }

    #[inline]
    #[must_use]
    pub fn is_read_with(&self, features: RenderFeatures) -> bool {
        features.contains(self.gate)
    }
}

/// Yields the rows of `table` whose bytes differ between `old` and `new` and
/// that the shader reads under `features`.
pub fn changed_fields<'a>(
    table: &'a [UniformField],
    old: &'a [u8],
    new: &'a [u8],
    features: RenderFeatures,
) -> impl Iterator<Item = &'a UniformField> + 'a {
    table
        .iter()
        .filter(move |field| field.is_read_with(features))
        .filter(move |field| old[field.range()] != new[field.range()])
}

#[inline]
fn vec3_slot(v: glam::Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

// ─── Entity block ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EntityUniforms {
    pub translation: [f32; 4],
    pub rotation: [f32; 4],
    pub scale: [f32; 4],
    pub inherited_translation: [f32; 4],
    pub inherited_rotation: [f32; 4],
    pub inherited_scale: [f32; 4],
    pub id: u32,
    pub _pad: [u32; 3],
}

impl EntityUniforms {
    #[must_use]
    pub fn pack(metrics: &Metrics, id: EntityId) -> Self {
        let Metrics {
            transform,
            inherited,
        } = metrics;
        Self {
            translation: vec3_slot(transform.translation),
            rotation: vec3_slot(transform.rotation),
            scale: vec3_slot(transform.scale),
            inherited_translation: vec3_slot(inherited.translation),
            inherited_rotation: vec3_slot(inherited.rotation),
            inherited_scale: vec3_slot(inherited.scale),
            id: id.raw(),
            _pad: [0; 3],
        }
    }
}

pub static ENTITY_FIELDS: [UniformField; 6] = [
    UniformField::always("transform.translation", offset_of!(EntityUniforms, translation), VEC3),
    UniformField::always("transform.rotation", offset_of!(EntityUniforms, rotation), VEC3),
    UniformField::always("transform.scale", offset_of!(EntityUniforms, scale), VEC3),
    UniformField::always("inherited.translation", offset_of!(EntityUniforms, inherited_translation), VEC3),
    UniformField::always("inherited.rotation", offset_of!(EntityUniforms, inherited_rotation), VEC3),
    UniformField::always("inherited.scale", offset_of!(EntityUniforms, inherited_scale), VEC3),
];

// ─── Paint block ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PaintUniforms {
    pub translation: [f32; 4],
    pub rotation: [f32; 4],
    pub scale: [f32; 4],
    pub data: [f32; 4],
    pub foreground_color: [f32; 4],
    pub foreground_transform: [f32; 4],
    pub background_color: [f32; 4],
    pub background_transform: [f32; 4],
    pub mask_color: [f32; 4],
    pub mask_transform: [f32; 4],
    pub filter: [f32; 16],
}

impl PaintUniforms {
    #[must_use]
    pub fn pack(state: &PaintState) -> Self {
        let Transform {
            translation,
            rotation,
            scale,
        } = state.transformation;
        Self {
            translation: vec3_slot(translation),
            rotation: vec3_slot(rotation),
            scale: vec3_slot(scale),
            data: state.data.to_array(),
            foreground_color: state.foreground_color.to_array(),
            foreground_transform: state.foreground_transform.to_array(),
            background_color: state.background_color.to_array(),
            background_transform: state.background_transform.to_array(),
            mask_color: state.mask_color.to_array(),
            mask_transform: state.mask_transform.to_array(),
            filter: state.filter.to_cols_array(),
        }
    }
}

pub static PAINT_FIELDS: [UniformField; 11] = [
    UniformField::always("transformation.translation", offset_of!(PaintUniforms, translation), VEC3),
    UniformField::always("transformation.rotation", offset_of!(PaintUniforms, rotation), VEC3),
    UniformField::always("transformation.scale", offset_of!(PaintUniforms, scale), VEC3),
    UniformField::always("data", offset_of!(PaintUniforms, data), VEC4),
    UniformField::always("foreground_color", offset_of!(PaintUniforms, foreground_color), VEC4),
    UniformField::gated(
        "foreground_transform",
        offset_of!(PaintUniforms, foreground_transform),
        VEC4,
        RenderFeatures::TEXTURE_TRANSFORM,
    ),
    UniformField::always("background_color", offset_of!(PaintUniforms, background_color), VEC4),
    UniformField::gated(
        "background_transform",
        offset_of!(PaintUniforms, background_transform),
        VEC4,
        RenderFeatures::TEXTURE_TRANSFORM,
    ),
    UniformField::always("mask_color", offset_of!(PaintUniforms, mask_color), VEC4),
    UniformField::gated(
        "mask_transform",
        offset_of!(PaintUniforms, mask_transform),
        VEC4,
        RenderFeatures::TEXTURE_TRANSFORM,
    ),
    UniformField::gated("filter", offset_of!(PaintUniforms, filter), MAT4, RenderFeatures::FILTER),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_sizes_match_layout() {
        assert_eq!(size_of::<EntityUniforms>(), 28 * 4);
        assert_eq!(size_of::<PaintUniforms>(), 56 * 4);
    }

    #[test]
    fn paint_fields_do_not_overlap() {
        let mut ranges: Vec<_> = PAINT_FIELDS.iter().map(UniformField::range).collect();
        ranges.sort_by_key(|r| r.start);
        for pair in ranges.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{pair:?}");
        }
        assert_eq!(PAINT_FIELDS[10].range().end, size_of::<PaintUniforms>());
    }

    #[test]
    fn gated_field_is_skipped_without_feature() {
        let old = PaintUniforms::pack(&PaintState::default());
        let mut state = PaintState::default();
        state.filter.x_axis.x = 0.5;
        let new = PaintUniforms::pack(&state);

        let with_filter: Vec<_> = changed_fields(
            &PAINT_FIELDS,
            bytemuck::bytes_of(&old),
            bytemuck::bytes_of(&new),
            RenderFeatures::FILTER,
        )
        .map(|f| f.name)
        .collect();
        assert_eq!(with_filter, ["filter"]);

        let without: Vec<_> = changed_fields(
            &PAINT_FIELDS,
            bytemuck::bytes_of(&old),
            bytemuck::bytes_of(&new),
            RenderFeatures::NONE,
        )
        .collect();
        assert!(without.is_empty());
    }
}
