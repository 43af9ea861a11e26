//! Program source assembly.
//!
//! A protocol's stages are built from three parts: a define block derived
//! from the [`RenderFeatures`] (one `#define EASEL_<FEATURE> 1` line per
//! enabled bit), a shared prelude declaring the two uniform blocks, and the
//! stage body. Fragment bodies are selected by [`Brush`].
//!
//! The generated text is handed to the backend verbatim; translating it into
//! a concrete shading language is the backend's concern.

use std::fmt::Write;

use crate::renderer::backend::{ProgramDescriptor, ShaderStage, StageSource};
use crate::renderer::protocol::{Brush, ProtocolKey, RenderFeatures};
use crate::renderer::uniforms::{
    ENTITY_BLOCK_BINDING, ENTITY_BLOCK_NAME, PAINT_BLOCK_BINDING, PAINT_BLOCK_NAME,
};

const PRELUDE: &str = "\
block EASEL_ENTITY_DATA_NAME @ EASEL_ENTITY_DATA_LOCATION {
    vec3 translation; vec3 rotation; vec3 scale;
    vec3 inherited_translation; vec3 inherited_rotation; vec3 inherited_scale;
    uint id;
}
block EASEL_PAINTER_DATA_NAME @ EASEL_PAINTER_DATA_LOCATION {
    vec3 paint_translation; vec3 paint_rotation; vec3 paint_scale;
    vec4 data;
    vec4 foreground_color; vec4 foreground_transform;
    vec4 background_color; vec4 background_transform;
    vec4 mask_color; vec4 mask_transform;
    mat4 filter;
}
";

const STANDARD_VERTEX: &str = "\
vertex main(vec3 position, vec2 uv) {
    vec3 p = apply(paint_translation, paint_rotation, paint_scale, position);
    p = apply(translation, rotation, scale, p);
#ifdef EASEL_INHERIT_SCALE
    p *= inherited_scale;
#endif
#ifdef EASEL_INHERIT_ROTATION
    p = rotate(inherited_rotation, p);
#endif
#ifdef EASEL_INHERIT_TRANSLATION
    p += inherited_translation;
#endif
    out_uv = uv;
    out_position = p;
}
";

const FRAGMENT_EPILOGUE: &str = "\
#ifdef EASEL_FILTER
    color = filter * color;
#endif
#ifdef EASEL_DISCARD_INVISIBLE
    if (color.a <= 0.0) discard;
#endif
    write_scene(color);
#ifdef EASEL_STORE_ID
    write_id(id);
#endif
";

fn fragment_body(brush: Brush) -> &'static str {
    match brush {
        Brush::Color => "    vec4 color = foreground_color;\n",
        Brush::Texture => "    vec4 color = sample(tex, tex_uv(foreground_transform)) + foreground_color;\n",
        Brush::Mask => {
            "    vec4 color = sample(tex, tex_uv(foreground_transform)) + foreground_color;\n    \
             color.a *= sample(mask, tex_uv(mask_transform)).r + mask_color.a;\n"
        }
        Brush::ConditionalMask => {
            "    float m = sample(mask, tex_uv(mask_transform)).r;\n    \
             vec4 color = (m >= data.x && m <= data.y)\n        \
             ? sample(tex1, tex_uv(foreground_transform)) + foreground_color\n        \
             : sample(tex2, tex_uv(background_transform)) + background_color;\n"
        }
        Brush::Blend => {
            "    vec4 color = mix(sample(tex1, tex_uv(foreground_transform)) + foreground_color,\n        \
             sample(tex2, tex_uv(background_transform)) + background_color, data.x);\n"
        }
        Brush::MultiComponentBlend => {
            "    vec4 color = foreground_color;\n    \
             write_blend_source(sample(tex2, tex_uv(background_transform)) * foreground_color.a);\n"
        }
    }
}

fn define_block(features: RenderFeatures) -> String {
    let mut out = String::new();
    for name in features.define_names() {
        let _ = writeln!(out, "#define EASEL_{name} 1");
    }
    let _ = writeln!(out, "#define EASEL_ENTITY_DATA_NAME {ENTITY_BLOCK_NAME}");
    let _ = writeln!(out, "#define EASEL_ENTITY_DATA_LOCATION {ENTITY_BLOCK_BINDING}");
    let _ = writeln!(out, "#define EASEL_PAINTER_DATA_NAME {PAINT_BLOCK_NAME}");
    let _ = writeln!(out, "#define EASEL_PAINTER_DATA_LOCATION {PAINT_BLOCK_BINDING}");
    out
}

/// Effective feature set compiled for a key.
///
/// The multi-component blend writes its second output to the dual-source
/// slot, so it never stores ids.
#[must_use]
pub fn effective_features(key: ProtocolKey) -> RenderFeatures {
    match key.brush {
        Brush::MultiComponentBlend => key.features.difference(RenderFeatures::STORE_ID),
        _ => key.features,
    }
}

/// Builds the program descriptor for `key`.
#[must_use]
pub fn program_descriptor(key: ProtocolKey) -> ProgramDescriptor {
    let defines = define_block(effective_features(key));

    let vertex = format!("{defines}{PRELUDE}{STANDARD_VERTEX}");
    let fragment = format!(
        "{defines}{PRELUDE}fragment main(vec2 uv) {{\n{}{FRAGMENT_EPILOGUE}}}\n",
        fragment_body(key.brush)
    );

    ProgramDescriptor {
        label: format!("Protocol {:?} [{:#04x}]", key.brush, key.features.bits()),
        stages: vec![
            StageSource {
                stage: ShaderStage::Vertex,
                source: vertex,
            },
            StageSource {
                stage: ShaderStage::Fragment,
                source: fragment,
            },
        ],
        samplers: key.brush.samplers().to_vec(),
        uniform_blocks: vec![
            (ENTITY_BLOCK_NAME, ENTITY_BLOCK_BINDING),
            (PAINT_BLOCK_NAME, PAINT_BLOCK_BINDING),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_follow_features() {
        let desc = program_descriptor(ProtocolKey::new(Brush::Color, RenderFeatures::FILTER));
        let fragment = &desc.stages[1].source;
        assert!(fragment.contains("#define EASEL_FILTER 1"));
        assert!(!fragment.contains("#define EASEL_STORE_ID 1"));
        assert!(desc.samplers.is_empty());
    }

    #[test]
    fn multicomponent_blend_never_stores_id() {
        let key = ProtocolKey::new(Brush::MultiComponentBlend, RenderFeatures::DEFAULT);
        assert!(!effective_features(key).contains(RenderFeatures::STORE_ID));
        let desc = program_descriptor(key);
        assert!(!desc.stages[0].source.contains("EASEL_STORE_ID 1"));
        assert_eq!(desc.samplers.len(), 2);
    }
}
