//! Well-known property names set by the variant manager and read by
//! templates.

// Renderable
pub const SKELETON: &str = "hlms_skeleton";
pub const BONES_PER_VERTEX: &str = "hlms_bones_per_vertex";
pub const POSE: &str = "hlms_pose";
pub const NORMAL: &str = "hlms_normal";
pub const QTANGENT: &str = "hlms_qtangent";
pub const COLOUR: &str = "hlms_colour";
pub const UV_COUNT: &str = "hlms_uv_count";

/// Number of UV sets whose component counts are tracked.
pub const MAX_UV_SETS: usize = 8;

const UV_COUNT_N: [&str; MAX_UV_SETS] = [
    "hlms_uv_count0",
    "hlms_uv_count1",
    "hlms_uv_count2",
    "hlms_uv_count3",
    "hlms_uv_count4",
    "hlms_uv_count5",
    "hlms_uv_count6",
    "hlms_uv_count7",
];

/// `hlms_uv_count<index>`: component count (1-4) of UV set `index`.
///
/// Returns `None` past [`MAX_UV_SETS`].
#[must_use]
pub fn uv_count_n(index: usize) -> Option<&'static str> {
    UV_COUNT_N.get(index).copied()
}

// Material
pub const DIFFUSE_MAP: &str = "diffuse_map";
pub const NORMAL_MAP: &str = "normal_map";
pub const SPECULAR_MAP: &str = "specular_map";
pub const ENVPROBE_MAP: &str = "envprobe_map";
pub const ALPHA_TEST: &str = "alpha_test";

// Pass
pub const LIGHTS_DIRECTIONAL: &str = "hlms_lights_directional";
pub const LIGHTS_POINT: &str = "hlms_lights_point";
pub const LIGHTS_SPOT: &str = "hlms_lights_spot";
pub const LIGHTS_ATTENUATION: &str = "hlms_lights_attenuation";
pub const LIGHTS_SPOTPARAMS: &str = "hlms_lights_spotparams";
pub const DUAL_PARABOLOID_MAPPING: &str = "hlms_dual_paraboloid_mapping";
pub const NUM_SHADOW_MAPS: &str = "hlms_num_shadow_maps";
pub const PSSM_SPLITS: &str = "hlms_pssm_splits";
pub const SHADOW_CASTER: &str = "hlms_shadowcaster";
