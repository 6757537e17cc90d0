//! Global String Interner
//!
//! Converts property and piece names into compact integer [`Symbol`]s so that
//! property tables can be sorted, searched and compared without touching the
//! underlying strings.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Interned string identifier.
///
/// A `Symbol` is a compact integer key; equality and ordering are integer
/// operations. Ordering follows intern order, not lexicographic order.
pub type Symbol = Spur;

/// Interns a string and returns its `Symbol`.
///
/// Returns the existing `Symbol` if the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the `Symbol` of an already interned string without allocating.
#[inline]
#[must_use]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a `Symbol` back to its string.
#[inline]
#[must_use]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns the property names the variant system sets on every request,
/// keeping interning off the hot path.
pub fn preload_common_properties() {
    let common = [
        // Geometry
        "hlms_skeleton",
        "hlms_bones_per_vertex",
        "hlms_pose",
        "hlms_normal",
        "hlms_qtangent",
        "hlms_colour",
        "hlms_uv_count",
        "hlms_uv_count0",
        "hlms_uv_count1",
        "hlms_uv_count2",
        "hlms_uv_count3",
        "hlms_uv_count4",
        "hlms_uv_count5",
        "hlms_uv_count6",
        "hlms_uv_count7",
        // Pass
        "hlms_lights_directional",
        "hlms_lights_point",
        "hlms_lights_spot",
        "hlms_lights_attenuation",
        "hlms_lights_spotparams",
        "hlms_dual_paraboloid_mapping",
        "hlms_num_shadow_maps",
        "hlms_pssm_splits",
        "hlms_shadowcaster",
        // Material
        "diffuse_map",
        "normal_map",
        "specular_map",
        "envprobe_map",
        "alpha_test",
    ];

    for name in common {
        intern(name);
    }
    log::debug!("Preloaded {} property names", common.len());
}
