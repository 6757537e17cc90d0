//! Variant Hashing
//!
//! Packs the properties that select a shader variant into two 32-bit words
//! and mixes them into the final cache key.
//!
//! # Renderable word
//!
//! | Bits | Property |
//! |---|---|
//! | 0 | `hlms_skeleton` |
//! | 1-2 | `hlms_bones_per_vertex - 1` |
//! | 3 | `hlms_normal` |
//! | 4 | `hlms_qtangent` |
//! | 5-8 | `hlms_uv_count` |
//! | 9-24 | `hlms_uv_count<N> - 1`, two bits per UV set |
//! | 25 | `diffuse_map` |
//! | 26 | `normal_map` |
//! | 27 | `specular_map` |
//! | 28 | `envprobe_map` |
//! | 29 | `alpha_test` |
//! | 30 | `hlms_colour` |
//!
//! # Pass word
//!
//! | Bits | Property |
//! |---|---|
//! | 0 | `hlms_dual_paraboloid_mapping` |
//! | 1-4 | `hlms_num_shadow_maps` |
//! | 5-7 | `hlms_pssm_splits` |
//! | 8-11 | `hlms_lights_directional` |
//! | 12-15 | `hlms_lights_point` |
//! | 16-19 | `hlms_lights_spot` |
//! | 20 | `hlms_shadowcaster` |
//!
//! These offsets are the cache key format. Changing any of them invalidates
//! every stored hash.

use sigil_core::PropertyTable;

use crate::properties as p;

/// Seed of the final mix.
pub const HASH_SEED: u32 = 0x3A8E_FA67;

/// Applied to the pass word for renderables that do not cast shadows.
/// Clears the shadow-map count.
pub const NON_CASTER_PASS_MASK: u32 = 0xFFFF_FFE1;

/// Bit positions of the renderable word.
pub mod renderable_bits {
    pub const SKELETON: u32 = 0;
    pub const BONES_PER_VERTEX: u32 = 1;
    pub const NORMAL: u32 = 3;
    pub const QTANGENT: u32 = 4;
    pub const UV_COUNT: u32 = 5;
    pub const UV_SETS: u32 = 9;
    pub const DIFFUSE_MAP: u32 = 25;
    pub const NORMAL_MAP: u32 = 26;
    pub const SPECULAR_MAP: u32 = 27;
    pub const ENVPROBE_MAP: u32 = 28;
    pub const ALPHA_TEST: u32 = 29;
    pub const COLOUR: u32 = 30;
}

/// Bit positions of the pass word.
pub mod pass_bits {
    pub const DUAL_PARABOLOID: u32 = 0;
    pub const SHADOW_MAPS: u32 = 1;
    pub const PSSM_SPLITS: u32 = 5;
    pub const DIRECTIONAL: u32 = 8;
    pub const POINT: u32 = 12;
    pub const SPOT: u32 = 16;
    pub const CASTER: u32 = 20;
}

use pass_bits as pb;
use renderable_bits as rb;

const ALWAYS_CLEARED_FOR_CASTER: u32 =
    1 << rb::NORMAL | 1 << rb::QTANGENT | 1 << rb::NORMAL_MAP | 1 << rb::SPECULAR_MAP | 1 << rb::ENVPROBE_MAP;

const CLEARED_WITHOUT_ALPHA_TEST: u32 = 0xF << rb::UV_COUNT | 1 << rb::DIFFUSE_MAP;

#[inline]
fn flag(props: &PropertyTable, key: &str, bit: u32) -> u32 {
    u32::from(props.is_enabled(key)) << bit
}

#[inline]
fn field(props: &PropertyTable, key: &str, mask: u32, shift: u32) -> u32 {
    (props.get(key).max(0).cast_unsigned() & mask) << shift
}

/// A count stored as `count - 1` in a narrow field; zero leaves it clear.
#[inline]
fn minus_one_field(props: &PropertyTable, key: &str, mask: u32, shift: u32) -> u32 {
    let value = props.get(key);
    if value > 0 {
        ((value - 1).cast_unsigned() & mask) << shift
    } else {
        0
    }
}

/// Pure functions producing variant hashes from property tables.
pub struct VariantHasher;

impl VariantHasher {
    /// Packs the renderable properties of `props`.
    #[must_use]
    pub fn pack_renderable_bits(props: &PropertyTable) -> u32 {
        let mut hash = flag(props, p::SKELETON, rb::SKELETON)
            | minus_one_field(props, p::BONES_PER_VERTEX, 0x3, rb::BONES_PER_VERTEX)
            | flag(props, p::NORMAL, rb::NORMAL)
            | flag(props, p::QTANGENT, rb::QTANGENT)
            | field(props, p::UV_COUNT, 0xF, rb::UV_COUNT)
            | flag(props, p::DIFFUSE_MAP, rb::DIFFUSE_MAP)
            | flag(props, p::NORMAL_MAP, rb::NORMAL_MAP)
            | flag(props, p::SPECULAR_MAP, rb::SPECULAR_MAP)
            | flag(props, p::ENVPROBE_MAP, rb::ENVPROBE_MAP)
            | flag(props, p::ALPHA_TEST, rb::ALPHA_TEST)
            | flag(props, p::COLOUR, rb::COLOUR);

        for set in 0..p::MAX_UV_SETS {
            if let Some(key) = p::uv_count_n(set) {
                hash |= minus_one_field(props, key, 0x3, rb::UV_SETS + 2 * set as u32);
            }
        }

        hash
    }

    /// Packs the pass properties of `props`.
    #[must_use]
    pub fn pack_pass_bits(props: &PropertyTable) -> u32 {
        flag(props, p::DUAL_PARABOLOID_MAPPING, pb::DUAL_PARABOLOID)
            | field(props, p::NUM_SHADOW_MAPS, 0xF, pb::SHADOW_MAPS)
            | field(props, p::PSSM_SPLITS, 0x7, pb::PSSM_SPLITS)
            | field(props, p::LIGHTS_DIRECTIONAL, 0xF, pb::DIRECTIONAL)
            | field(props, p::LIGHTS_POINT, 0xF, pb::POINT)
            | field(props, p::LIGHTS_SPOT, 0xF, pb::SPOT)
            | flag(props, p::SHADOW_CASTER, pb::CASTER)
    }

    /// Reduces a renderable word to what a shadow caster pass needs.
    ///
    /// Normal, QTangent, normal/specular/env maps are always cleared. UV
    /// count and diffuse map are cleared too unless the alpha-test bit of the
    /// already masked word is set.
    #[must_use]
    pub fn apply_caster_mask(renderable_hash: u32) -> u32 {
        let masked = renderable_hash & !ALWAYS_CLEARED_FOR_CASTER;
        if masked & (1 << rb::ALPHA_TEST) == 0 {
            masked & !CLEARED_WITHOUT_ALPHA_TEST
        } else {
            masked
        }
    }

    /// Masks the pass word the way the final hash sees it.
    #[must_use]
    pub fn mask_pass_hash(pass_hash: u32, casts_shadows: bool) -> u32 {
        if casts_shadows {
            pass_hash
        } else {
            pass_hash & NON_CASTER_PASS_MASK
        }
    }

    /// Clears the pass properties whose bits [`Self::mask_pass_hash`] drops,
    /// so tables reaching the same final hash compare equal.
    pub fn mask_pass_properties(props: &mut PropertyTable, casts_shadows: bool) {
        if !casts_shadows {
            props.set(p::NUM_SHADOW_MAPS, 0);
        }
    }

    /// Mixes both words into the final cache key.
    #[must_use]
    pub fn combine(renderable_hash: u32, masked_pass_hash: u32) -> u32 {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&renderable_hash.to_le_bytes());
        buf[4..].copy_from_slice(&masked_pass_hash.to_le_bytes());
        xxhash_rust::xxh32::xxh32(&buf, HASH_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderable_layout() {
        let props = PropertyTable::from([
            (p::SKELETON, 1),
            (p::BONES_PER_VERTEX, 4),
            (p::NORMAL, 1),
            (p::UV_COUNT, 2),
            ("hlms_uv_count0", 2),
            ("hlms_uv_count1", 3),
            (p::ALPHA_TEST, 1),
        ]);
        let expected = 1 | 3 << 1 | 1 << 3 | 2 << 5 | 1 << 9 | 2 << 11 | 1 << 29;
        assert_eq!(VariantHasher::pack_renderable_bits(&props), expected);
    }

    #[test]
    fn test_pass_layout() {
        let props = PropertyTable::from([
            (p::NUM_SHADOW_MAPS, 3),
            (p::PSSM_SPLITS, 2),
            (p::LIGHTS_DIRECTIONAL, 1),
            (p::LIGHTS_POINT, 2),
            (p::LIGHTS_SPOT, 4),
        ]);
        let expected = 3 << 1 | 2 << 5 | 1 << 8 | 2 << 12 | 4 << 16;
        assert_eq!(VariantHasher::pack_pass_bits(&props), expected);
    }

    #[test]
    fn test_caster_mask_without_alpha_test() {
        let props = PropertyTable::from([
            (p::NORMAL, 1),
            (p::QTANGENT, 1),
            (p::DIFFUSE_MAP, 1),
            (p::UV_COUNT, 2),
            (p::SKELETON, 1),
        ]);
        let masked = VariantHasher::apply_caster_mask(VariantHasher::pack_renderable_bits(&props));
        assert_eq!(masked, 1 << rb::SKELETON);
    }

    #[test]
    fn test_caster_mask_with_alpha_test() {
        let props = PropertyTable::from([
            (p::NORMAL, 1),
            (p::QTANGENT, 1),
            (p::DIFFUSE_MAP, 1),
            (p::UV_COUNT, 2),
            (p::ALPHA_TEST, 1),
        ]);
        let masked = VariantHasher::apply_caster_mask(VariantHasher::pack_renderable_bits(&props));
        assert_eq!(masked, 2 << rb::UV_COUNT | 1 << rb::DIFFUSE_MAP | 1 << rb::ALPHA_TEST);
    }

    #[test]
    fn test_non_caster_pass_mask_clears_shadow_maps() {
        let pass = 0xF << pb::SHADOW_MAPS | 1 << pb::DUAL_PARABOLOID | 1 << pb::DIRECTIONAL;
        assert_eq!(
            VariantHasher::mask_pass_hash(pass, false),
            1 << pb::DUAL_PARABOLOID | 1 << pb::DIRECTIONAL
        );
        assert_eq!(VariantHasher::mask_pass_hash(pass, true), pass);
    }

    #[test]
    fn test_non_caster_pass_properties_drop_shadow_maps() {
        let mut props = PropertyTable::from([(p::NUM_SHADOW_MAPS, 3), (p::LIGHTS_DIRECTIONAL, 2)]);
        VariantHasher::mask_pass_properties(&mut props, true);
        assert_eq!(props.get(p::NUM_SHADOW_MAPS), 3);

        VariantHasher::mask_pass_properties(&mut props, false);
        assert_eq!(props.get(p::NUM_SHADOW_MAPS), 0);
        assert_eq!(props.get(p::LIGHTS_DIRECTIONAL), 2);
    }

    #[test]
    fn test_combine_is_deterministic_and_order_sensitive() {
        let a = VariantHasher::combine(0x1234, 0x5678);
        assert_eq!(a, VariantHasher::combine(0x1234, 0x5678));
        assert_ne!(a, VariantHasher::combine(0x5678, 0x1234));
    }
}
