//! Variant Hashing & Cache Integration Tests
//!
//! Tests for:
//! - Renderable / pass bit packing
//! - Caster mask on renderable hashes
//! - Final hash combination
//! - RenderableCache / ShaderProgramCache first-writer-wins semantics

use std::sync::Arc;

use sigil::prelude::*;
use sigil::variant::hasher::{pass_bits, renderable_bits};
use sigil::variant::{RenderableCache, ShaderProgramCache};

fn bit(position: u32) -> u32 {
    1 << position
}

// ============================================================================
// Bit packing
// ============================================================================

#[test]
fn renderable_bits_follow_layout() {
    let props = PropertyTable::from([
        (properties::SKELETON, 1),
        (properties::BONES_PER_VERTEX, 4),
        (properties::QTANGENT, 1),
        (properties::UV_COUNT, 2),
        ("hlms_uv_count0", 2),
        ("hlms_uv_count1", 4),
        (properties::COLOUR, 1),
    ]);
    let hash = VariantHasher::pack_renderable_bits(&props);

    assert_eq!(hash & bit(renderable_bits::SKELETON), bit(renderable_bits::SKELETON));
    assert_eq!(hash >> renderable_bits::BONES_PER_VERTEX & 0x3, 3);
    assert_eq!(hash >> renderable_bits::UV_COUNT & 0xF, 2);
    assert_eq!(hash >> renderable_bits::UV_SETS & 0x3, 1);
    assert_eq!(hash >> (renderable_bits::UV_SETS + 2) & 0x3, 3);
    assert_ne!(hash & bit(renderable_bits::QTANGENT), 0);
    assert_ne!(hash & bit(renderable_bits::COLOUR), 0);
    assert_eq!(hash & bit(renderable_bits::NORMAL), 0);
}

#[test]
fn pass_bits_follow_layout() {
    let props = PropertyTable::from([
        (properties::NUM_SHADOW_MAPS, 5),
        (properties::PSSM_SPLITS, 3),
        (properties::LIGHTS_DIRECTIONAL, 1),
        (properties::LIGHTS_POINT, 3),
        (properties::LIGHTS_SPOT, 4),
    ]);
    let hash = VariantHasher::pack_pass_bits(&props);

    assert_eq!(hash >> pass_bits::SHADOW_MAPS & 0xF, 5);
    assert_eq!(hash >> pass_bits::PSSM_SPLITS & 0x7, 3);
    assert_eq!(hash >> pass_bits::DIRECTIONAL & 0xF, 1);
    assert_eq!(hash >> pass_bits::POINT & 0xF, 3);
    assert_eq!(hash >> pass_bits::SPOT & 0xF, 4);
    assert_eq!(hash & bit(pass_bits::CASTER), 0);
}

// ============================================================================
// Caster mask
// ============================================================================

fn shaded_renderable(alpha_test: i32) -> u32 {
    VariantHasher::pack_renderable_bits(&PropertyTable::from([
        (properties::NORMAL, 1),
        (properties::QTANGENT, 1),
        (properties::DIFFUSE_MAP, 1),
        (properties::ALPHA_TEST, alpha_test),
        (properties::UV_COUNT, 2),
    ]))
}

#[test]
fn caster_mask_clears_shading_bits() {
    let masked = VariantHasher::apply_caster_mask(shaded_renderable(0));

    assert_eq!(masked & bit(renderable_bits::NORMAL), 0);
    assert_eq!(masked & bit(renderable_bits::QTANGENT), 0);
    assert_eq!(masked & bit(renderable_bits::DIFFUSE_MAP), 0);
    assert_eq!(masked >> renderable_bits::UV_COUNT & 0xF, 0);
}

#[test]
fn caster_mask_keeps_texturing_for_alpha_test() {
    let masked = VariantHasher::apply_caster_mask(shaded_renderable(1));

    assert_eq!(masked & bit(renderable_bits::NORMAL), 0);
    assert_eq!(masked & bit(renderable_bits::QTANGENT), 0);
    assert_ne!(masked & bit(renderable_bits::DIFFUSE_MAP), 0);
    assert_eq!(masked >> renderable_bits::UV_COUNT & 0xF, 2);
    assert_ne!(masked & bit(renderable_bits::ALPHA_TEST), 0);
}

#[test]
fn caster_mask_is_idempotent() {
    for hash in [shaded_renderable(0), shaded_renderable(1), u32::MAX, 0] {
        let once = VariantHasher::apply_caster_mask(hash);
        assert_eq!(VariantHasher::apply_caster_mask(once), once);
    }
}

// ============================================================================
// Final hash
// ============================================================================

#[test]
fn non_casting_renderables_ignore_shadow_map_count() {
    let with_shadows = 3 << pass_bits::SHADOW_MAPS | 2 << pass_bits::DIRECTIONAL;
    let without_shadows = 2 << pass_bits::DIRECTIONAL;

    assert_eq!(
        VariantHasher::combine(7, VariantHasher::mask_pass_hash(with_shadows, false)),
        VariantHasher::combine(7, VariantHasher::mask_pass_hash(without_shadows, false)),
    );
    assert_ne!(
        VariantHasher::combine(7, VariantHasher::mask_pass_hash(with_shadows, true)),
        VariantHasher::combine(7, VariantHasher::mask_pass_hash(without_shadows, true)),
    );
}

#[test]
fn combine_depends_on_both_words() {
    let base = VariantHasher::combine(1, 2);
    assert_eq!(base, VariantHasher::combine(1, 2));
    assert_ne!(base, VariantHasher::combine(2, 1));
    assert_ne!(base, VariantHasher::combine(1, 3));
}

// ============================================================================
// Caches
// ============================================================================

#[test]
fn renderable_cache_first_writer_wins() {
    let cache = RenderableCache::new();
    let first = PropertyTable::from([("p", 1)]);
    let second = PropertyTable::from([("p", 2)]);

    assert!(cache.add(0xABCD, &first));
    assert!(!cache.add(0xABCD, &second));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(0xABCD).as_deref(), Some(&first));
    assert!(cache.get(0x1234).is_none());
}

#[test]
fn program_cache_first_writer_wins() {
    let mut cache = ShaderProgramCache::new();
    let mut stages: [Option<ProgramHandle>; ShaderStage::COUNT] = Default::default();
    stages[ShaderStage::Vertex.index()] = Some(ProgramHandle::new("first"));
    let first = Arc::new(ShaderPrograms::new(42, stages));
    let second = Arc::new(ShaderPrograms::new(42, Default::default()));

    assert!(cache.add(Arc::clone(&first), None));
    assert!(!cache.add(second, None));

    let entry = cache.get(42).unwrap();
    assert!(Arc::ptr_eq(&entry.programs, &first));
    assert_eq!(cache.len(), 1);
}
