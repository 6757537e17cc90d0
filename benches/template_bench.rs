//! Template Engine & Variant Lookup Benchmarks
//!
//! - `template/*`: full main-template pipeline at growing loop counts
//! - `variant/hit`: cached `get_material` lookups
//! - `variant/hash`: renderable property derivation and hashing

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use sigil::core::CompileError;
use sigil::prelude::*;

const TEMPLATE: &str = "#version 330
@piece(Light)uniform vec4 light@counter(binding);
@end
@foreach(hlms_lights_directional, i)@property(hlms_normal && !hlms_shadowcaster)@insertpiece(Light)@end@end
@pset(tmp, hlms_uv_count)@pmul(tmp, 2)
@foreach(tmp, n)in vec2 uv@n;
@end
void main() {}
";

fn bench_template(c: &mut Criterion) {
    let engine = TemplateEngine::new();
    let mut group = c.benchmark_group("template");

    for lights in [1, 4, 16] {
        let base = PropertyTable::from([
            (properties::LIGHTS_DIRECTIONAL, lights),
            (properties::NORMAL, 1),
            (properties::UV_COUNT, 2),
        ]);
        group.bench_with_input(BenchmarkId::new("process", lights), &base, |b, base| {
            b.iter(|| {
                let mut props = base.clone();
                let mut pieces = Pieces::new();
                let mut diag = Diagnostics::new();
                black_box(engine.process_template(black_box(TEMPLATE), &mut props, &mut pieces, &mut diag))
            });
        });
    }

    group.finish();
}

fn mesh() -> RenderableDesc {
    RenderableDesc {
        num_world_transforms: 1,
        vertex_elements: vec![
            VertexElement::new(VertexSemantic::Position, VertexElementType::Float3, 0),
            VertexElement::new(VertexSemantic::Normal, VertexElementType::Short4, 0),
            VertexElement::new(VertexSemantic::TextureCoordinates, VertexElementType::Float2, 0),
        ],
        material_params: MaterialParams::new()
            .with(properties::DIFFUSE_MAP, "albedo.png")
            .with(properties::NORMAL_MAP, "normal.png"),
    }
}

fn bench_variant(c: &mut Criterion) {
    let archive = MemoryArchive::new().with("VertexShader_vs.glsl", TEMPLATE);
    let compiler = |req: &CompileRequest<'_>| -> std::result::Result<ProgramHandle, CompileError> {
        Ok(ProgramHandle::new(req.source.len()))
    };
    let manager = VariantManager::new(
        Arc::new(archive),
        Arc::new(compiler),
        Arc::new(vec![LightType::Directional; 3]),
        VariantSettings {
            verify_collisions: false,
            ..VariantSettings::default()
        },
    );

    let renderable = mesh();
    let hashes = manager.calculate_hash_for(&renderable);
    let pass = manager.prepare_pass_hash(None, false, false);
    let _ = manager.get_material(None, &pass, hashes, true);

    let mut group = c.benchmark_group("variant");
    group.bench_function("hit", |b| {
        b.iter(|| black_box(manager.get_material(None, &pass, black_box(hashes), true)));
    });
    group.bench_function("hash", |b| {
        b.iter(|| black_box(manager.calculate_hash_for(black_box(&renderable))));
    });
    group.finish();
}

criterion_group!(benches, bench_template, bench_variant);
criterion_main!(benches);
