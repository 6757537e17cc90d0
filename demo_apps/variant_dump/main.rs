//! Variant Dump
//!
//! Generates and "compiles" the shader variant of one synthetic renderable
//! and prints (or writes) the per-stage sources.
//!
//! # Usage
//!
//! ```bash
//! variant_dump path/to/templates
//! variant_dump templates --uv-sets 2 --normal-map --lights 3
//! variant_dump templates --caster --alpha-test --out generated/
//! variant_dump templates --settings sigil.json --properties
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use sigil::core::CompileError;
use sigil::prelude::*;

#[derive(Parser)]
#[command(name = "variant_dump")]
#[command(author, version, about = "Print the shader variant generated for a renderable")]
struct Args {
    /// Directory holding the stage templates and piece files
    templates: PathBuf,

    /// JSON settings file (missing fields take their defaults)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write each stage to this directory instead of stdout
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    // === Renderable ===
    /// Number of UV sets (0-8)
    #[arg(long, default_value = "1")]
    uv_sets: u16,

    /// Bones per vertex; enables skinning when non-zero
    #[arg(long, default_value = "0")]
    bones: u8,

    /// Encode the tangent frame as a QTangent and bind a normal map
    #[arg(long)]
    normal_map: bool,

    #[arg(long)]
    alpha_test: bool,

    /// Per-vertex colour
    #[arg(long)]
    colour: bool,

    // === Pass ===
    /// Directional lights in the scene
    #[arg(long, short = 'l', default_value = "1")]
    lights: usize,

    /// Generate the shadow caster variant
    #[arg(long)]
    caster: bool,

    /// Also print the variant's properties as JSON
    #[arg(long)]
    properties: bool,

    /// Shadow casting directional light with this many PSSM splits
    #[arg(long)]
    pssm: Option<usize>,
}

fn renderable(args: &Args) -> RenderableDesc {
    let mut elements = vec![VertexElement::new(
        VertexSemantic::Position,
        VertexElementType::Float3,
        0,
    )];

    let normal_type = if args.normal_map {
        VertexElementType::Short4
    } else {
        VertexElementType::Float3
    };
    elements.push(VertexElement::new(VertexSemantic::Normal, normal_type, 0));

    if args.colour {
        elements.push(VertexElement::new(VertexSemantic::Diffuse, VertexElementType::Colour, 0));
    }

    if args.bones > 0 {
        let weights = match args.bones {
            1 => VertexElementType::Float1,
            2 => VertexElementType::Float2,
            3 => VertexElementType::Float3,
            _ => VertexElementType::Float4,
        };
        elements.push(VertexElement::new(VertexSemantic::BlendWeights, weights, 0));
        elements.push(VertexElement::new(VertexSemantic::BlendIndices, VertexElementType::UByte4, 0));
    }

    for set in 0..args.uv_sets {
        elements.push(VertexElement::new(
            VertexSemantic::TextureCoordinates,
            VertexElementType::Float2,
            set,
        ));
    }

    let mut params = MaterialParams::new();
    if args.uv_sets > 0 {
        params.set(properties::DIFFUSE_MAP, "diffuse.png");
    }
    if args.normal_map {
        params.set(properties::NORMAL_MAP, "normal.png");
    }
    if args.alpha_test {
        params.set(properties::ALPHA_TEST, "0.5");
    }

    RenderableDesc {
        num_world_transforms: if args.bones > 0 { 2 } else { 1 },
        vertex_elements: elements,
        material_params: params,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => VariantSettings::from_json_file(path)
            .with_context(|| format!("reading settings {}", path.display()))?,
        None => VariantSettings::default(),
    };

    let archive = DirectoryArchive::open(&args.templates)
        .with_context(|| format!("opening templates {}", args.templates.display()))?;

    // Programs are the generated sources themselves.
    let compiler = |req: &CompileRequest<'_>| -> std::result::Result<ProgramHandle, CompileError> {
        Ok(ProgramHandle::new(req.source.to_string()))
    };

    let manager = VariantManager::new(
        Arc::new(archive),
        Arc::new(compiler),
        Arc::new(vec![LightType::Directional; args.lights]),
        settings,
    );

    let shadow_node = args.pssm.map(|splits| ShadowNodeDesc {
        casting_lights: vec![LightType::Directional],
        pssm_splits: Some((0..=splits).map(|i| i as f32 * 10.0).collect()),
    });
    let pass = manager.prepare_pass_hash(
        shadow_node.as_ref().map(|node| node as &dyn ShadowNode),
        args.caster,
        false,
    );

    let renderable = renderable(&args);
    let hashes = manager.calculate_hash_for(&renderable);
    let programs = manager.get_material(None, &pass, hashes, true)?;

    if args.properties {
        let renderable_hash = if args.caster { hashes.caster_hash } else { hashes.hash };
        if let Some(table) = manager.renderable_cache().get(renderable_hash) {
            let merged = table.merged_with(&pass.properties);
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
    }

    log::info!(
        "renderable {:#010x} (caster {:#010x}), pass {:#010x} -> variant {:#010x}",
        hashes.hash,
        hashes.caster_hash,
        pass.hash,
        programs.hash()
    );

    for stage in programs.stages() {
        let Some(source) = programs
            .get(stage)
            .and_then(|handle| handle.downcast_ref::<String>())
        else {
            continue;
        };

        match &args.out {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}{}", programs.hash(), stage.template_stem()));
                std::fs::write(&path, source)
                    .with_context(|| format!("writing {}", path.display()))?;
                log::info!("{stage}: {}", path.display());
            }
            None => println!("// ===== {stage} =====\n{source}"),
        }
    }

    Ok(())
}
