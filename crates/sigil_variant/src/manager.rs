//! Variant Manager
//!
//! Turns "draw this renderable in this pass" into compiled shader programs.
//!
//! # Request flow
//!
//! ```text
//! calculate_hash_for(renderable)  ->  RenderableHashes   (once per renderable)
//! prepare_pass_hash(shadow node)  ->  PassCache          (once per pass)
//! get_material(last, pass, hashes, casts_shadows)
//!     final = combine(renderable or caster hash, masked pass hash)
//!     hit  -> cached ShaderPrograms
//!     miss -> merge properties, run templates per stage, compile, cache
//! ```
//!
//! # Concurrency
//!
//! The manager is `Send + Sync`. The program cache mutex is held from lookup
//! to insertion, so concurrent requests for one final hash compile it once and
//! every other caller observes the cached result.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use sigil_core::{PropertyTable, Result, ShaderStage, SigilError};
use sigil_template::{Diagnostics, Pieces, TemplateEngine, resolve_includes};

use crate::archive::{ArchiveIncludes, TemplateArchive};
use crate::cache::{RenderableCache, ShaderProgramCache, ShaderPrograms};
use crate::compiler::{CompileRequest, ProgramHandle, ShaderCompiler};
use crate::hasher::VariantHasher;
use crate::properties as p;
use crate::scene::{LightSource, LightType, RenderableSource, ShadowNode, VertexSemantic};
use crate::settings::VariantSettings;

/// Renderable hashes for regular and shadow caster passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderableHashes {
    pub hash: u32,
    pub caster_hash: u32,
}

/// Pass-level properties and their packed hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassCache {
    pub hash: u32,
    pub caster_pass: bool,
    pub properties: PropertyTable,
}

/// Generated source of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSource {
    pub stage: ShaderStage,
    /// Main template the source was generated from.
    pub template: String,
    pub source: String,
}

/// Selects, generates, compiles and caches shader variants.
pub struct VariantManager {
    archive: Arc<dyn TemplateArchive>,
    lights: Arc<dyn LightSource>,
    compiler: RwLock<Arc<dyn ShaderCompiler>>,
    settings: VariantSettings,
    engine: TemplateEngine,
    piece_files: [Vec<String>; ShaderStage::COUNT],
    renderables: RenderableCache,
    programs: Mutex<ShaderProgramCache>,
}

impl VariantManager {
    /// Creates a manager over `archive`.
    ///
    /// The archive is listed once here; piece files added afterwards are not
    /// picked up.
    pub fn new(
        archive: Arc<dyn TemplateArchive>,
        compiler: Arc<dyn ShaderCompiler>,
        lights: Arc<dyn LightSource>,
        settings: VariantSettings,
    ) -> Self {
        sigil_core::interner::preload_common_properties();

        let mut names = archive.list();
        names.sort_unstable();

        let piece_files = ShaderStage::ALL.map(|stage| {
            names
                .iter()
                .filter(|name| name.to_lowercase().contains(stage.piece_pattern()))
                .cloned()
                .collect::<Vec<_>>()
        });

        for stage in ShaderStage::ALL {
            let files = &piece_files[stage.index()];
            if !files.is_empty() {
                log::debug!("{stage} piece files: {files:?}");
            }
        }

        Self {
            archive,
            lights,
            compiler: RwLock::new(compiler),
            engine: TemplateEngine::with_max_passes(settings.max_expansion_passes),
            settings,
            piece_files,
            renderables: RenderableCache::new(),
            programs: Mutex::new(ShaderProgramCache::new()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &VariantSettings {
        &self.settings
    }

    /// Piece files processed for `stage`, in processing order.
    #[must_use]
    pub fn piece_files(&self, stage: ShaderStage) -> &[String] {
        &self.piece_files[stage.index()]
    }

    #[must_use]
    pub fn renderable_cache(&self) -> &RenderableCache {
        &self.renderables
    }

    /// Number of cached shader variants.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.programs.lock().len()
    }

    /// Replaces the compiler backend. Programs compiled by the previous
    /// backend are dropped; renderable snapshots are kept.
    pub fn set_compiler(&self, compiler: Arc<dyn ShaderCompiler>) {
        let mut programs = self.programs.lock();
        *self.compiler.write() = compiler;
        let dropped = programs.len();
        programs.clear();
        log::info!("Shader compiler changed, dropped {dropped} cached variants");
    }

    // ========================================================================
    // Renderable properties
    // ========================================================================

    /// Derives the renderable properties of `renderable` from its vertex
    /// layout and material parameters.
    #[must_use]
    pub fn renderable_properties(renderable: &dyn RenderableSource) -> PropertyTable {
        let mut props = PropertyTable::with_capacity(16);

        props.set(p::SKELETON, i32::from(renderable.num_world_transforms() > 1));

        let mut uv_count = 0;
        let mut normal_mapping_possible = false;

        for element in renderable.vertex_elements() {
            let components = i32::from(element.element_type.component_count());
            match element.semantic {
                VertexSemantic::Normal => {
                    if components < 4 {
                        props.set(p::NORMAL, 1);
                    } else {
                        // Four components encode a full tangent frame.
                        normal_mapping_possible = true;
                        props.set(p::QTANGENT, 1);
                    }
                }
                VertexSemantic::Tangent => normal_mapping_possible = true,
                VertexSemantic::Diffuse => props.set(p::COLOUR, 1),
                VertexSemantic::TextureCoordinates => {
                    let index = usize::from(element.index);
                    match p::uv_count_n(index) {
                        Some(key) => {
                            uv_count = uv_count.max(i32::from(element.index) + 1);
                            props.set(key, components);
                        }
                        None => log::warn!("UV set {index} exceeds {} and is ignored", p::MAX_UV_SETS),
                    }
                }
                VertexSemantic::BlendWeights => props.set(p::BONES_PER_VERTEX, components),
                _ => {}
            }
        }

        props.set(p::UV_COUNT, uv_count);

        let params = renderable.material_params();
        if params.contains(p::DIFFUSE_MAP) {
            props.set(p::DIFFUSE_MAP, 1);
        }
        if normal_mapping_possible && params.contains(p::NORMAL_MAP) {
            props.set(p::NORMAL_MAP, 1);
        }
        if params.contains(p::SPECULAR_MAP) {
            props.set(p::SPECULAR_MAP, 1);
        }
        if params.contains(p::ENVPROBE_MAP) {
            props.set(p::ENVPROBE_MAP, 1);
        }
        if params.contains(p::ALPHA_TEST) {
            props.set(p::ALPHA_TEST, 1);
        }

        props
    }

    /// The reduced property set used for shadow caster passes.
    #[must_use]
    pub fn caster_properties(renderable_properties: &PropertyTable) -> PropertyTable {
        let mut props = renderable_properties.clone();
        for key in [p::NORMAL, p::QTANGENT, p::NORMAL_MAP, p::SPECULAR_MAP, p::ENVPROBE_MAP] {
            props.set(key, 0);
        }
        if !props.is_enabled(p::ALPHA_TEST) {
            props.set(p::UV_COUNT, 0);
            props.set(p::DIFFUSE_MAP, 0);
        }
        props
    }

    /// Hashes `renderable` for regular and caster passes and caches both
    /// property snapshots.
    pub fn calculate_hash_for(&self, renderable: &dyn RenderableSource) -> RenderableHashes {
        let props = Self::renderable_properties(renderable);
        let hash = VariantHasher::pack_renderable_bits(&props);
        self.renderables.add(hash, &props);

        let caster_props = Self::caster_properties(&props);
        let caster_hash = VariantHasher::pack_renderable_bits(&caster_props);
        debug_assert_eq!(caster_hash, VariantHasher::apply_caster_mask(hash));
        self.renderables.add(caster_hash, &caster_props);

        RenderableHashes { hash, caster_hash }
    }

    // ========================================================================
    // Pass properties
    // ========================================================================

    /// Derives the pass properties for the current light and shadow setup.
    #[must_use]
    pub fn prepare_pass_hash(
        &self,
        shadow_node: Option<&dyn ShadowNode>,
        caster_pass: bool,
        dual_paraboloid: bool,
    ) -> PassCache {
        let mut props = PropertyTable::with_capacity(10);

        if caster_pass {
            props.set(p::SHADOW_CASTER, 1);
            props.set(p::DUAL_PARABOLOID_MAPPING, i32::from(dual_paraboloid));
            for key in [
                p::NUM_SHADOW_MAPS,
                p::PSSM_SPLITS,
                p::LIGHTS_ATTENUATION,
                p::LIGHTS_SPOTPARAMS,
                p::LIGHTS_DIRECTIONAL,
                p::LIGHTS_POINT,
                p::LIGHTS_SPOT,
            ] {
                props.set(key, 0);
            }
        } else {
            let directional = self
                .lights
                .global_lights()
                .iter()
                .filter(|&&light| light == LightType::Directional)
                .count() as i32;

            if let Some(node) = shadow_node {
                let pssm_splits = node
                    .pssm_splits()
                    .map_or(0, |splits| splits.len().saturating_sub(1) as i32);
                props.set(p::PSSM_SPLITS, pssm_splits);

                let mut shadow_maps = node.num_shadow_casting_lights() as i32;
                if pssm_splits > 0 {
                    shadow_maps += pssm_splits - 1;
                }
                props.set(p::NUM_SHADOW_MAPS, shadow_maps);

                let casting = node.shadow_casting_lights();
                let count = |ty: LightType| casting.iter().filter(|&&light| light == ty).count() as i32;
                let point = count(LightType::Point);
                let spot = count(LightType::Spot);

                props.set(p::LIGHTS_ATTENUATION, point + spot);
                props.set(p::LIGHTS_SPOTPARAMS, spot);

                // Cumulative in the order directional, point, spot.
                props.set(p::LIGHTS_DIRECTIONAL, directional);
                props.set(p::LIGHTS_POINT, directional + point);
                props.set(p::LIGHTS_SPOT, directional + point + spot);
            } else {
                for key in [
                    p::NUM_SHADOW_MAPS,
                    p::PSSM_SPLITS,
                    p::LIGHTS_ATTENUATION,
                    p::LIGHTS_SPOTPARAMS,
                ] {
                    props.set(key, 0);
                }
                props.set(p::LIGHTS_DIRECTIONAL, directional);
                props.set(p::LIGHTS_POINT, directional);
                props.set(p::LIGHTS_SPOT, directional);
            }
        }

        PassCache {
            hash: VariantHasher::pack_pass_bits(&props),
            caster_pass,
            properties: props,
        }
    }

    // ========================================================================
    // Program lookup
    // ========================================================================

    /// Final cache key of a renderable drawn in `pass`.
    #[must_use]
    pub fn final_hash(pass: &PassCache, renderable: RenderableHashes, casts_shadows: bool) -> u32 {
        let renderable_hash = if pass.caster_pass {
            renderable.caster_hash
        } else {
            renderable.hash
        };
        VariantHasher::combine(
            renderable_hash,
            VariantHasher::mask_pass_hash(pass.hash, casts_shadows),
        )
    }

    /// Returns the programs for `renderable` in `pass`, generating and
    /// compiling them on first use.
    ///
    /// `last_returned` is the value this call returned for the previous
    /// renderable; it is handed back untouched when the final hash matches.
    pub fn get_material(
        &self,
        last_returned: Option<&Arc<ShaderPrograms>>,
        pass: &PassCache,
        renderable: RenderableHashes,
        casts_shadows: bool,
    ) -> Result<Arc<ShaderPrograms>> {
        let final_hash = Self::final_hash(pass, renderable, casts_shadows);

        if let Some(last) = last_returned
            && last.hash() == final_hash
        {
            return Ok(Arc::clone(last));
        }

        let renderable_hash = if pass.caster_pass {
            renderable.caster_hash
        } else {
            renderable.hash
        };

        let mut programs = self.programs.lock();

        if let Some(entry) = programs.get(final_hash) {
            if self.settings.verify_collisions {
                let merged = self.merged_properties(renderable_hash, pass)?;
                let seen = Self::collision_snapshot(&merged, casts_shadows);
                if entry.properties.as_ref().is_some_and(|stored| *stored != seen) {
                    log::error!("Variant {final_hash:#010x} reached by two different property sets");
                    return Err(SigilError::HashCollision { hash: final_hash });
                }
            }
            log::debug!("Variant cache hit {final_hash:#010x}");
            return Ok(Arc::clone(&entry.programs));
        }

        let mut properties = self.merged_properties(renderable_hash, pass)?;
        let snapshot = self
            .settings
            .verify_collisions
            .then(|| Self::collision_snapshot(&properties, casts_shadows));

        let compiler = Arc::clone(&*self.compiler.read());
        let created = Arc::new(self.create_programs(final_hash, &mut properties, compiler.as_ref())?);
        programs.add(Arc::clone(&created), snapshot);

        log::debug!(
            "Compiled variant {final_hash:#010x} ({} stages, {} cached)",
            created.stages().len(),
            programs.len()
        );
        Ok(created)
    }

    /// Properties stored with a program for collision checks. Keys hidden
    /// by the pass mask are cleared.
    fn collision_snapshot(properties: &PropertyTable, casts_shadows: bool) -> PropertyTable {
        let mut snapshot = properties.clone();
        VariantHasher::mask_pass_properties(&mut snapshot, casts_shadows);
        snapshot
    }

    /// Hashes `renderable` and resolves its programs for `pass`.
    pub fn resolve(
        &self,
        renderable: &dyn RenderableSource,
        pass: &PassCache,
        casts_shadows: bool,
    ) -> Result<Arc<ShaderPrograms>> {
        let hashes = self.calculate_hash_for(renderable);
        self.get_material(None, pass, hashes, casts_shadows)
    }

    /// Cached renderable properties with the pass properties applied on top.
    fn merged_properties(&self, renderable_hash: u32, pass: &PassCache) -> Result<PropertyTable> {
        let renderable = self
            .renderables
            .get(renderable_hash)
            .ok_or(SigilError::UnknownRenderable {
                hash: renderable_hash,
            })?;
        Ok(renderable.merged_with(&pass.properties))
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Runs the templates of every stage against `properties` without
    /// compiling anything.
    ///
    /// Stages without a main template are skipped.
    pub fn generate_sources(&self, properties: &PropertyTable) -> Result<Vec<StageSource>> {
        let mut properties = properties.clone();
        let mut sources = Vec::with_capacity(ShaderStage::COUNT);
        for stage in ShaderStage::ALL {
            if let Some(source) = self.generate_stage(stage, &mut properties)? {
                sources.push(source);
            }
        }
        Ok(sources)
    }

    /// Generates one stage. Properties changed by template directives stay
    /// changed for the following stages.
    fn generate_stage(
        &self,
        stage: ShaderStage,
        properties: &mut PropertyTable,
    ) -> Result<Option<StageSource>> {
        let mut pieces = Pieces::new();

        // Piece files run even without a main template; their property
        // changes carry over to the following stages.
        for file in &self.piece_files[stage.index()] {
            let text = self.archive.read(file)?;
            let mut diag = Diagnostics::for_template(file.as_str());
            self.engine
                .process_piece_file(&text, properties, &mut pieces, &mut diag);
            self.check_diagnostics(file, &diag)?;
        }

        let template = self.settings.template_file(stage.template_stem());
        if !self.archive.exists(&template) {
            return Ok(None);
        }

        let text = self.archive.read(&template)?;
        let mut diag = Diagnostics::for_template(template.as_str());
        let mut source = self
            .engine
            .process_template(&text, properties, &mut pieces, &mut diag);
        self.check_diagnostics(&template, &diag)?;

        if self.settings.resolve_includes {
            source = resolve_includes(&source, &template, &ArchiveIncludes(self.archive.as_ref()))?;
        }

        Ok(Some(StageSource {
            stage,
            template,
            source,
        }))
    }

    fn check_diagnostics(&self, template: &str, diag: &Diagnostics) -> Result<()> {
        match diag.first() {
            Some(error) if self.settings.strict_templates => Err(SigilError::Syntax {
                template: template.to_string(),
                error: error.clone(),
            }),
            Some(_) => {
                log::warn!(
                    "Template '{template}' produced {} syntax error(s); affected blocks were dropped",
                    diag.len()
                );
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn create_programs(
        &self,
        final_hash: u32,
        properties: &mut PropertyTable,
        compiler: &dyn ShaderCompiler,
    ) -> Result<ShaderPrograms> {
        let mut stages: [Option<ProgramHandle>; ShaderStage::COUNT] = Default::default();
        let mut compiled: SmallVec<[ShaderStage; ShaderStage::COUNT]> = SmallVec::new();

        for stage in ShaderStage::ALL {
            let Some(generated) = self.generate_stage(stage, properties)? else {
                continue;
            };

            let name = format!("{final_hash}{}", stage.template_stem());

            if let Some(dir) = &self.settings.debug_output {
                let header = self.settings.debug_output_properties.then_some(&*properties);
                write_debug_source(dir, &name, header, &generated.source);
            }

            let request = CompileRequest {
                stage,
                name: &name,
                source: &generated.source,
                profile: &self.settings.shader_profile,
            };
            let handle = compiler.compile(&request).inspect_err(|e| log::error!("{e}"))?;

            stages[stage.index()] = Some(handle);
            compiled.push(stage);
        }

        if compiled.is_empty() {
            log::warn!("Variant {final_hash:#010x} has no stage templates");
        }

        Ok(ShaderPrograms::new(final_hash, stages))
    }
}

fn write_debug_source(dir: &Path, name: &str, properties: Option<&PropertyTable>, source: &str) {
    let mut text = String::with_capacity(source.len());
    if let Some(properties) = properties {
        text.push_str("#if 0\n");
        for (key, value) in properties.iter_named() {
            let _ = writeln!(text, "\t***\t{key}\t{value}");
        }
        text.push_str("\tDONE DUMPING PROPERTIES\n#endif\n");
    }
    text.push_str(source);

    let path = dir.join(name);
    if let Err(e) = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, text)) {
        log::warn!("Failed to write debug shader {}: {e}", path.display());
    }
}
