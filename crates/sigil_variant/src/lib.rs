//! Shader variant selection for the Sigil engine.
//!
//! - [`VariantHasher`]: packs renderable and pass properties into hashes
//! - [`RenderableCache`] / [`ShaderProgramCache`]: hash-keyed caches
//! - [`VariantManager`]: drives template generation and compilation on cache
//!   misses
//! - [`TemplateArchive`], [`ShaderCompiler`], [`LightSource`], [`ShadowNode`]:
//!   the collaborators the manager is built over

pub mod archive;
pub mod cache;
pub mod compiler;
pub mod hasher;
pub mod manager;
pub mod properties;
pub mod scene;
pub mod settings;

pub use archive::{DirectoryArchive, MemoryArchive, TemplateArchive};
pub use cache::{ProgramEntry, RenderableCache, ShaderProgramCache, ShaderPrograms, VariantCache};
pub use compiler::{CompileRequest, ProgramHandle, ShaderCompiler};
pub use hasher::VariantHasher;
pub use manager::{PassCache, RenderableHashes, StageSource, VariantManager};
pub use scene::{
    LightList, LightSource, LightType, MaterialParams, RenderableDesc, RenderableSource,
    ShadowNode, ShadowNodeDesc, VertexElement, VertexElementType, VertexSemantic,
};
pub use settings::VariantSettings;
