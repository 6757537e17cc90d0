#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Sigil: shader variant generation and caching.
//!
//! Umbrella crate over the workspace members:
//!
//! - [`core`]: properties, interning, stages and errors
//! - [`template`]: the `@`-directive template engine
//! - [`variant`]: hashing, caches and the [`VariantManager`]

pub use sigil_core as core;
pub use sigil_template as template;
pub use sigil_variant as variant;

pub use sigil_core::{
    CompileError, PropertyTable, Result, ShaderStage, SigilError, SyntaxError, SyntaxErrorKind,
    interner,
};
pub use sigil_template::{Diagnostics, Pieces, TemplateEngine, resolve_includes};
pub use sigil_variant::{
    CompileRequest, DirectoryArchive, MemoryArchive, PassCache, ProgramHandle, RenderableHashes,
    ShaderCompiler, ShaderPrograms, TemplateArchive, VariantHasher, VariantManager,
    VariantSettings,
};

/// Commonly used items.
pub mod prelude {
    pub use sigil_core::{PropertyTable, Result, ShaderStage, SigilError};
    pub use sigil_template::{Diagnostics, Pieces, TemplateEngine};
    pub use sigil_variant::properties;
    pub use sigil_variant::{
        CompileRequest, DirectoryArchive, LightSource, LightType, MaterialParams, MemoryArchive,
        PassCache, ProgramHandle, RenderableDesc, RenderableHashes, RenderableSource,
        ShaderCompiler, ShaderPrograms, ShadowNode, ShadowNodeDesc, TemplateArchive,
        VariantHasher, VariantManager, VariantSettings, VertexElement, VertexElementType,
        VertexSemantic,
    };
}
