//! Core types shared by every Sigil crate.
//!
//! - [`interner`]: global string interner producing [`Symbol`]s
//! - [`PropertyTable`]: sorted integer property set driving shader generation
//! - [`ShaderStage`]: the five programmable stages
//! - [`errors`]: fatal [`SigilError`] and non-fatal [`SyntaxError`]

pub mod errors;
pub mod interner;
pub mod property;
pub mod stage;

pub use errors::{CompileError, Result, SigilError, SyntaxError, SyntaxErrorKind};
pub use interner::Symbol;
pub use property::{Property, PropertyTable};
pub use stage::ShaderStage;
