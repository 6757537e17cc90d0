//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! Two families of failure exist and they propagate differently:
//!
//! - [`SyntaxError`]: malformed template input. Template passes report these
//!   through a diagnostics collector and keep going; the affected block
//!   expands to nothing.
//! - [`SigilError`]: failures fatal to a compilation request (compiler
//!   rejection, broken `#include`, I/O). These are returned to the caller.
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, SigilError>`.

use thiserror::Error;

use crate::stage::ShaderStage;

/// The main error type for the Sigil engine.
#[derive(Error, Debug)]
pub enum SigilError {
    // ========================================================================
    // Compilation Errors
    // ========================================================================
    /// The compiler collaborator rejected generated source.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A template syntax error, only raised when strict templates are enabled.
    #[error("Template '{template}': {error}")]
    Syntax {
        /// Name of the template file that failed
        template: String,
        /// First error reported for that template
        error: SyntaxError,
    },

    /// Badly formed or unresolvable `#include` directive.
    #[error("Include error in '{file}': {message}")]
    Include {
        /// File containing the offending directive
        file: String,
        /// What went wrong
        message: String,
    },

    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// A cached program was found whose source properties differ from the
    /// request's, meaning two variants share a 32-bit hash.
    #[error("Shader variant hash collision on {hash:#010x}")]
    HashCollision {
        /// The colliding final hash
        hash: u32,
    },

    /// A material was requested for a renderable hash that was never
    /// registered in the renderable cache.
    #[error("Unknown renderable hash {hash:#010x}")]
    UnknownRenderable {
        /// The renderable (or caster) hash that was looked up
        hash: u32,
    },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A template file is missing from the archive.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error (settings files).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Failure reported by a shader compiler backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to compile {stage} program '{program}': {message}")]
pub struct CompileError {
    /// Program name handed to the compiler
    pub program: String,
    /// Stage being compiled
    pub stage: ShaderStage,
    /// Compiler diagnostics
    pub message: String,
}

/// A template syntax error with the 1-based line it was detected on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Syntax Error at line {line}: {kind}")]
pub struct SyntaxError {
    pub line: usize,
    pub kind: SyntaxErrorKind,
}

/// What kind of malformed template input was found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("start block (e.g. @foreach; @property) without matching @end")]
    UnmatchedBlock,

    #[error("opening parenthesis without matching closure")]
    UnmatchedParenthesis,

    #[error("@{0} expects an argument list in parentheses")]
    MissingArguments(&'static str),

    #[error("unexpected character '{0}' in argument list")]
    UnexpectedArgumentChar(char),

    #[error("value expected before delimiter; ',' or ')' expected")]
    ValueExpected,

    #[error("unrecognized token '{0}'")]
    UnexpectedToken(String),

    #[error("expression ends with an operator")]
    DanglingOperator,

    #[error("empty expression")]
    EmptyExpression,

    #[error("invalid parameter (@foreach): '{0}' is not a number nor a variable")]
    InvalidForeachParameter(String),

    #[error("@{directive} expects {expected} parameter(s), got {found}")]
    ArgumentCount {
        directive: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("@piece '{0}' already defined")]
    PieceRedefined(String),

    #[error("division by zero in @{0}")]
    DivisionByZero(&'static str),

    #[error("@{0} expansion did not settle after {1} passes")]
    ExpansionLimit(&'static str, usize),
}

/// Alias for `Result<T, SigilError>`.
pub type Result<T> = std::result::Result<T, SigilError>;
