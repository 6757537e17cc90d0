//! Directive-based shader template engine.
//!
//! Templates are plain shader source with `@`-directives:
//!
//! | Directive | Effect |
//! |---|---|
//! | `@property(expr) ... @end` | keep the block when `expr` is true |
//! | `@foreach(count, i, start) ... @end` | repeat the block, substituting `@i` |
//! | `@piece(name) ... @end` | store the block as a named piece |
//! | `@insertpiece(name)` | paste a stored piece |
//! | `@counter(p)` / `@value(p)` | emit (and for `@counter`, increment) a property |
//! | `@pset` `@padd` ... / `@set` `@add` ... | property arithmetic |
//!
//! [`TemplateEngine`] runs the passes; [`resolve_includes`] expands
//! `#include` lines of the generated source.

mod args;
mod arithmetic;
mod conditional;
mod expression;
mod foreach;
mod rescan;

pub mod diagnostics;
pub mod engine;
pub mod include;
pub mod piece;
pub mod span;

pub use diagnostics::Diagnostics;
pub use engine::{DEFAULT_MAX_PASSES, TemplateEngine};
pub use include::{IncludeSource, MAX_INCLUDE_DEPTH, resolve_includes};
pub use piece::Pieces;
pub use span::Span;
