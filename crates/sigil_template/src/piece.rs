//! Named text fragments.
//!
//! `@piece(name) body @end` removes the block from the output and stores
//! `body` under `name`; `@insertpiece(name)` is replaced with the stored body.
//! Pieces are usually defined in piece files and inserted by the main
//! template of the same stage.

use rustc_hash::FxHashMap;

use sigil_core::{Symbol, SyntaxErrorKind, interner};

use crate::args::{self, Arguments};
use crate::diagnostics::Diagnostics;
use crate::rescan;
use crate::span::Span;

const PIECE: &str = "@piece";
const INSERT: &str = "@insertpiece";

/// Piece bodies collected for one shader stage, keyed by interned name.
#[derive(Debug, Clone, Default)]
pub struct Pieces {
    bodies: FxHashMap<Symbol, String>,
}

impl Pieces {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let symbol = interner::get(name)?;
        self.bodies.get(&symbol).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Defines `name`. Returns `false` and keeps the existing body when the
    /// piece was already defined.
    pub fn define(&mut self, name: &str, body: impl Into<String>) -> bool {
        let symbol = interner::intern(name);
        if self.bodies.contains_key(&symbol) {
            return false;
        }
        self.bodies.insert(symbol, body.into());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Piece names, sorted for deterministic output.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.bodies.keys().map(|&s| interner::resolve(s)).collect();
        names.sort_unstable();
        names
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }
}

fn single_argument<'a>(
    values: &[&'a str],
    directive: &'static str,
) -> Result<&'a str, SyntaxErrorKind> {
    match values {
        [name] => Ok(*name),
        _ => Err(SyntaxErrorKind::ArgumentCount {
            directive,
            expected: "one",
            found: values.len(),
        }),
    }
}

/// Moves every `@piece` block of `input` into `pieces`.
///
/// A redefinition is reported and its body skipped; the first definition
/// wins.
pub(crate) fn collect(input: &str, pieces: &mut Pieces, diag: &mut Diagnostics) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = Span::new(input);

    while let Some(at) = rest.find(PIECE) {
        out.push_str(rest.truncate_to(at).as_str());
        let after_keyword = rest.advance_to(at + PIECE.len());

        let (name, after_args) = match args::read_arguments(after_keyword, "piece", diag) {
            Arguments::Parsed { values, rest } => match single_argument(&values, "piece") {
                Ok(name) => (Some(name), rest),
                Err(kind) => {
                    diag.report(input, at, kind);
                    (None, rest)
                }
            },
            Arguments::Invalid { rest } => (None, rest),
            Arguments::Missing => {
                out.push_str(PIECE);
                rest = after_keyword;
                continue;
            }
            Arguments::Unterminated => {
                rest = rest.exhausted();
                break;
            }
        };

        let Some((body, after_block)) = args::split_block(after_args, at, diag) else {
            rest = rest.exhausted();
            break;
        };

        if let Some(name) = name {
            if pieces.define(name, body.as_str()) {
                log::trace!("Collected piece '{name}' ({} bytes)", body.len());
            } else {
                diag.report(input, at, SyntaxErrorKind::PieceRedefined(name.to_string()));
            }
        }

        rest = after_block;
    }

    out.push_str(rest.as_str());
    out
}

fn insert_once(input: &str, pieces: &Pieces, diag: &mut Diagnostics) -> (String, usize) {
    let mut out = String::with_capacity(input.len());
    let mut consumed = 0;
    let mut rest = Span::new(input);

    while let Some(at) = rest.find(INSERT) {
        out.push_str(rest.truncate_to(at).as_str());
        let after_keyword = rest.advance_to(at + INSERT.len());

        match args::read_arguments(after_keyword, "insertpiece", diag) {
            Arguments::Parsed { values, rest: after } => {
                consumed += 1;
                match single_argument(&values, "insertpiece") {
                    Ok(name) => match pieces.get(name) {
                        Some(body) => out.push_str(body),
                        None => log::warn!("@insertpiece({name}): piece not defined, left empty"),
                    },
                    Err(kind) => diag.report(input, at, kind),
                }
                rest = after;
            }
            Arguments::Invalid { rest: after } => {
                consumed += 1;
                rest = after;
            }
            Arguments::Missing => {
                out.push_str(INSERT);
                rest = after_keyword;
            }
            Arguments::Unterminated => {
                rest = rest.exhausted();
                break;
            }
        }
    }

    out.push_str(rest.as_str());
    (out, consumed)
}

/// Replaces `@insertpiece` directives, re-scanning inserted bodies so
/// pieces that insert other pieces are expanded transitively.
pub(crate) fn insert(
    input: &str,
    pieces: &Pieces,
    diag: &mut Diagnostics,
    max_passes: usize,
) -> String {
    rescan::until_stable(input, INSERT, "insertpiece", diag, max_passes, |text, diag| {
        insert_once(text, pieces, diag)
    })
}
