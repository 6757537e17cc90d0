//! Template Engine
//!
//! Runs the directive passes over a template buffer in a fixed order:
//!
//! ```text
//! piece file:    math -> @foreach -> @property -> @piece
//! main template: math -> @foreach -> @property -> @piece -> @insertpiece -> counters
//! ```
//!
//! Each pass consumes the previous pass's output, so later passes never see
//! the directives earlier passes resolved. Piece files only contribute their
//! `@piece` definitions; their remaining text is discarded.
//!
//! Passes never fail. Malformed input is reported to a [`Diagnostics`]
//! collector and the affected block expands to nothing.

use sigil_core::PropertyTable;

use crate::diagnostics::Diagnostics;
use crate::piece::Pieces;
use crate::{arithmetic, conditional, foreach, piece};

/// Upper bound on re-scan iterations of the recursive passes.
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Stateless driver for the directive passes.
///
/// The property table and piece map are owned by the caller so one engine can
/// be shared by concurrent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateEngine {
    max_passes: usize,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Limits the re-scan loops of `@foreach`, `@property` and
    /// `@insertpiece`. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_passes(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }

    #[must_use]
    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    // ========================================================================
    // Individual passes
    // ========================================================================

    /// `@pset`, `@padd`, `@psub`, `@pmul`, `@pdiv`, `@pmod`.
    pub fn parse_math(
        &self,
        input: &str,
        properties: &mut PropertyTable,
        diag: &mut Diagnostics,
    ) -> String {
        arithmetic::parse_math(input, properties, diag)
    }

    /// Expands `@foreach` loops, including loops nested in loop bodies.
    pub fn parse_foreach(
        &self,
        input: &str,
        properties: &PropertyTable,
        diag: &mut Diagnostics,
    ) -> String {
        foreach::expand(input, properties, diag, self.max_passes)
    }

    /// Resolves `@property` blocks.
    pub fn parse_properties(
        &self,
        input: &str,
        properties: &PropertyTable,
        diag: &mut Diagnostics,
    ) -> String {
        conditional::evaluate(input, properties, diag, self.max_passes)
    }

    /// Moves `@piece` blocks into `pieces` and returns the remaining text.
    pub fn collect_pieces(
        &self,
        input: &str,
        pieces: &mut Pieces,
        diag: &mut Diagnostics,
    ) -> String {
        piece::collect(input, pieces, diag)
    }

    /// Substitutes `@insertpiece` directives.
    pub fn insert_pieces(&self, input: &str, pieces: &Pieces, diag: &mut Diagnostics) -> String {
        piece::insert(input, pieces, diag, self.max_passes)
    }

    /// `@counter`, `@value`, `@set`, `@add`, `@sub`, `@mul`, `@div`, `@mod`.
    pub fn parse_counters(
        &self,
        input: &str,
        properties: &mut PropertyTable,
        diag: &mut Diagnostics,
    ) -> String {
        arithmetic::parse_counters(input, properties, diag)
    }

    // ========================================================================
    // Pipelines
    // ========================================================================

    /// Runs a piece file through the collection pipeline, adding its
    /// definitions to `pieces`.
    pub fn process_piece_file(
        &self,
        input: &str,
        properties: &mut PropertyTable,
        pieces: &mut Pieces,
        diag: &mut Diagnostics,
    ) {
        let text = self.parse_math(input, properties, diag);
        let text = self.parse_foreach(&text, properties, diag);
        let text = self.parse_properties(&text, properties, diag);
        let _ = self.collect_pieces(&text, pieces, diag);
    }

    /// Runs a stage's main template through every pass and returns the final
    /// shader source.
    pub fn process_template(
        &self,
        input: &str,
        properties: &mut PropertyTable,
        pieces: &mut Pieces,
        diag: &mut Diagnostics,
    ) -> String {
        let text = self.parse_math(input, properties, diag);
        let text = self.parse_foreach(&text, properties, diag);
        let text = self.parse_properties(&text, properties, diag);
        let text = self.collect_pieces(&text, pieces, diag);
        let text = self.insert_pieces(&text, pieces, diag);
        self.parse_counters(&text, properties, diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_pipeline() {
        let engine = TemplateEngine::new();
        let mut props = PropertyTable::from([("hlms_uv_count", 2), ("hlms_normal", 1)]);
        let mut pieces = Pieces::new();
        let mut diag = Diagnostics::new();

        engine.process_piece_file(
            "@piece(VsOut)@foreach(hlms_uv_count, n)vec2 uv@n;\n@end@end ignored",
            &mut props,
            &mut pieces,
            &mut diag,
        );
        let out = engine.process_template(
            "@insertpiece(VsOut)@property(hlms_normal)vec3 n;@end\nloc @counter(slot) @counter(slot)",
            &mut props,
            &mut pieces,
            &mut diag,
        );

        assert!(diag.is_empty(), "{:?}", diag.errors());
        assert_eq!(out, "vec2 uv0;\nvec2 uv1;\nvec3 n;\nloc 0 1");
    }

    #[test]
    fn test_math_feeds_later_passes() {
        let engine = TemplateEngine::new();
        let mut props = PropertyTable::new();
        let mut pieces = Pieces::new();
        let mut diag = Diagnostics::new();

        let out = engine.process_template(
            "@pset(lights, 2)@padd(lights, 1)@foreach(lights, i)L@i @end",
            &mut props,
            &mut pieces,
            &mut diag,
        );
        assert!(diag.is_empty());
        assert_eq!(out, "L0 L1 L2 ");
    }

    #[test]
    fn test_errors_degrade_and_processing_continues() {
        let engine = TemplateEngine::new();
        let mut props = PropertyTable::from([("a", 1)]);
        let mut pieces = Pieces::new();
        let mut diag = Diagnostics::new();

        let out = engine.process_template(
            "@foreach(bogus, i)x@end ok @value(a)",
            &mut props,
            &mut pieces,
            &mut diag,
        );
        assert_eq!(out, " ok 1");
        assert_eq!(diag.len(), 1);
    }
}
