//! `@property(expression) body @end`
//!
//! Keeps `body` when the expression evaluates to true and drops it otherwise.

use sigil_core::PropertyTable;

use crate::args::{self, Parenthesized};
use crate::diagnostics::Diagnostics;
use crate::expression;
use crate::rescan;
use crate::span::Span;

const KEYWORD: &str = "@property";

fn evaluate_once(
    input: &str,
    properties: &PropertyTable,
    diag: &mut Diagnostics,
) -> (String, usize) {
    let mut out = String::with_capacity(input.len());
    let mut consumed = 0;
    let mut rest = Span::new(input);

    while let Some(at) = rest.find(KEYWORD) {
        out.push_str(rest.truncate_to(at).as_str());
        let after_keyword = rest.advance_to(at + KEYWORD.len());
        let parsed = args::read_parenthesized(after_keyword, "property", diag);
        let (expr, after_args) = match parsed {
            Parenthesized::Found { inner, rest } => (inner, rest),
            Parenthesized::Missing => {
                out.push_str(KEYWORD);
                rest = after_keyword;
                continue;
            }
            Parenthesized::Unterminated => {
                rest = rest.exhausted();
                break;
            }
        };
        consumed += 1;

        let Some((body, after_block)) = args::split_block(after_args, at, diag) else {
            rest = rest.exhausted();
            break;
        };

        match expression::evaluate(expr, properties) {
            Ok(true) => out.push_str(body.as_str()),
            Ok(false) => {}
            Err((pos, kind)) => diag.report(input, pos, kind),
        }

        rest = after_block;
    }

    out.push_str(rest.as_str());
    (out, consumed)
}

/// Resolves `@property` blocks, re-scanning kept bodies so nested blocks
/// are evaluated too.
pub(crate) fn evaluate(
    input: &str,
    properties: &PropertyTable,
    diag: &mut Diagnostics,
    max_passes: usize,
) -> String {
    rescan::until_stable(input, KEYWORD, "property", diag, max_passes, |text, diag| {
        evaluate_once(text, properties, diag)
    })
}
