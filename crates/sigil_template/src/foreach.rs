//! `@foreach(count[, counter[, start]]) body @end`
//!
//! Repeats `body` for `i` in `start..count`, replacing `@counter` tokens in
//! the body with the decimal value of `i`. `count` and `start` are integer
//! literals or property names.

use std::fmt::Write as _;

use sigil_core::{PropertyTable, SyntaxErrorKind};

use crate::args::{self, Arguments};
use crate::diagnostics::Diagnostics;
use crate::rescan;
use crate::span::{Span, is_ident_byte};

const KEYWORD: &str = "@foreach";

/// Expands every `@foreach` block of `input` once, left to right, and
/// returns the text with the number of blocks consumed.
///
/// Loops nested inside a loop body are copied as text and need another pass;
/// see [`expand`].
pub(crate) fn expand_once(
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

        let (values, after_args) = match args::read_arguments(after_keyword, "foreach", diag) {
            Arguments::Parsed { values, rest } => (Some(values), rest),
            Arguments::Invalid { rest } => (None, rest),
            Arguments::Missing => {
                out.push_str(KEYWORD);
                rest = after_keyword;
                continue;
            }
            Arguments::Unterminated => {
                rest = rest.exhausted();
                break;
            }
        };
        consumed += 1;

        let Some((body, after_block)) = args::split_block(after_args, at, diag) else {
            rest = rest.exhausted();
            break;
        };

        if let Some(values) = values {
            match loop_bounds(&values, properties) {
                Ok((start, count)) => {
                    let counter = values.get(1).copied().unwrap_or_default();
                    for i in start..count {
                        repeat(&mut out, body.as_str(), counter, i);
                    }
                }
                Err(kind) => diag.report(input, at, kind),
            }
        }

        rest = after_block;
    }

    out.push_str(rest.as_str());
    (out, consumed)
}

/// Expands `@foreach` blocks until none remain, so loops nested in loop
/// bodies are evaluated once per outer iteration.
pub(crate) fn expand(
    input: &str,
    properties: &PropertyTable,
    diag: &mut Diagnostics,
    max_passes: usize,
) -> String {
    rescan::until_stable(input, KEYWORD, "foreach", diag, max_passes, |text, diag| {
        expand_once(text, properties, diag)
    })
}

/// Resolves `(start, count)` from the argument list.
fn loop_bounds(
    values: &[&str],
    properties: &PropertyTable,
) -> Result<(i32, i32), SyntaxErrorKind> {
    if values.is_empty() || values.len() > 3 {
        return Err(SyntaxErrorKind::ArgumentCount {
            directive: "foreach",
            expected: "one to three",
            found: values.len(),
        });
    }

    let count = resolve_integer(values[0], properties)
        .ok_or_else(|| SyntaxErrorKind::InvalidForeachParameter(values[0].to_string()))?;

    let start = match values.get(2) {
        Some(arg) => resolve_integer(arg, properties)
            .ok_or_else(|| SyntaxErrorKind::InvalidForeachParameter((*arg).to_string()))?,
        None => 0,
    };

    Ok((start, count))
}

/// Integer literal, else the value of the named property; negative or
/// unknown values are rejected.
fn resolve_integer(arg: &str, properties: &PropertyTable) -> Option<i32> {
    let value = leading_integer(arg).unwrap_or_else(|| properties.get_or(arg, -1));
    (value >= 0).then_some(value)
}

/// Value of the decimal digits `arg` starts with (after an optional sign),
/// ignoring whatever follows them: `3abc` reads as 3. Out of range values
/// saturate. `None` when `arg` does not start with a number.
fn leading_integer(arg: &str) -> Option<i32> {
    let trimmed = arg.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }

    let magnitude = digits[..len].bytes().fold(0i64, |acc, b| {
        (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1)
    });
    let value = if negative { -magnitude } else { magnitude };
    Some(i32::try_from(value).unwrap_or(if negative { i32::MIN } else { i32::MAX }))
}

/// Appends `body` to `out`, replacing `@<counter>` with `index`.
///
/// The token only matches when the counter name is not followed by another
/// identifier character, so `@n` does not clobber `@normal`.
fn repeat(out: &mut String, body: &str, counter: &str, index: i32) {
    if counter.is_empty() {
        out.push_str(body);
        return;
    }

    let bytes = body.as_bytes();
    let mut copied = 0;
    let mut search = 0;

    while let Some(rel) = body[search..].find('@') {
        let at = search + rel;
        let name_start = at + 1;
        let name_end = name_start + counter.len();

        let matches = body[name_start..].starts_with(counter)
            && bytes.get(name_end).is_none_or(|&b| !is_ident_byte(b));

        if matches {
            out.push_str(&body[copied..at]);
            let _ = write!(out, "{index}");
            copied = name_end;
            search = name_end;
        } else {
            search = name_start;
        }
    }

    out.push_str(&body[copied..]);
}
