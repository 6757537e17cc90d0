//! Argument lists and block delimiting shared by all directives.
//!
//! A directive looks like `@name(args)` and, for block directives
//! (`@foreach`, `@property`, `@piece`), is followed by a body closed by the
//! matching `@end`.

use smallvec::SmallVec;

use sigil_core::SyntaxErrorKind;

use crate::diagnostics::Diagnostics;
use crate::span::Span;

/// Directives that open a block closed by `@end`.
const BLOCK_OPENERS: [&str; 3] = ["foreach", "property", "piece"];

const END: &str = "end";

/// Length of the `@end` terminator.
pub(crate) const END_LEN: usize = 4;

pub(crate) type ArgList<'a> = SmallVec<[&'a str; 4]>;

/// Result of reading the parenthesized text following a directive keyword.
pub(crate) enum Parenthesized<'a> {
    /// `inner` is the text between the parentheses; `rest` starts after `)`.
    Found { inner: Span<'a>, rest: Span<'a> },
    /// No `(` follows the keyword. The directive is left as literal text.
    Missing,
    /// `(` without a matching `)`. Nothing after it can be trusted.
    Unterminated,
}

/// Result of reading a comma-separated argument list.
pub(crate) enum Arguments<'a> {
    Parsed { values: ArgList<'a>, rest: Span<'a> },
    /// The list was delimited correctly but its content is malformed.
    Invalid { rest: Span<'a> },
    Missing,
    Unterminated,
}

/// Reads `( ... )` starting at the first non-blank character of `rest`.
///
/// Errors are reported into `diag`.
pub(crate) fn read_parenthesized<'a>(
    rest: Span<'a>,
    directive: &'static str,
    diag: &mut Diagnostics,
) -> Parenthesized<'a> {
    let bytes = rest.bytes();
    let skipped = bytes
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();

    if bytes.get(skipped) != Some(&b'(') {
        diag.report(
            rest.source(),
            rest.start(),
            SyntaxErrorKind::MissingArguments(directive),
        );
        return Parenthesized::Missing;
    }

    let open = rest.start() + skipped;
    let inner_start = open + 1;
    match find_expression_end(rest.advance_to(inner_start)) {
        Some(close) => Parenthesized::Found {
            inner: rest.advance_to(inner_start).truncate_to(close),
            rest: rest.advance_to(close + 1),
        },
        None => {
            diag.report(
                rest.source(),
                open,
                SyntaxErrorKind::UnmatchedParenthesis,
            );
            Parenthesized::Unterminated
        }
    }
}

/// Absolute offset of the `)` closing an expression whose `(` precedes `span`.
///
/// Scans until the parenthesis nesting goes negative.
#[must_use]
pub(crate) fn find_expression_end(span: Span<'_>) -> Option<usize> {
    let mut nesting: i32 = 0;
    for (i, &b) in span.bytes().iter().enumerate() {
        match b {
            b'(' => nesting += 1,
            b')' => {
                nesting -= 1;
                if nesting < 0 {
                    return Some(span.start() + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads `(a, b, c)` after a directive keyword.
pub(crate) fn read_arguments<'a>(
    rest: Span<'a>,
    directive: &'static str,
    diag: &mut Diagnostics,
) -> Arguments<'a> {
    match read_parenthesized(rest, directive, diag) {
        Parenthesized::Found { inner, rest } => match split_arguments(inner) {
            Ok(values) => Arguments::Parsed { values, rest },
            Err((pos, kind)) => {
                diag.report(inner.source(), pos, kind);
                Arguments::Invalid { rest }
            }
        },
        Parenthesized::Missing => Arguments::Missing,
        Parenthesized::Unterminated => Arguments::Unterminated,
    }
}

/// Splits an argument list on commas.
///
/// Blanks around a value are ignored; a blank *inside* a value (followed by
/// more non-blank characters before the next delimiter) is an error, as are
/// parentheses, `@`, `&` and `|`. An empty list yields no arguments.
pub(crate) fn split_arguments(inner: Span<'_>) -> Result<ArgList<'_>, (usize, SyntaxErrorKind)> {
    #[derive(PartialEq)]
    enum State {
        BeforeValue,
        InValue,
        AfterValue,
    }

    let src = inner.source();
    let mut values = ArgList::new();
    let mut state = State::BeforeValue;
    let mut value_start = inner.start();
    let mut value_end = inner.start();
    let mut saw_comma = false;

    for (i, ch) in inner.as_str().char_indices() {
        let pos = inner.start() + i;
        match ch {
            '(' | ')' | '@' | '&' | '|' => {
                return Err((pos, SyntaxErrorKind::UnexpectedArgumentChar(ch)));
            }
            ' ' | '\t' | '\n' | '\r' => {
                if state == State::InValue {
                    state = State::AfterValue;
                }
            }
            ',' => {
                values.push(&src[value_start..value_end]);
                saw_comma = true;
                state = State::BeforeValue;
                value_start = pos + 1;
                value_end = pos + 1;
            }
            _ => match state {
                State::AfterValue => return Err((pos, SyntaxErrorKind::ValueExpected)),
                State::BeforeValue => {
                    state = State::InValue;
                    value_start = pos;
                    value_end = pos + ch.len_utf8();
                }
                State::InValue => value_end = pos + ch.len_utf8(),
            },
        }
    }

    if saw_comma || state != State::BeforeValue {
        values.push(&src[value_start..value_end]);
    }

    Ok(values)
}

/// Finds the `@end` closing the block whose body starts at `body`.
///
/// Nested `@foreach`, `@property` and `@piece` openers increase the nesting
/// level and each `@end` decreases it; the block ends at the `@end` that
/// takes the level below zero. Returns the absolute offset of that `@end`.
#[must_use]
pub(crate) fn find_block_end(body: Span<'_>) -> Option<usize> {
    let bytes = body.bytes();
    let mut nesting: i32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'@' {
            let tail = &bytes[i + 1..];
            if tail.starts_with(END.as_bytes()) {
                nesting -= 1;
                if nesting < 0 {
                    return Some(body.start() + i);
                }
                i += END.len();
            } else if let Some(name) = BLOCK_OPENERS
                .iter()
                .find(|name| tail.starts_with(name.as_bytes()))
            {
                nesting += 1;
                i += name.len();
            }
        }
        i += 1;
    }

    None
}

/// Splits the text after a block directive's argument list into the block
/// body and whatever follows its `@end`.
///
/// `directive_at` locates the directive for error reporting.
pub(crate) fn split_block<'a>(
    after_args: Span<'a>,
    directive_at: usize,
    diag: &mut Diagnostics,
) -> Option<(Span<'a>, Span<'a>)> {
    if let Some(end_at) = find_block_end(after_args) {
        Some((
            after_args.truncate_to(end_at),
            after_args.advance_to(end_at + END_LEN),
        ))
    } else {
        diag.report(
            after_args.source(),
            directive_at,
            SyntaxErrorKind::UnmatchedBlock,
        );
        None
    }
}
