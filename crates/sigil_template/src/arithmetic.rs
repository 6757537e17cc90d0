//! Inline directives that read and write the property table.
//!
//! Two passes share this scanner:
//!
//! - the math pass runs first and understands `@pset`, `@padd`, `@psub`,
//!   `@pmul`, `@pdiv` and `@pmod`;
//! - the counter pass runs last and understands `@counter`, `@value` and the
//!   unprefixed `@set`, `@add`, `@sub`, `@mul`, `@div` and `@mod`.
//!
//! Arithmetic directives take `(dst, operand)` or `(dst, src, operand)` and
//! emit nothing. `operand` is an integer literal or a property name.
//! `@value(name)` emits the property's value; `@counter(name)` emits it and
//! then increments it.

use std::fmt::Write as _;

use sigil_core::{PropertyTable, SyntaxErrorKind};

use crate::args::{self, Arguments};
use crate::diagnostics::Diagnostics;
use crate::span::{Span, is_ident_byte};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Op {
    fn apply(self, lhs: i32, rhs: i32) -> Option<i32> {
        match self {
            Op::Set => Some(rhs),
            Op::Add => Some(lhs.wrapping_add(rhs)),
            Op::Sub => Some(lhs.wrapping_sub(rhs)),
            Op::Mul => Some(lhs.wrapping_mul(rhs)),
            Op::Div => (rhs != 0).then(|| lhs.wrapping_div(rhs)),
            Op::Mod => (rhs != 0).then(|| lhs.wrapping_rem(rhs)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Counter,
    Value,
    Arith(Op),
}

const MATH_DIRECTIVES: [(&str, Directive); 6] = [
    ("pset", Directive::Arith(Op::Set)),
    ("padd", Directive::Arith(Op::Add)),
    ("psub", Directive::Arith(Op::Sub)),
    ("pmul", Directive::Arith(Op::Mul)),
    ("pdiv", Directive::Arith(Op::Div)),
    ("pmod", Directive::Arith(Op::Mod)),
];

const COUNTER_DIRECTIVES: [(&str, Directive); 8] = [
    ("counter", Directive::Counter),
    ("value", Directive::Value),
    ("set", Directive::Arith(Op::Set)),
    ("add", Directive::Arith(Op::Add)),
    ("sub", Directive::Arith(Op::Sub)),
    ("mul", Directive::Arith(Op::Mul)),
    ("div", Directive::Arith(Op::Div)),
    ("mod", Directive::Arith(Op::Mod)),
];

/// Runs the `@p*` arithmetic directives.
pub(crate) fn parse_math(
    input: &str,
    properties: &mut PropertyTable,
    diag: &mut Diagnostics,
) -> String {
    run(input, &MATH_DIRECTIVES, properties, diag)
}

/// Runs `@counter`, `@value` and the unprefixed arithmetic directives.
pub(crate) fn parse_counters(
    input: &str,
    properties: &mut PropertyTable,
    diag: &mut Diagnostics,
) -> String {
    run(input, &COUNTER_DIRECTIVES, properties, diag)
}

fn run(
    input: &str,
    table: &[(&'static str, Directive)],
    properties: &mut PropertyTable,
    diag: &mut Diagnostics,
) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = Span::new(input);

    while let Some(at) = rest.find("@") {
        let name_start = at + 1;
        let name_len = input.as_bytes()[name_start..]
            .iter()
            .take_while(|&&b| is_ident_byte(b))
            .count();
        let name = &input[name_start..name_start + name_len];

        let Some(&(keyword, directive)) = table.iter().find(|(n, _)| *n == name) else {
            // Not ours; keep the `@` and look again after it.
            out.push_str(rest.truncate_to(name_start).as_str());
            rest = rest.advance_to(name_start);
            continue;
        };

        out.push_str(rest.truncate_to(at).as_str());
        let after_keyword = rest.advance_to(name_start + name_len);

        match args::read_arguments(after_keyword, keyword, diag) {
            Arguments::Parsed { values, rest: after } => {
                if let Err(kind) = execute(directive, keyword, &values, properties, &mut out) {
                    diag.report(input, at, kind);
                }
                rest = after;
            }
            Arguments::Invalid { rest: after } => rest = after,
            Arguments::Missing => {
                out.push_str(rest.advance_to(at).truncate_to(after_keyword.start()).as_str());
                rest = after_keyword;
            }
            Arguments::Unterminated => {
                rest = rest.exhausted();
                break;
            }
        }
    }

    out.push_str(rest.as_str());
    out
}

fn execute(
    directive: Directive,
    keyword: &'static str,
    values: &[&str],
    properties: &mut PropertyTable,
    out: &mut String,
) -> Result<(), SyntaxErrorKind> {
    match directive {
        Directive::Counter | Directive::Value => {
            let [name] = values else {
                return Err(SyntaxErrorKind::ArgumentCount {
                    directive: keyword,
                    expected: "one",
                    found: values.len(),
                });
            };
            let value = properties.get(name);
            let _ = write!(out, "{value}");
            if directive == Directive::Counter {
                properties.set(name, value.wrapping_add(1));
            }
        }
        Directive::Arith(op) => {
            let (dst, src, operand) = match values {
                [dst, operand] => (*dst, *dst, *operand),
                [dst, src, operand] => (*dst, *src, *operand),
                _ => {
                    return Err(SyntaxErrorKind::ArgumentCount {
                        directive: keyword,
                        expected: "two or three",
                        found: values.len(),
                    });
                }
            };
            let lhs = properties.get(src);
            let rhs = operand
                .parse::<i32>()
                .unwrap_or_else(|_| properties.get(operand));
            let result = op
                .apply(lhs, rhs)
                .ok_or(SyntaxErrorKind::DivisionByZero(keyword))?;
            properties.set(dst, result);
        }
    }
    Ok(())
}
