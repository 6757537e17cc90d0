//! Boolean expressions of `@property( ... )`.
//!
//! Grammar: identifiers, `&&`, `||`, parenthesized groups and a `!` prefix on
//! any operand. Identifiers resolve to `table.get(name) != 0`.
//!
//! Operators are **not** ranked. Operands are folded left to right starting
//! from `true` in AND mode, and each operator token switches the mode used for
//! every following operand until the next operator:
//!
//! ```text
//! a && b || c   ==>   ((true && a) && b) || c
//! a || b && c   ==>   ((true && a) || b) && c
//! ```
//!
//! Existing templates depend on this fold, so it must not be replaced by
//! conventional precedence.

use sigil_core::{PropertyTable, SyntaxErrorKind};

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node<'a> {
    Var { name: &'a str, negated: bool },
    Group { children: Vec<Node<'a>>, negated: bool },
    And,
    Or,
}

impl Node<'_> {
    fn token(&self) -> String {
        match self {
            Node::Var { name, .. } => (*name).to_string(),
            Node::Group { .. } => "(".to_string(),
            Node::And => "&&".to_string(),
            Node::Or => "||".to_string(),
        }
    }
}

/// Evaluates the expression text between `@property(` and its `)`.
///
/// On error returns the absolute offset and kind of the first problem found.
pub(crate) fn evaluate(
    expr: Span<'_>,
    properties: &PropertyTable,
) -> Result<bool, (usize, SyntaxErrorKind)> {
    let nodes = tokenize(expr)?;
    evaluate_nodes(&nodes, properties).map_err(|kind| (expr.start(), kind))
}

fn tokenize(expr: Span<'_>) -> Result<Vec<Node<'_>>, (usize, SyntaxErrorKind)> {
    let text = expr.as_str();
    let bytes = text.as_bytes();

    // Each open group keeps its children and whether it was negated.
    let mut stack: Vec<(Vec<Node<'_>>, bool)> = vec![(Vec::new(), false)];
    let mut negate_next = false;
    let mut i = 0;

    while i < bytes.len() {
        let pos = expr.start() + i;
        match bytes[i] {
            b'(' => {
                stack.push((Vec::new(), negate_next));
                negate_next = false;
                i += 1;
            }
            b')' => {
                if stack.len() == 1 || negate_next {
                    return Err((pos, SyntaxErrorKind::UnexpectedToken(")".to_string())));
                }
                let (children, negated) = stack.pop().unwrap_or_default();
                if let Some((parent, _)) = stack.last_mut() {
                    parent.push(Node::Group { children, negated });
                }
                i += 1;
            }
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'!' => {
                negate_next = true;
                i += 1;
            }
            op @ (b'&' | b'|') => {
                if negate_next || bytes.get(i + 1) != Some(&op) {
                    return Err((
                        pos,
                        SyntaxErrorKind::UnexpectedToken(char::from(op).to_string()),
                    ));
                }
                if let Some((current, _)) = stack.last_mut() {
                    current.push(if op == b'&' { Node::And } else { Node::Or });
                }
                i += 2;
            }
            _ => {
                let len = bytes[i..]
                    .iter()
                    .take_while(|&&b| !is_delimiter(b))
                    .count();
                if let Some((current, _)) = stack.last_mut() {
                    current.push(Node::Var {
                        name: &text[i..i + len],
                        negated: negate_next,
                    });
                }
                negate_next = false;
                i += len;
            }
        }
    }

    if stack.len() != 1 {
        return Err((expr.start(), SyntaxErrorKind::UnmatchedParenthesis));
    }
    if negate_next {
        return Err((expr.end(), SyntaxErrorKind::UnexpectedToken("!".to_string())));
    }

    Ok(stack.pop().map(|(nodes, _)| nodes).unwrap_or_default())
}

#[inline]
fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'!' | b'&' | b'|' | b' ' | b'\t' | b'\n' | b'\r'
    )
}

fn evaluate_nodes(nodes: &[Node<'_>], properties: &PropertyTable) -> Result<bool, SyntaxErrorKind> {
    if nodes.is_empty() {
        return Err(SyntaxErrorKind::EmptyExpression);
    }

    // Validate the operand/operator alternation and resolve operands first,
    // so that a malformed tail is reported even if the fold could stop early.
    let mut operands = Vec::with_capacity(nodes.len());
    let mut last_was_operator = true;

    for node in nodes {
        match node {
            Node::And | Node::Or => {
                if last_was_operator {
                    return Err(SyntaxErrorKind::UnexpectedToken(node.token()));
                }
                last_was_operator = true;
                operands.push(None);
            }
            Node::Var { name, negated } => {
                if !last_was_operator {
                    return Err(SyntaxErrorKind::UnexpectedToken(node.token()));
                }
                last_was_operator = false;
                operands.push(Some(properties.is_enabled(name) != *negated));
            }
            Node::Group { children, negated } => {
                if !last_was_operator {
                    return Err(SyntaxErrorKind::UnexpectedToken(node.token()));
                }
                last_was_operator = false;
                operands.push(Some(evaluate_nodes(children, properties)? != *negated));
            }
        }
    }

    if last_was_operator {
        return Err(SyntaxErrorKind::DanglingOperator);
    }

    let mut result = true;
    let mut and_mode = true;
    for (node, operand) in nodes.iter().zip(operands) {
        match (node, operand) {
            (Node::And, _) => and_mode = true,
            (Node::Or, _) => and_mode = false,
            (_, Some(value)) if and_mode => result &= value,
            (_, Some(value)) => result |= value,
            (_, None) => {}
        }
    }

    Ok(result)
}
