//! `#include` resolution for generated shader source.
//!
//! Every `#include "file"` or `#include <file>` line that is not inside a
//! `//` or `/* */` comment is replaced by the (recursively resolved) file
//! content, framed by `#line` directives so compiler diagnostics point at the
//! right line of both files:
//!
//! ```text
//! #line 1
//! <included text>
//! #line <line after the include>
//! ```

use sigil_core::{Result, SigilError};

use crate::span::line_at;

const DIRECTIVE: &str = "#include";

/// Nesting limit; deeper chains are treated as include cycles.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Supplies the content of included files.
pub trait IncludeSource {
    /// Returns the file content, or `None` when `name` cannot be opened.
    fn load(&self, name: &str) -> Option<String>;
}

impl<F> IncludeSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn load(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Resolves all includes of `source`. `file_name` names `source` in errors.
///
/// # Errors
///
/// Returns [`SigilError::Include`] for a badly formed directive, a file the
/// source cannot provide, or nesting deeper than [`MAX_INCLUDE_DEPTH`].
pub fn resolve_includes(
    source: &str,
    file_name: &str,
    loader: &(impl IncludeSource + ?Sized),
) -> Result<String> {
    resolve(source, file_name, loader, 0)
}

fn include_error(file: &str, message: impl Into<String>) -> SigilError {
    SigilError::Include {
        file: file.to_string(),
        message: message.into(),
    }
}

fn resolve<L>(source: &str, file_name: &str, loader: &L, depth: usize) -> Result<String>
where
    L: IncludeSource + ?Sized,
{
    if depth > MAX_INCLUDE_DEPTH {
        return Err(include_error(
            file_name,
            format!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels"),
        ));
    }

    let mut out = String::with_capacity(source.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(rel) = source[search..].find(DIRECTIVE) {
        let at = search + rel;
        let after = at + DIRECTIVE.len();
        let line_start = source[..at].rfind('\n').map_or(0, |p| p + 1);

        if is_commented(source, line_start, at) {
            search = after;
            continue;
        }

        let line_end = source[after..].find('\n').map_or(source.len(), |p| after + p);
        let line_text = source[at..line_end].trim_end();
        let name = included_name(&source[after..line_end]).ok_or_else(|| {
            include_error(file_name, format!("badly formed directive: {line_text}"))
        })?;

        let content = loader
            .load(name)
            .ok_or_else(|| include_error(file_name, format!("cannot open '{name}'")))?;
        let content = resolve(&content, name, loader, depth + 1)?;
        log::trace!("Resolved #include '{name}' in '{file_name}'");

        out.push_str(&source[copied..line_start]);
        out.push_str("#line 1\n");
        out.push_str(&content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("#line {}\n", line_at(source, at) + 1));

        copied = (line_end + 1).min(source.len());
        search = copied;
    }

    out.push_str(&source[copied..]);
    Ok(out)
}

/// Whether the directive at `at` sits after a `//` on its line or inside an
/// unterminated `/*`.
fn is_commented(source: &str, line_start: usize, at: usize) -> bool {
    if source[line_start..at].contains("//") {
        return true;
    }
    let before = &source[..at];
    match before.rfind("/*") {
        Some(open) => before.rfind("*/").is_none_or(|close| close < open),
        None => false,
    }
}

/// The file name between `"..."` or `<...>` on the directive line.
fn included_name(directive: &str) -> Option<&str> {
    let (start, close) = match directive.find('"') {
        Some(p) => (p, '"'),
        None => (directive.find('<')?, '>'),
    };
    let inner = &directive[start + 1..];
    let end = inner.find(close)?;
    let name = inner[..end].trim();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(name: &str) -> Option<String> {
        match name {
            "common.glsl" => Some("float common;".to_string()),
            "outer.glsl" => Some("#include \"common.glsl\"\nfloat outer;".to_string()),
            "self.glsl" => Some("#include <self.glsl>".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_include_with_line_directives() {
        let src = "a\n#include \"common.glsl\"\nb";
        let out = resolve_includes(src, "main", &files).unwrap();
        assert_eq!(out, "a\n#line 1\nfloat common;\n#line 3\nb");
    }

    #[test]
    fn test_angle_brackets_and_nesting() {
        let out = resolve_includes("#include <outer.glsl>\n", "main", &files).unwrap();
        assert_eq!(
            out,
            "#line 1\n#line 1\nfloat common;\n#line 2\nfloat outer;\n#line 2\n"
        );
    }

    #[test]
    fn test_commented_includes_are_skipped() {
        let src = "// #include \"missing\"\n/* #include <missing> */ x\n/*\n#include \"missing\"\n*/";
        let out = resolve_includes(src, "main", &files).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = resolve_includes("#include \"nope.glsl\"", "main", &files).unwrap_err();
        assert!(matches!(err, SigilError::Include { ref file, .. } if file == "main"));
    }

    #[test]
    fn test_badly_formed_directive() {
        assert!(resolve_includes("#include common.glsl\n", "main", &files).is_err());
        assert!(resolve_includes("#include \"common.glsl\n", "main", &files).is_err());
    }

    #[test]
    fn test_cycle_hits_depth_limit() {
        let err = resolve_includes("#include <self.glsl>", "main", &files).unwrap_err();
        assert!(matches!(err, SigilError::Include { .. }));
    }
}
