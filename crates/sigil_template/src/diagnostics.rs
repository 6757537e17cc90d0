//! Collector for non-fatal template errors.

use sigil_core::{SyntaxError, SyntaxErrorKind};

use crate::span::line_at;

/// Accumulates [`SyntaxError`]s raised while expanding a template.
///
/// Passes never abort on malformed input: they report here, degrade the
/// affected block to empty output and continue with the rest of the buffer.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    template: Option<String>,
    errors: Vec<SyntaxError>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A collector whose log lines name the template being processed.
    #[must_use]
    pub fn for_template(name: impl Into<String>) -> Self {
        Self {
            template: Some(name.into()),
            errors: Vec::new(),
        }
    }

    /// Records an error located at byte `pos` of `buffer`.
    ///
    /// Re-scanning passes revisit text left in place by an earlier pass; an
    /// error equal to one already recorded is dropped.
    pub fn report(&mut self, buffer: &str, pos: usize, kind: SyntaxErrorKind) {
        let error = SyntaxError {
            line: line_at(buffer, pos),
            kind,
        };
        if self.errors.contains(&error) {
            return;
        }
        match &self.template {
            Some(name) => log::error!("Template '{name}': {error}"),
            None => log::error!("{error}"),
        }
        self.errors.push(error);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    #[must_use]
    pub fn first(&self) -> Option<&SyntaxError> {
        self.errors.first()
    }

    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<SyntaxError> {
        self.errors
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}
