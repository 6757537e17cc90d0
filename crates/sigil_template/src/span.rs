//! Immutable views into a template buffer.
//!
//! Every scanning step produces a new [`Span`] instead of moving a shared
//! cursor, so passes can hold several views of the same buffer at once.

/// A `[start, end)` byte range into a borrowed buffer.
///
/// Offsets returned by [`Span::find`] are absolute (relative to the whole
/// buffer), which keeps line-number reporting trivial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    src: &'a str,
    start: usize,
    end: usize,
}

impl<'a> Span<'a> {
    /// A span covering all of `src`.
    #[inline]
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            start: 0,
            end: src.len(),
        }
    }

    #[inline]
    #[must_use]
    pub fn source(self) -> &'a str {
        self.src
    }

    #[inline]
    #[must_use]
    pub fn start(self) -> usize {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn end(self) -> usize {
        self.end
    }

    #[inline]
    #[must_use]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'a str {
        &self.src[self.start..self.end]
    }

    #[inline]
    #[must_use]
    pub fn bytes(self) -> &'a [u8] {
        &self.src.as_bytes()[self.start..self.end]
    }

    /// Absolute offset of the first occurrence of `pat` inside the span.
    #[must_use]
    pub fn find(self, pat: &str) -> Option<usize> {
        self.as_str().find(pat).map(|idx| self.start + idx)
    }

    #[must_use]
    pub fn starts_with(self, pat: &str) -> bool {
        self.as_str().starts_with(pat)
    }

    /// The same span with its start moved to absolute offset `pos`.
    #[inline]
    #[must_use]
    pub fn advance_to(self, pos: usize) -> Self {
        let start = pos.clamp(self.start, self.end);
        Self { start, ..self }
    }

    /// The same span with its end moved to absolute offset `pos`.
    #[inline]
    #[must_use]
    pub fn truncate_to(self, pos: usize) -> Self {
        let end = pos.clamp(self.start, self.end);
        Self { end, ..self }
    }

    /// An empty span positioned at the end of this one.
    #[inline]
    #[must_use]
    pub fn exhausted(self) -> Self {
        Self {
            start: self.end,
            ..self
        }
    }

    /// 1-based line number of the span's start within the whole buffer.
    #[must_use]
    pub fn line(self) -> usize {
        line_at(self.src, self.start)
    }
}

/// 1-based line number of byte offset `idx` in `buffer`.
#[must_use]
pub fn line_at(buffer: &str, idx: usize) -> usize {
    let idx = idx.min(buffer.len());
    buffer.as_bytes()[..idx].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Characters that may appear in property, piece and counter names.
#[inline]
#[must_use]
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
