//! Primitive text ranges and atomic edits.
//!
//! All offsets are byte offsets into one authoritative version of a source
//! buffer. Spans taken from different buffer versions must never be compared
//! or mixed; the fix engine re-interprets every span against the buffer the
//! failures were produced from.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into one source buffer version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset. Always `>= start`.
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`; span endpoints come from the parser or from
    /// rule code and an inverted range is a programming error, not input.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "span start {start} exceeds end {end}");
        Self { start, end }
    }

    /// Length of the span in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if this span conflicts with `other`.
    ///
    /// Half-open semantics: abutting spans (`self.end == other.start`) do
    /// not overlap. An empty span strictly inside a non-empty one does
    /// conflict: an insertion point inside replaced text has nowhere to
    /// land once the surrounding bytes are rewritten. At either endpoint
    /// an empty span only abuts.
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// An atomic text substitution: replace the content of `span` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// The range being replaced.
    pub span: Span,
    /// The text substituted at that range. May be empty (pure deletion).
    pub text: String,
}

impl Replacement {
    /// Creates a new replacement.
    #[must_use]
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }

    /// A pure insertion at `offset`.
    #[must_use]
    pub fn insert_at(offset: usize, text: impl Into<String>) -> Self {
        Self::new(Span::new(offset, offset), text)
    }

    /// A pure deletion of `span`.
    #[must_use]
    pub fn delete(span: Span) -> Self {
        Self::new(span, "")
    }
}

/// Errors constructing a [`Fix`].
#[derive(Debug, thiserror::Error)]
pub enum FixError {
    /// Two replacements within one fix cover overlapping ranges.
    #[error("replacements at {first} and {second} overlap within one fix")]
    OverlappingReplacements {
        /// Span of the earlier replacement.
        first: Span,
        /// Span of the later replacement.
        second: Span,
    },
}

/// One atomic edit proposed by one rule at one failure site.
///
/// Internally an ordered sequence of replacements, sorted ascending by start
/// offset and pairwise non-overlapping. The fix engine accepts or rejects a
/// fix as a whole; internal consistency is validated here, at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    replacements: Vec<Replacement>,
}

impl Fix {
    /// Creates a fix from a set of replacements.
    ///
    /// Replacements are sorted by `(start, end)`; the sorted sequence must
    /// be pairwise non-overlapping.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::OverlappingReplacements`] if any two replacements
    /// overlap.
    pub fn new(mut replacements: Vec<Replacement>) -> Result<Self, FixError> {
        replacements.sort_by_key(|r| (r.span.start, r.span.end));
        for pair in replacements.windows(2) {
            if pair[0].span.overlaps(&pair[1].span) {
                return Err(FixError::OverlappingReplacements {
                    first: pair[0].span,
                    second: pair[1].span,
                });
            }
        }
        Ok(Self { replacements })
    }

    /// A single-replacement fix.
    #[must_use]
    pub fn single(span: Span, text: impl Into<String>) -> Self {
        Self {
            replacements: vec![Replacement::new(span, text)],
        }
    }

    /// The constituent replacements, sorted ascending by start offset.
    #[must_use]
    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// Returns true if this fix performs no edits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }
}
