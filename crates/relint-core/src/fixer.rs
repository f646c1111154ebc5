//! Fix scheduling and buffer rewriting.
//!
//! Given one batch of failures over one source buffer, selects a maximal
//! non-overlapping subset of their fixes by greedy interval scheduling and
//! rebuilds the buffer in a single linear pass. Replacements are never
//! applied iteratively against a live buffer: every offset is interpreted
//! against the original buffer for this pass only, which sidesteps
//! cumulative offset shifting entirely.

use tracing::{debug, warn};

use crate::failure::Failure;
use crate::span::Span;

/// Result of one fix pass over one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// The rewritten buffer. Equal to the input when nothing was applied.
    pub text: String,
    /// Number of whole fixes accepted and applied.
    pub applied: usize,
    /// Number of whole fixes rejected due to overlap with an accepted fix.
    /// Their owning failures remain reportable with their original spans,
    /// valid against the input buffer of this pass.
    pub skipped: usize,
}

/// A fix candidate flattened for scheduling, keyed for the tie-break.
struct Candidate<'a> {
    /// Position in walk order; the final tie-break.
    order: usize,
    failure: &'a Failure,
}

impl Candidate<'_> {
    /// Scheduling key of this fix: the `(start, end)` of its first
    /// replacement. Fix replacements are sorted at construction, so this is
    /// the fix's leftmost edit.
    fn sort_key(&self) -> (usize, usize, usize) {
        let first = self
            .failure
            .fix
            .as_ref()
            .and_then(|f| f.replacements().first())
            .map_or((0, 0), |r| (r.span.start, r.span.end));
        (first.0, first.1, self.order)
    }
}

/// Applies the fixes carried by `failures` to `source`.
///
/// Only failures with a non-empty fix participate. Candidates are sorted by
/// `(start, end)` of their leftmost replacement and accepted greedily; a fix
/// is accepted or rejected as a whole: if any of its replacements overlaps a
/// replacement already accepted from a different fix, the entire fix is
/// skipped for this pass. Abutment is allowed. Equal starts tie-break to the
/// smaller end, then to the earlier failure in walk order.
#[must_use]
pub fn apply_fixes(source: &str, failures: &[Failure]) -> FixOutcome {
    let mut candidates: Vec<Candidate<'_>> = failures
        .iter()
        .enumerate()
        .filter(|(_, f)| f.has_fix())
        .map(|(order, failure)| Candidate { order, failure })
        .collect();
    candidates.sort_by_key(Candidate::sort_key);

    let mut accepted: Vec<(Span, &str)> = Vec::new();
    let mut applied = 0;
    let mut skipped = 0;

    for candidate in &candidates {
        let Some(fix) = candidate.failure.fix.as_ref() else {
            continue;
        };
        let conflict = fix
            .replacements()
            .iter()
            .any(|r| accepted.iter().any(|(span, _)| span.overlaps(&r.span)));
        if conflict {
            warn!(
                "skipping conflicting fix from rule `{}` at {}",
                candidate.failure.rule_name, candidate.failure.span
            );
            skipped += 1;
            continue;
        }
        for replacement in fix.replacements() {
            accepted.push((replacement.span, replacement.text.as_str()));
        }
        applied += 1;
    }

    if applied == 0 {
        return FixOutcome {
            text: source.to_string(),
            applied: 0,
            skipped,
        };
    }

    // Single pass over the accepted, sorted replacements: copy original text
    // between consecutive boundaries verbatim, substitute at each span.
    accepted.sort_by_key(|(span, _)| (span.start, span.end));
    let mut text = String::with_capacity(source.len());
    let mut cursor = 0;
    for (span, replacement) in &accepted {
        text.push_str(&source[cursor..span.start]);
        text.push_str(replacement);
        cursor = span.end;
    }
    text.push_str(&source[cursor..]);

    debug!("fix pass applied {applied}, skipped {skipped}");
    FixOutcome {
        text,
        applied,
        skipped,
    }
}
