//! The lint session: repeated parse → walk → fix passes to convergence.
//!
//! One session covers one source buffer and is strictly sequential: fixing
//! mutates the buffer the next parse depends on. Sessions over independent
//! buffers share nothing but the immutable [`ResolvedConfiguration`] and the
//! registry, both read-only, and so may run in parallel workers.

use tracing::{debug, info, warn};

use crate::config::ResolvedConfiguration;
use crate::failure::{Failure, Severity};
use crate::fixer::apply_fixes;
use crate::registry::RuleRegistry;
use crate::span::Span;
use crate::tree::{ParseError, Parser};
use crate::walker::walk;

/// Default bound on parse → walk → fix cycles per session.
pub const DEFAULT_MAX_PASSES: usize = 10;

/// Rule name carried by the synthetic non-convergence warning.
pub const CONVERGENCE_RULE: &str = "fix-convergence";

/// Caller-facing knobs for one session.
#[derive(Debug, Clone, Copy)]
pub struct LintOptions {
    /// Whether to apply fixes. When false the session is a single
    /// parse + walk.
    pub fix: bool,
    /// Maximum number of parse → walk → fix cycles.
    pub max_passes: usize,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            fix: false,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Final state of one session.
#[derive(Debug, Clone)]
pub struct LintOutcome {
    /// Failures from the final walk, deduplicated by
    /// `(rule_name, span, message)`. Spans are valid against `text`.
    pub failures: Vec<Failure>,
    /// Total fixes applied across all passes.
    pub fixed: usize,
    /// The final buffer. Equal to the input when no fix was applied.
    pub text: String,
    /// False only when the pass bound was hit while fixes were still being
    /// accepted each pass.
    pub converged: bool,
}

impl LintOutcome {
    /// Returns true if any surfaced failure has severity Error.
    ///
    /// CLI collaborators map this to a nonzero exit status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.failures.iter().any(|f| f.severity == Severity::Error)
    }
}

/// Errors that end a session before it produces an outcome.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The parser collaborator rejected the buffer. Fatal for this source;
    /// reported, never retried, and never affecting other sources.
    #[error("failed to parse {source_id}: {source}")]
    Parse {
        /// Identifier of the source that failed to parse.
        source_id: String,
        /// The parser's error.
        #[source]
        source: ParseError,
    },
}

/// Drives repeated parse → walk → fix passes over one source buffer.
pub struct LintSession<'a> {
    parser: &'a dyn Parser,
    registry: &'a RuleRegistry,
    config: &'a ResolvedConfiguration,
    options: LintOptions,
}

impl<'a> LintSession<'a> {
    /// Creates a session over shared, read-only collaborators.
    #[must_use]
    pub fn new(
        parser: &'a dyn Parser,
        registry: &'a RuleRegistry,
        config: &'a ResolvedConfiguration,
        options: LintOptions,
    ) -> Self {
        Self {
            parser,
            registry,
            config,
            options,
        }
    }

    /// Lints one buffer to convergence.
    ///
    /// Each pass parses the current buffer, walks every active rule, then —
    /// when fixing is enabled — applies the non-conflicting subset of
    /// proposed fixes. A pass that applies at least one fix triggers a
    /// re-parse of the rewritten buffer; a pass that applies none ends the
    /// session. Hitting the pass bound while fixes are still applying ends
    /// the session with a final re-walk of the last buffer (so reported
    /// spans are valid against the returned text) plus the distinguished
    /// non-convergence warning.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Parse`] when the parser rejects the buffer;
    /// fatal for this source only.
    pub fn lint(&self, source_id: &str, text: &str) -> Result<LintOutcome, SessionError> {
        let mut text = text.to_string();
        let mut fixed = 0;

        for pass in 1..=self.options.max_passes {
            debug!("pass {pass} for {source_id}");
            let failures = self.walk_once(source_id, &text)?;

            if !self.options.fix {
                return Ok(finished(failures, fixed, text));
            }

            let outcome = apply_fixes(&text, &failures);
            if outcome.applied == 0 {
                info!("{source_id}: converged after {pass} pass(es), {fixed} fix(es) applied");
                return Ok(finished(failures, fixed, text));
            }
            fixed += outcome.applied;
            text = outcome.text;
        }

        // Bound hit while fixes were still applying: re-walk the final
        // buffer so the reported spans match the returned text.
        warn!(
            "{source_id}: auto-fix did not converge after {} passes",
            self.options.max_passes
        );
        let mut failures = self.walk_once(source_id, &text)?;
        failures.push(Failure::new(
            CONVERGENCE_RULE,
            Severity::Warning,
            Span::new(0, 0),
            format!(
                "auto-fix did not converge after {} passes",
                self.options.max_passes
            ),
        ));
        let mut outcome = finished(failures, fixed, text);
        outcome.converged = false;
        Ok(outcome)
    }

    /// One parse + walk of the current buffer.
    fn walk_once(&self, source_id: &str, text: &str) -> Result<Vec<Failure>, SessionError> {
        let tree = self
            .parser
            .parse(text)
            .map_err(|source| SessionError::Parse {
                source_id: source_id.to_string(),
                source,
            })?;
        Ok(walk(&tree, text, self.config, self.registry))
    }
}

fn finished(mut failures: Vec<Failure>, fixed: usize, text: String) -> LintOutcome {
    dedupe(&mut failures);
    LintOutcome {
        failures,
        fixed,
        text,
        converged: true,
    }
}

/// Drops failures repeating an earlier `(rule_name, span, message)` key,
/// keeping first occurrences in order.
fn dedupe(failures: &mut Vec<Failure>) {
    let mut seen: Vec<(String, Span, String)> = Vec::new();
    failures.retain(|f| {
        let key = (f.rule_name.clone(), f.span, f.message.clone());
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
}
