//! The failure model: violations reported by rules.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};

use crate::span::{Fix, Span};

/// Severity level of a rule activation or a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The rule is configured but disabled. Tracked so that a disabled rule
    /// can be reported as "disabled" rather than "unknown"; contributes no
    /// failures.
    Off,
    /// Warning that should be addressed; does not fail the lint run.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown severity `{other}`, expected: error, warning, off"
            )),
        }
    }
}

/// A violation found during one walk of one buffer version.
///
/// Immutable after creation. The span is valid only against the buffer the
/// walk ran on; callers must not interpret it against a rewritten buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// Kebab-case name of the rule that reported this failure.
    pub rule_name: String,
    /// Severity this failure was reported at.
    pub severity: Severity,
    /// Range of the offending source text.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
    /// Optional atomic edit resolving this failure.
    pub fix: Option<Fix>,
}

impl Failure {
    /// Creates a new failure without a fix.
    #[must_use]
    pub fn new(
        rule_name: impl Into<String>,
        severity: Severity,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            severity,
            span,
            message: message.into(),
            fix: None,
        }
    }

    /// Attaches a fix to this failure.
    #[must_use]
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Builds the distinguished synthetic failure for a crashed rule.
    ///
    /// Emitted by the walker when a rule's visitor panics; severity is
    /// always Error and the message names the failing rule.
    #[must_use]
    pub fn rule_crash(rule_name: impl Into<String>, detail: &str) -> Self {
        let rule_name = rule_name.into();
        let message = format!("rule `{rule_name}` crashed: {detail}");
        Self::new(rule_name, Severity::Error, Span::new(0, 0), message)
    }

    /// Identity used for deduplication: `(rule_name, span, message)`.
    ///
    /// Two failures with the same key are the same finding, regardless of
    /// whether either carries a fix.
    #[must_use]
    pub fn key(&self) -> (&str, Span, &str) {
        (&self.rule_name, self.span, &self.message)
    }

    /// Returns true if this failure proposes a non-empty fix.
    #[must_use]
    pub fn has_fix(&self) -> bool {
        self.fix.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// The structured view consumed by formatters.
    #[must_use]
    pub fn to_structured(&self) -> StructuredFailure {
        StructuredFailure {
            rule_name: self.rule_name.clone(),
            severity: self.severity,
            span: self.span,
            message: self.message.clone(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.severity, self.rule_name, self.message
        )
    }
}

/// The only formatting contract this engine exposes: a flat, serializable
/// record of one failure, without the fix payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFailure {
    /// Name of the reporting rule.
    pub rule_name: String,
    /// Reported severity.
    pub severity: Severity,
    /// Offending range in the buffer the failure was reported against.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
}

/// Converts a [`Failure`] into a miette diagnostic for rich terminal output.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct FailureDiagnostic {
    message: String,
    #[label("{rule_name}")]
    span: SourceSpan,
    rule_name: String,
}

impl From<&Failure> for FailureDiagnostic {
    fn from(failure: &Failure) -> Self {
        Self {
            message: failure.message.clone(),
            span: SourceSpan::from((failure.span.start, failure.span.len())),
            rule_name: failure.rule_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_failure() -> Failure {
        Failure::new(
            "no-foo",
            Severity::Error,
            Span::new(4, 7),
            "`foo` is forbidden",
        )
    }

    #[test]
    fn key_ignores_fix_and_severity() {
        let plain = make_failure();
        let fixed = make_failure().with_fix(Fix::single(Span::new(4, 7), "bar"));
        assert_eq!(plain.key(), fixed.key());
    }

    #[test]
    fn key_differs_by_span() {
        let a = make_failure();
        let mut b = make_failure();
        b.span = Span::new(5, 7);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn has_fix_is_false_for_empty_fix() {
        let failure = make_failure().with_fix(Fix::new(vec![]).unwrap());
        assert!(!failure.has_fix());
        assert!(make_failure().fix.is_none());
    }

    #[test]
    fn crash_failure_names_the_rule() {
        let crash = Failure::rule_crash("bad-rule", "index out of bounds");
        assert_eq!(crash.severity, Severity::Error);
        assert_eq!(crash.rule_name, "bad-rule");
        assert!(crash.message.contains("`bad-rule` crashed"));
        assert!(crash.message.contains("index out of bounds"));
    }

    #[test]
    fn structured_view_drops_the_fix() {
        let failure = make_failure().with_fix(Fix::single(Span::new(4, 7), "bar"));
        let structured = failure.to_structured();
        assert_eq!(structured.rule_name, "no-foo");
        assert_eq!(structured.span, Span::new(4, 7));
    }

    #[test]
    fn severity_round_trips_through_str() {
        for s in [Severity::Off, Severity::Warning, Severity::Error] {
            let parsed: Severity = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
        assert!("critical".parse::<Severity>().is_err());
    }
}
