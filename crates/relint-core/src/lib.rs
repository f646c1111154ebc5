//! # relint-core
//!
//! The lint orchestration engine: configuration resolution with `extends`
//! inheritance, the rule/walker execution contract over a syntax tree, the
//! failure model, and convergent, conflict-free automatic fixing.
//!
//! The engine deliberately owns no parser, no rule catalog, no formatter and
//! no CLI. Those are collaborators plugged in at the seams:
//!
//! - [`Parser`] produces a [`SyntaxTree`] over the closed [`NodeKind`] set
//! - [`RuleRegistry`] maps configured rule names to visitor factories
//! - [`Failure::to_structured`] is the only formatting contract
//!
//! ## Example
//!
//! ```ignore
//! use relint_core::{config, LintOptions, LintSession, RuleRegistry};
//!
//! let resolved = config::resolve(Path::new("relint.toml"))?;
//! let session = LintSession::new(&parser, &registry, &resolved, LintOptions {
//!     fix: true,
//!     ..LintOptions::default()
//! });
//! let outcome = session.lint("src/main.x", &text)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod failure;
mod fixer;
mod registry;
mod session;
mod span;
mod tree;
mod walker;

pub use config::{ConfigError, ConfigurationDocument, ResolvedConfiguration, RuleActivation};
pub use failure::{Failure, FailureDiagnostic, Severity, StructuredFailure};
pub use fixer::{apply_fixes, FixOutcome};
pub use registry::{RuleRegistry, VisitorFactory};
pub use session::{
    LintOptions, LintOutcome, LintSession, SessionError, CONVERGENCE_RULE, DEFAULT_MAX_PASSES,
};
pub use span::{Fix, FixError, Replacement, Span};
pub use tree::{Node, NodeKind, ParseError, Parser, SyntaxTree};
pub use walker::{walk, Descent, RuleVisitor, WalkContext};
