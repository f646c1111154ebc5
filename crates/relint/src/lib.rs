//! # relint
//!
//! Convergent auto-fixing linter engine.
//!
//! `relint` lints parsed source buffers against a configurable rule set and
//! can automatically repair violations, re-linting the rewritten buffer
//! until no further fixes apply. The engine lives in [`relint_core`]; this
//! crate re-exports its surface and adds [`LintRunner`], a multi-file
//! driver that shares one resolved configuration across isolated per-file
//! sessions.
//!
//! The parser, the rule implementations, output formatting and the CLI are
//! collaborator concerns: implement [`Parser`] for your grammar, register
//! visitor factories in a [`RuleRegistry`], and render
//! [`StructuredFailure`]s however you like.
//!
//! ## Example
//!
//! ```ignore
//! use relint::{LintOptions, LintRunner, RuleRegistry};
//!
//! let mut registry = RuleRegistry::new();
//! registry.register("no-foo", |_options| Box::new(NoFoo));
//!
//! let runner = LintRunner::builder()
//!     .parser(&my_parser)
//!     .registry(&registry)
//!     .config_path("relint.toml")
//!     .options(LintOptions { fix: true, ..LintOptions::default() })
//!     .write_fixes(true)
//!     .build()?;
//!
//! let report = runner.run(&files)?;
//! std::process::exit(i32::from(report.has_errors()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod runner;

pub use runner::{
    FileReport, LintRunner, LintRunnerBuilder, RunReport, RunnerError, IO_DIAGNOSTIC_RULE,
    PARSE_DIAGNOSTIC_RULE,
};

pub use relint_core::{
    apply_fixes, config, walk, ConfigError, ConfigurationDocument, Descent, Failure,
    FailureDiagnostic, Fix, FixError, FixOutcome, LintOptions, LintOutcome, LintSession, Node,
    NodeKind, ParseError, Parser, Replacement, ResolvedConfiguration, RuleActivation,
    RuleRegistry, RuleVisitor, SessionError, Severity, Span, StructuredFailure, SyntaxTree,
    VisitorFactory, WalkContext, CONVERGENCE_RULE, DEFAULT_MAX_PASSES,
};
