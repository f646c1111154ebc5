//! Multi-file lint driver.
//!
//! Runs one isolated [`LintSession`] per file over a shared, read-only
//! [`ResolvedConfiguration`]. A parse failure or an unreadable file
//! becomes that file's diagnostic and never aborts the remaining files;
//! fixed buffers can optionally be written back to disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use relint_core::{
    config, ConfigError, Failure, LintOptions, LintOutcome, LintSession, Parser,
    ResolvedConfiguration, RuleRegistry, SessionError, Severity, Span,
};

/// Rule name carried by the synthetic per-file parse diagnostic.
pub const PARSE_DIAGNOSTIC_RULE: &str = "parse";

/// Rule name carried by the synthetic per-file read-failure diagnostic.
pub const IO_DIAGNOSTIC_RULE: &str = "io";

/// Errors that abort a whole run.
///
/// Per-file parse and read failures are not here: they surface as
/// per-file diagnostics inside the report.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// IO error writing a fixed buffer back to its file.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Configuration resolution failed; surfaced before any linting starts.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A required collaborator was not supplied to the builder.
    #[error("runner is missing a {0}")]
    Missing(&'static str),
}

/// Builder for configuring a [`LintRunner`].
#[derive(Default)]
pub struct LintRunnerBuilder<'a> {
    parser: Option<&'a dyn Parser>,
    registry: Option<&'a RuleRegistry>,
    config: Option<ResolvedConfiguration>,
    config_path: Option<PathBuf>,
    options: LintOptions,
    write_fixes: bool,
}

impl<'a> LintRunnerBuilder<'a> {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parser collaborator.
    #[must_use]
    pub fn parser(mut self, parser: &'a dyn Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Sets the rule registry.
    #[must_use]
    pub fn registry(mut self, registry: &'a RuleRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Uses an already-resolved configuration.
    #[must_use]
    pub fn config(mut self, config: ResolvedConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    /// Resolves the configuration (including its `extends` chain) from a
    /// file at build time.
    #[must_use]
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Sets the per-session options.
    #[must_use]
    pub fn options(mut self, options: LintOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether fixed buffers are written back to their files.
    #[must_use]
    pub fn write_fixes(mut self, write: bool) -> Self {
        self.write_fixes = write;
        self
    }

    /// Builds the runner, resolving the configuration file if one was given.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Missing`] without a parser or registry, and
    /// [`RunnerError::Config`] when configuration resolution fails; no
    /// partial configuration is ever used.
    pub fn build(self) -> Result<LintRunner<'a>, RunnerError> {
        let parser = self.parser.ok_or(RunnerError::Missing("parser"))?;
        let registry = self.registry.ok_or(RunnerError::Missing("rule registry"))?;
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => config::resolve(&path)?,
            (None, None) => ResolvedConfiguration::default(),
        };
        Ok(LintRunner {
            parser,
            registry,
            config,
            options: self.options,
            write_fixes: self.write_fixes,
        })
    }
}

/// Lints a set of files as fully independent sessions over one shared
/// configuration.
pub struct LintRunner<'a> {
    parser: &'a dyn Parser,
    registry: &'a RuleRegistry,
    config: ResolvedConfiguration,
    options: LintOptions,
    write_fixes: bool,
}

impl<'a> LintRunner<'a> {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> LintRunnerBuilder<'a> {
        LintRunnerBuilder::new()
    }

    /// The resolved configuration this runner shares across sessions.
    #[must_use]
    pub fn config(&self) -> &ResolvedConfiguration {
        &self.config
    }

    /// Lints every file, skipping excluded paths.
    ///
    /// An unreadable file surfaces as that file's diagnostic, like a parse
    /// failure, so one bad path never hides the other files' results.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Io`] only when fix write-back is enabled and
    /// a rewritten buffer cannot be written.
    pub fn run(&self, files: &[PathBuf]) -> Result<RunReport, RunnerError> {
        let mut report = RunReport::default();

        for path in files {
            if self.config.is_excluded(path) {
                debug!("excluding {}", path.display());
                continue;
            }
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(error) => {
                    // Fatal for this file only; the other files still run.
                    warn!("{}: {error}", path.display());
                    report.files_checked += 1;
                    report.files.push(FileReport {
                        path: path.clone(),
                        outcome: io_diagnostic_outcome(&error),
                    });
                    continue;
                }
            };

            let session = LintSession::new(self.parser, self.registry, &self.config, self.options);
            let source_id = path.display().to_string();
            let outcome = match session.lint(&source_id, &text) {
                Ok(outcome) => outcome,
                Err(SessionError::Parse { source, .. }) => {
                    // Fatal for this source only; the other files still run.
                    warn!("{source_id}: {source}");
                    parse_diagnostic_outcome(&source, text)
                }
            };

            if self.write_fixes && outcome.fixed > 0 {
                fs::write(path, &outcome.text).map_err(|e| RunnerError::Io {
                    path: path.clone(),
                    source: e,
                })?;
            }

            report.total_fixed += outcome.fixed;
            report.files_checked += 1;
            report.files.push(FileReport {
                path: path.clone(),
                outcome,
            });
        }

        info!(
            "linted {} file(s): {} failure(s), {} fix(es) applied",
            report.files_checked,
            report.failures().count(),
            report.total_fixed
        );
        Ok(report)
    }
}

/// Wraps a parse failure as a one-diagnostic outcome for its file.
fn parse_diagnostic_outcome(error: &relint_core::ParseError, text: String) -> LintOutcome {
    let span = Span::new(error.offset, error.offset);
    let failure = Failure::new(
        PARSE_DIAGNOSTIC_RULE,
        Severity::Error,
        span,
        format!("parse error: {}", error.message),
    );
    LintOutcome {
        failures: vec![failure],
        fixed: 0,
        text,
        converged: true,
    }
}

/// Wraps a read failure as a one-diagnostic outcome for its file.
fn io_diagnostic_outcome(error: &std::io::Error) -> LintOutcome {
    let failure = Failure::new(
        IO_DIAGNOSTIC_RULE,
        Severity::Error,
        Span::new(0, 0),
        format!("cannot read file: {error}"),
    );
    LintOutcome {
        failures: vec![failure],
        fixed: 0,
        text: String::new(),
        converged: true,
    }
}

/// One file's final session state.
#[derive(Debug)]
pub struct FileReport {
    /// The linted file.
    pub path: PathBuf,
    /// Its session outcome.
    pub outcome: LintOutcome,
}

/// Aggregated result of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-file outcomes, in input order minus exclusions.
    pub files: Vec<FileReport>,
    /// Number of files visited, exclusions aside.
    pub files_checked: usize,
    /// Fixes applied across all files and passes.
    pub total_fixed: usize,
}

impl RunReport {
    /// All surfaced failures with their file paths.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Failure)> {
        self.files
            .iter()
            .flat_map(|f| f.outcome.failures.iter().map(move |x| (f.path.as_path(), x)))
    }

    /// Returns true if any surfaced failure has severity Error after the
    /// final pass. CLI collaborators map this to a nonzero exit status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.files.iter().any(|f| f.outcome.has_errors())
    }

    /// Counts failures by severity as `(errors, warnings)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize) {
        let mut errors = 0;
        let mut warnings = 0;
        for (_, failure) in self.failures() {
            match failure.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
                Severity::Off => {}
            }
        }
        (errors, warnings)
    }
}
