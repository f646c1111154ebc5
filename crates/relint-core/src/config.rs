//! Configuration documents and the `extends` inheritance resolver.
//!
//! A configuration file is TOML. Rule settings use the raw form
//! `false | true | [severity, ...options]`:
//!
//! ```toml
//! extends = ["base"]
//! rules-directories = ["custom-rules"]
//! excludes = ["**/generated/**"]
//!
//! [rules]
//! no-foo = true
//! max-line-length = ["warning", 120]
//! ```
//!
//! Resolution walks the `extends` chain depth-first, left-to-right, relative
//! to the referencing file, then merges base-to-derived. A rule entry in a
//! later document completely replaces an earlier one (severity and options
//! together); `rules-directories` accumulate ancestor-first without
//! duplicates; `excludes` accumulate as a set union.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::failure::Severity;

/// Raw per-rule setting as written in a configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRuleSetting {
    /// `true` enables the rule at Error severity with default options;
    /// `false` disables it.
    Switch(bool),
    /// `[severity, ...options]` — explicit severity plus rule options.
    Configured(Vec<toml::Value>),
}

/// One configuration file, pre-merge. Ephemeral: consumed during resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationDocument {
    /// Configuration references this document inherits from, resolved
    /// relative to this document's own path.
    #[serde(default)]
    pub extends: Vec<String>,
    /// Raw rule settings declared by this document.
    #[serde(default)]
    pub rules: BTreeMap<String, RawRuleSetting>,
    /// Directories collaborators search for custom rule definitions.
    #[serde(default)]
    pub rules_directories: Vec<String>,
    /// Glob patterns for paths excluded from linting.
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// The resolved severity and options for one rule name after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleActivation {
    /// Kebab-case rule name.
    pub rule_name: String,
    /// Resolved severity. `Off` means tracked-but-disabled.
    pub severity: Severity,
    /// Rule-specific options, in declaration order.
    pub options: Vec<toml::Value>,
}

impl RuleActivation {
    /// Returns true if this rule should run (severity is not `Off`).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.severity != Severity::Off
    }
}

/// The result of merging a document's `extends` chain with the document
/// itself. Owned by the lint session for the session's duration; immutable
/// and safe to share across parallel per-file sessions.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfiguration {
    rules: BTreeMap<String, RuleActivation>,
    rules_directories: Vec<PathBuf>,
    excludes: BTreeSet<String>,
}

impl ResolvedConfiguration {
    /// Active rule activations (severity ≠ Off), in deterministic
    /// rule-name order. This order is the walker's rule sequencing order.
    pub fn active(&self) -> impl Iterator<Item = &RuleActivation> {
        self.rules.values().filter(|a| a.is_active())
    }

    /// Looks up the resolved activation for a rule name.
    #[must_use]
    pub fn activation(&self, rule_name: &str) -> Option<&RuleActivation> {
        self.rules.get(rule_name)
    }

    /// Returns true if the rule is present in the chain with severity `Off`.
    ///
    /// Distinguishes "disabled" from "unknown": a name absent from every
    /// document is simply inactive and returns false here.
    #[must_use]
    pub fn is_disabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .is_some_and(|a| a.severity == Severity::Off)
    }

    /// Ordered rule-search directories, ancestors first, no duplicates.
    #[must_use]
    pub fn rules_directories(&self) -> &[PathBuf] {
        &self.rules_directories
    }

    /// Accumulated exclusion globs.
    #[must_use]
    pub fn excludes(&self) -> &BTreeSet<String> {
        &self.excludes
    }

    /// Number of resolved rule entries, including disabled ones.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Checks a path against the accumulated exclusion globs.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        for pattern in &self.excludes {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
            }
            // Substring fallback for patterns like "**/generated/**", which
            // glob does not match against relative paths missing a prefix.
            let normalized = pattern.replace("**", "");
            if !normalized.is_empty() && path_str.contains(&normalized) {
                return true;
            }
        }
        false
    }

    /// Inserts or replaces a rule activation programmatically.
    ///
    /// Embedders that do not use configuration files build their activation
    /// table through this.
    pub fn set_rule(&mut self, activation: RuleActivation) {
        self.rules.insert(activation.rule_name.clone(), activation);
    }

    /// Overlays a fully-resolved ancestor configuration onto this one.
    ///
    /// Rule entries replace whole; directories append ancestor-first with
    /// duplicates dropped; excludes union.
    fn absorb(&mut self, ancestor: ResolvedConfiguration) {
        self.rules.extend(ancestor.rules);
        for dir in ancestor.rules_directories {
            self.push_directory(dir);
        }
        self.excludes.extend(ancestor.excludes);
    }

    fn push_directory(&mut self, dir: PathBuf) {
        if !self.rules_directories.contains(&dir) {
            self.rules_directories.push(dir);
        }
    }
}

/// Errors during configuration resolution.
///
/// All are fatal to the resolution: no partial configuration is ever used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file missing or unreadable.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Malformed TOML document.
    #[error("failed to parse config {path}: {message}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// A configuration file extends itself, directly or transitively.
    #[error("cycle in extends chain: {}", format_chain(.chain))]
    Cycle {
        /// The chain of paths, ending at the repeated entry.
        chain: Vec<PathBuf>,
    },

    /// A rule setting that could not be interpreted.
    #[error("invalid setting for rule `{rule}` in {path}: {reason}")]
    InvalidSetting {
        /// The rule with the bad setting.
        rule: String,
        /// The document declaring it.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Resolves a configuration file and its full `extends` chain.
///
/// # Errors
///
/// Returns [`ConfigError`] on a missing file, a malformed document, an
/// uninterpretable rule setting, or a cycle in the `extends` chain.
pub fn resolve(path: &Path) -> Result<ResolvedConfiguration, ConfigError> {
    let mut in_progress = Vec::new();
    let resolved = resolve_recursive(path, &mut in_progress)?;
    debug!(
        "resolved {} with {} rule entries, {} rule directories",
        path.display(),
        resolved.rule_count(),
        resolved.rules_directories().len()
    );
    Ok(resolved)
}

/// Depth-first, left-to-right resolution with cycle detection.
///
/// `in_progress` holds the canonical paths currently being resolved; seeing
/// one again before it finishes is a cycle and fails the whole resolution.
fn resolve_recursive(
    path: &Path,
    in_progress: &mut Vec<PathBuf>,
) -> Result<ResolvedConfiguration, ConfigError> {
    let canonical = path.canonicalize().map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if in_progress.contains(&canonical) {
        let mut chain = in_progress.clone();
        chain.push(canonical);
        return Err(ConfigError::Cycle { chain });
    }

    let content = std::fs::read_to_string(&canonical).map_err(|e| ConfigError::Io {
        path: canonical.clone(),
        source: e,
    })?;
    let document: ConfigurationDocument =
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: canonical.clone(),
            message: e.to_string(),
        })?;

    debug!(
        "loaded {} ({} extends, {} rules)",
        canonical.display(),
        document.extends.len(),
        document.rules.len()
    );

    in_progress.push(canonical.clone());
    let result = merge_document(&canonical, document, in_progress);
    in_progress.pop();
    result
}

/// Merges one document over its resolved ancestors, base-to-derived.
fn merge_document(
    path: &Path,
    document: ConfigurationDocument,
    in_progress: &mut Vec<PathBuf>,
) -> Result<ResolvedConfiguration, ConfigError> {
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut resolved = ResolvedConfiguration::default();

    for reference in &document.extends {
        let target = resolve_reference(base_dir, reference);
        let ancestor = resolve_recursive(&target, in_progress)?;
        resolved.absorb(ancestor);
    }

    // The document's own entries overlay last: whole-entry replacement.
    for (name, setting) in document.rules {
        let activation =
            activation_from_setting(&name, &setting).map_err(|reason| ConfigError::InvalidSetting {
                rule: name.clone(),
                path: path.to_path_buf(),
                reason,
            })?;
        resolved.rules.insert(name, activation);
    }

    for dir in &document.rules_directories {
        resolved.push_directory(base_dir.join(dir));
    }
    resolved.excludes.extend(document.excludes);

    Ok(resolved)
}

/// Resolves an `extends` reference relative to the referencing file.
///
/// A bare reference gets a `.toml` extension; package-style lookup is a
/// file-system collaborator concern outside this crate.
fn resolve_reference(base_dir: &Path, reference: &str) -> PathBuf {
    let mut target = PathBuf::from(reference);
    if target.extension().is_none() {
        target.set_extension("toml");
    }
    if target.is_relative() {
        base_dir.join(target)
    } else {
        target
    }
}

/// Interprets a raw setting as a resolved activation.
fn activation_from_setting(name: &str, setting: &RawRuleSetting) -> Result<RuleActivation, String> {
    let (severity, options) = match setting {
        RawRuleSetting::Switch(true) => (Severity::Error, Vec::new()),
        RawRuleSetting::Switch(false) => (Severity::Off, Vec::new()),
        RawRuleSetting::Configured(values) => match values.split_first() {
            None => (Severity::Error, Vec::new()),
            Some((head, rest)) => {
                let severity = head
                    .as_str()
                    .ok_or_else(|| "first element must be a severity string".to_string())?
                    .parse::<Severity>()?;
                (severity, rest.to_vec())
            }
        },
    };
    Ok(RuleActivation {
        rule_name: name.to_string(),
        severity,
        options,
    })
}
