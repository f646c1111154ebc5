//! End-to-end session tests: a toy parser plus replacement rules, driven
//! through repeated parse → walk → fix passes.

use relint_core::{
    Descent, Failure, LintOptions, LintSession, Node, NodeKind, ParseError, Parser,
    ResolvedConfiguration, RuleActivation, RuleRegistry, RuleVisitor, Severity, Span, SyntaxTree,
    WalkContext, CONVERGENCE_RULE,
};

/// Scans identifiers and numbers into leaf tokens under one statement.
struct WordParser;

impl Parser for WordParser {
    fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError> {
        let bytes = text.as_bytes();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_alphabetic() || b == b'_' {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Node::leaf(NodeKind::Identifier, Span::new(start, i)));
            } else if b.is_ascii_digit() {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                tokens.push(Node::leaf(NodeKind::NumberLiteral, Span::new(start, i)));
            } else {
                i += 1;
            }
        }
        let statement = Node::new(NodeKind::Statement, Span::new(0, text.len()), tokens);
        let root = Node::new(
            NodeKind::SourceFile,
            Span::new(0, text.len()),
            vec![statement],
        );
        Ok(SyntaxTree::new(root))
    }
}

/// Reports any identifier equal to `from` and proposes replacing it with `to`.
struct ReplaceIdent {
    from: String,
    to: String,
}

impl RuleVisitor for ReplaceIdent {
    fn visit_identifier(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        if ctx.node_text(node) == self.from {
            ctx.report_with_fix(
                node.span(),
                format!("`{}` is banned", self.from),
                relint_core::Fix::single(node.span(), self.to.clone()),
            );
        }
        Descent::Children
    }
}

/// Pads every identifier with a trailing underscore. Never converges: the
/// padded identifier is itself an identifier on the next pass.
struct PadIdent;

impl RuleVisitor for PadIdent {
    fn visit_identifier(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        ctx.report_with_fix(
            node.span(),
            "identifier must be padded",
            relint_core::Fix::single(node.span(), format!("{}_", ctx.node_text(node))),
        );
        Descent::Children
    }
}

fn registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.register("no-foo", |_| {
        Box::new(ReplaceIdent {
            from: "foo".to_string(),
            to: "bar".to_string(),
        })
    });
    registry.register("no-bar", |_| {
        Box::new(ReplaceIdent {
            from: "bar".to_string(),
            to: "baz".to_string(),
        })
    });
    registry.register("pad", |_| Box::new(PadIdent));
    registry
}

fn config_with(rules: &[(&str, Severity)]) -> ResolvedConfiguration {
    let mut config = ResolvedConfiguration::default();
    for (name, severity) in rules {
        config.set_rule(RuleActivation {
            rule_name: (*name).to_string(),
            severity: *severity,
            options: Vec::new(),
        });
    }
    config
}

fn fix_options() -> LintOptions {
    LintOptions {
        fix: true,
        ..LintOptions::default()
    }
}

#[test]
fn converges_across_cascading_fixes() {
    // Pass 1 rewrites foo -> bar (and the preexisting bar -> baz); pass 2
    // rewrites the freshly introduced bar; pass 3 finds nothing.
    let parser = WordParser;
    let registry = registry();
    let config = config_with(&[("no-foo", Severity::Error), ("no-bar", Severity::Error)]);
    let session = LintSession::new(&parser, &registry, &config, fix_options());

    let outcome = session.lint("cascade.x", "foo bar").unwrap();
    assert_eq!(outcome.text, "baz baz");
    assert_eq!(outcome.fixed, 3);
    assert!(outcome.converged);
    assert!(outcome.failures.is_empty());
}

#[test]
fn converged_output_is_a_fixed_point() {
    let parser = WordParser;
    let registry = registry();
    let config = config_with(&[("no-foo", Severity::Error), ("no-bar", Severity::Error)]);
    let session = LintSession::new(&parser, &registry, &config, fix_options());

    let first = session.lint("idem.x", "foo bar qux").unwrap();
    let second = session.lint("idem.x", &first.text).unwrap();

    assert_eq!(second.fixed, 0, "no additional fixes on converged output");
    assert_eq!(second.text, first.text);
    assert_eq!(second.failures, first.failures);
}

#[test]
fn fix_disabled_reports_without_rewriting() {
    let parser = WordParser;
    let registry = registry();
    let config = config_with(&[("no-foo", Severity::Error)]);
    let session = LintSession::new(&parser, &registry, &config, LintOptions::default());

    let outcome = session.lint("report.x", "foo foo").unwrap();
    assert_eq!(outcome.text, "foo foo");
    assert_eq!(outcome.fixed, 0);
    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome.failures.iter().all(|f| f.rule_name == "no-foo"));
    assert!(outcome.has_errors());
}

#[test]
fn pass_bound_yields_non_convergence_warning() {
    let parser = WordParser;
    let registry = registry();
    let config = config_with(&[("pad", Severity::Error)]);
    let options = LintOptions {
        fix: true,
        max_passes: 3,
    };
    let session = LintSession::new(&parser, &registry, &config, options);

    let outcome = session.lint("diverge.x", "x").unwrap();
    assert!(!outcome.converged);
    assert_eq!(outcome.text, "x___", "one pad per pass");
    assert_eq!(outcome.fixed, 3);

    let warning: Vec<&Failure> = outcome
        .failures
        .iter()
        .filter(|f| f.rule_name == CONVERGENCE_RULE)
        .collect();
    assert_eq!(warning.len(), 1);
    assert_eq!(warning[0].severity, Severity::Warning);

    // The final re-walk reports against the returned buffer.
    let pad_failures: Vec<&Failure> = outcome
        .failures
        .iter()
        .filter(|f| f.rule_name == "pad")
        .collect();
    assert_eq!(pad_failures.len(), 1);
    assert_eq!(pad_failures[0].span, Span::new(0, 4));
}

#[test]
fn warning_severity_flows_from_activation() {
    let parser = WordParser;
    let registry = registry();
    let config = config_with(&[("no-foo", Severity::Warning)]);
    let session = LintSession::new(&parser, &registry, &config, LintOptions::default());

    let outcome = session.lint("warn.x", "foo").unwrap();
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].severity, Severity::Warning);
    assert!(!outcome.has_errors());
}

#[test]
fn conflicting_fixes_resolve_over_later_passes() {
    // Both rules target the same identifier: `no-foo` wants foo -> bar and
    // `pad` wants foo -> foo_. One wins per pass; the session still ends in
    // a consistent buffer.
    let parser = WordParser;
    let registry = registry();
    let config = config_with(&[("no-foo", Severity::Error), ("pad", Severity::Error)]);
    let options = LintOptions {
        fix: true,
        max_passes: 4,
    };
    let session = LintSession::new(&parser, &registry, &config, options);

    let outcome = session.lint("conflict.x", "foo").unwrap();
    // Pass 1: both fixes target [0,3); activation order puts `no-foo`
    // first, so foo -> bar and the pad fix is skipped. Later passes pad the
    // surviving identifier until the bound.
    assert!(outcome.text.starts_with("bar"));
    assert!(!outcome.converged, "pad keeps finding the identifier");
}
