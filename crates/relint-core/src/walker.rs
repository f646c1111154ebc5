//! Depth-first walker that runs rule visitors over a syntax tree.
//!
//! One full pre-order traversal per active rule: the node-kind callback
//! fires at each node before its children, children are visited in their
//! syntactic left-to-right order, and leaf tokens additionally receive the
//! generic token callback. The order is deterministic; the fix engine relies
//! on failures being discoverable in a stable, reproducible order for
//! tie-breaking.
//!
//! Rule visitors run sequentially, each owning its private state and failure
//! list; no rule observes another rule's in-progress failures. A visitor
//! that panics is caught at the rule boundary and converted into one
//! synthetic crash failure; the walk continues with the remaining rules.

use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::config::{ResolvedConfiguration, RuleActivation};
use crate::failure::{Failure, Severity};
use crate::registry::RuleRegistry;
use crate::span::{Fix, Span};
use crate::tree::{Node, NodeKind, SyntaxTree};

/// Whether the walker descends into a node's children after its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Descent {
    /// Visit children in source order (the default).
    #[default]
    Children,
    /// Suppress descent into this subtree. Used by rules that own
    /// specialized handling of a construct and must not re-inspect what is
    /// nested inside it.
    Skip,
}

/// Per-walk state handed to every visitor callback.
///
/// Carries the source buffer the tree was parsed from, the rule's resolved
/// activation, and the rule's private failure sink.
pub struct WalkContext<'a> {
    source: &'a str,
    rule_name: &'a str,
    severity: Severity,
    options: &'a [toml::Value],
    failures: Vec<Failure>,
}

impl<'a> WalkContext<'a> {
    fn new(source: &'a str, activation: &'a RuleActivation) -> Self {
        Self {
            source,
            rule_name: &activation.rule_name,
            severity: activation.severity,
            options: &activation.options,
            failures: Vec::new(),
        }
    }

    /// The buffer this walk's tree was parsed from.
    #[must_use]
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The running rule's name.
    #[must_use]
    pub fn rule_name(&self) -> &str {
        self.rule_name
    }

    /// The rule's resolved options.
    #[must_use]
    pub fn options(&self) -> &'a [toml::Value] {
        self.options
    }

    /// Slices a node's text out of the source buffer.
    #[must_use]
    pub fn node_text(&self, node: &Node) -> &'a str {
        node.text(self.source)
    }

    /// Reports a failure at this rule's configured severity.
    pub fn report(&mut self, span: Span, message: impl Into<String>) {
        self.failures
            .push(Failure::new(self.rule_name, self.severity, span, message));
    }

    /// Reports a failure carrying a proposed fix.
    pub fn report_with_fix(&mut self, span: Span, message: impl Into<String>, fix: Fix) {
        self.failures
            .push(Failure::new(self.rule_name, self.severity, span, message).with_fix(fix));
    }
}

/// A rule's stateful visitor for one walk.
///
/// Callbacks default to no-ops with full descent; a rule implements only the
/// node kinds it cares about. `visit_token` fires for every leaf token, after
/// that token's kind callback.
#[allow(unused_variables)]
pub trait RuleVisitor {
    /// Called at the root of the buffer.
    fn visit_source_file(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each statement.
    fn visit_statement(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each block.
    fn visit_block(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each function declaration.
    fn visit_function(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each call expression.
    fn visit_call(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each binary expression.
    fn visit_binary_expr(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each identifier.
    fn visit_identifier(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each numeric literal.
    fn visit_number_literal(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each string literal.
    fn visit_string_literal(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called at each comment.
    fn visit_comment(&mut self, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
        Descent::Children
    }

    /// Called for every leaf token, in source order.
    fn visit_token(&mut self, token: &Node, ctx: &mut WalkContext<'_>) {}
}

/// Runs every active rule over the tree and collects their failures.
///
/// Failures append per rule in traversal order; rules are sequenced in the
/// activation table's deterministic order. Ordering by position happens
/// later, in the fix engine and in formatting.
#[must_use]
pub fn walk(
    tree: &SyntaxTree,
    source: &str,
    config: &ResolvedConfiguration,
    registry: &RuleRegistry,
) -> Vec<Failure> {
    let mut failures = Vec::new();
    for activation in config.active() {
        failures.extend(walk_rule(tree, source, activation, registry));
    }
    debug!("walk collected {} failures", failures.len());
    failures
}

/// One rule's full traversal, with the crash boundary.
fn walk_rule(
    tree: &SyntaxTree,
    source: &str,
    activation: &RuleActivation,
    registry: &RuleRegistry,
) -> Vec<Failure> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let Some(mut visitor) = registry.create(&activation.rule_name, &activation.options) else {
            warn!("no implementation found for rule `{}`", activation.rule_name);
            return vec![Failure::new(
                &activation.rule_name,
                Severity::Warning,
                Span::new(0, 0),
                format!(
                    "no implementation found for rule `{}`",
                    activation.rule_name
                ),
            )];
        };
        let mut ctx = WalkContext::new(source, activation);
        walk_node(visitor.as_mut(), tree.root(), &mut ctx);
        ctx.failures
    }));

    match outcome {
        Ok(failures) => failures,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            warn!("rule `{}` crashed: {detail}", activation.rule_name);
            vec![Failure::rule_crash(&activation.rule_name, &detail)]
        }
    }
}

/// Pre-order traversal: kind callback, token callback for leaves, then
/// children unless descent was suppressed.
fn walk_node(visitor: &mut dyn RuleVisitor, node: &Node, ctx: &mut WalkContext<'_>) {
    let descent = dispatch(visitor, node, ctx);
    if node.is_leaf() {
        visitor.visit_token(node, ctx);
        return;
    }
    if descent == Descent::Skip {
        return;
    }
    for child in node.children() {
        walk_node(visitor, child, ctx);
    }
}

fn dispatch(visitor: &mut dyn RuleVisitor, node: &Node, ctx: &mut WalkContext<'_>) -> Descent {
    match node.kind() {
        NodeKind::SourceFile => visitor.visit_source_file(node, ctx),
        NodeKind::Statement => visitor.visit_statement(node, ctx),
        NodeKind::Block => visitor.visit_block(node, ctx),
        NodeKind::Function => visitor.visit_function(node, ctx),
        NodeKind::Call => visitor.visit_call(node, ctx),
        NodeKind::BinaryExpr => visitor.visit_binary_expr(node, ctx),
        NodeKind::Identifier => visitor.visit_identifier(node, ctx),
        NodeKind::NumberLiteral => visitor.visit_number_literal(node, ctx),
        NodeKind::StringLiteral => visitor.visit_string_literal(node, ctx),
        NodeKind::Comment => visitor.visit_comment(node, ctx),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleActivation;

    /// Tree for `"foo 1 { bar }"`-shaped input, built by hand:
    /// a statement with two leading tokens, then a block with one token.
    fn sample_tree() -> (SyntaxTree, &'static str) {
        let source = "foo 1 { bar }";
        let root = Node::new(
            NodeKind::SourceFile,
            Span::new(0, 13),
            vec![Node::new(
                NodeKind::Statement,
                Span::new(0, 13),
                vec![
                    Node::leaf(NodeKind::Identifier, Span::new(0, 3)),
                    Node::leaf(NodeKind::NumberLiteral, Span::new(4, 5)),
                    Node::new(
                        NodeKind::Block,
                        Span::new(6, 13),
                        vec![Node::leaf(NodeKind::Identifier, Span::new(8, 11))],
                    ),
                ],
            )],
        );
        (SyntaxTree::new(root), source)
    }

    fn activation(name: &str) -> RuleActivation {
        RuleActivation {
            rule_name: name.to_string(),
            severity: Severity::Error,
            options: Vec::new(),
        }
    }

    fn config_with(names: &[&str]) -> ResolvedConfiguration {
        let mut config = ResolvedConfiguration::default();
        for name in names {
            config.set_rule(activation(name));
        }
        config
    }

    /// Records every token text it sees, in visit order.
    struct TokenRecorder;
    impl RuleVisitor for TokenRecorder {
        fn visit_token(&mut self, token: &Node, ctx: &mut WalkContext<'_>) {
            let text = ctx.node_text(token).to_string();
            ctx.report(token.span(), text);
        }
    }

    /// Suppresses descent into blocks.
    struct BlockSkipper;
    impl RuleVisitor for BlockSkipper {
        fn visit_block(&mut self, _node: &Node, _ctx: &mut WalkContext<'_>) -> Descent {
            Descent::Skip
        }
        fn visit_token(&mut self, token: &Node, ctx: &mut WalkContext<'_>) {
            let text = ctx.node_text(token).to_string();
            ctx.report(token.span(), text);
        }
    }

    /// Panics at the first identifier it reaches.
    struct Panicker;
    impl RuleVisitor for Panicker {
        fn visit_identifier(&mut self, _node: &Node, _ctx: &mut WalkContext<'_>) -> Descent {
            panic!("boom on identifier");
        }
    }

    #[test]
    fn tokens_visited_in_source_order() {
        let (tree, source) = sample_tree();
        let mut registry = RuleRegistry::new();
        registry.register("recorder", |_| Box::new(TokenRecorder));

        let failures = walk(&tree, source, &config_with(&["recorder"]), &registry);
        let messages: Vec<&str> = failures.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["foo", "1", "bar"]);
    }

    #[test]
    fn skip_children_suppresses_subtree() {
        let (tree, source) = sample_tree();
        let mut registry = RuleRegistry::new();
        registry.register("skipper", |_| Box::new(BlockSkipper));

        let failures = walk(&tree, source, &config_with(&["skipper"]), &registry);
        let messages: Vec<&str> = failures.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["foo", "1"], "block contents not visited");
    }

    #[test]
    fn crashed_rule_does_not_abort_other_rules() {
        let (tree, source) = sample_tree();
        let mut registry = RuleRegistry::new();
        registry.register("panicker", |_| Box::new(Panicker));
        registry.register("recorder", |_| Box::new(TokenRecorder));

        let failures = walk(
            &tree,
            source,
            &config_with(&["panicker", "recorder"]),
            &registry,
        );

        let crash: Vec<&Failure> = failures
            .iter()
            .filter(|f| f.rule_name == "panicker")
            .collect();
        assert_eq!(crash.len(), 1);
        assert_eq!(crash[0].severity, Severity::Error);
        assert!(crash[0].message.contains("`panicker` crashed"));
        assert!(crash[0].message.contains("boom on identifier"));

        let recorded = failures.iter().filter(|f| f.rule_name == "recorder").count();
        assert_eq!(recorded, 3, "second rule unaffected by the crash");
    }

    #[test]
    fn crash_detail_carries_formatted_panic_message() {
        let (tree, source) = sample_tree();
        let mut registry = RuleRegistry::new();
        // A formatted panic carries a `String` payload rather than a `&str`.
        registry.register("limits", |options| {
            panic!("unsupported option count {}", options.len())
        });

        let failures = walk(&tree, source, &config_with(&["limits"]), &registry);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("unsupported option count 0"));
    }

    #[test]
    fn panicking_factory_is_contained() {
        let (tree, source) = sample_tree();
        let mut registry = RuleRegistry::new();
        registry.register("strict", |_| panic!("bad options"));
        registry.register("recorder", |_| Box::new(TokenRecorder));

        let failures = walk(&tree, source, &config_with(&["recorder", "strict"]), &registry);
        let crash: Vec<&Failure> = failures.iter().filter(|f| f.rule_name == "strict").collect();
        assert_eq!(crash.len(), 1);
        assert!(crash[0].message.contains("bad options"));

        let recorded = failures.iter().filter(|f| f.rule_name == "recorder").count();
        assert_eq!(recorded, 3, "other rules unaffected by a factory crash");
    }

    #[test]
    fn unknown_rule_yields_warning_failure() {
        let (tree, source) = sample_tree();
        let registry = RuleRegistry::new();

        let failures = walk(&tree, source, &config_with(&["ghost"]), &registry);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].severity, Severity::Warning);
        assert!(failures[0].message.contains("no implementation"));
    }

    #[test]
    fn disabled_rules_do_not_run() {
        let (tree, source) = sample_tree();
        let mut registry = RuleRegistry::new();
        registry.register("recorder", |_| Box::new(TokenRecorder));

        let mut config = ResolvedConfiguration::default();
        config.set_rule(RuleActivation {
            rule_name: "recorder".to_string(),
            severity: Severity::Off,
            options: Vec::new(),
        });

        let failures = walk(&tree, source, &config, &registry);
        assert!(failures.is_empty());
    }

    #[test]
    fn walk_runs_each_rule_over_the_whole_tree() {
        let (tree, source) = sample_tree();
        let mut registry = RuleRegistry::new();
        registry.register("a", |_| Box::new(TokenRecorder));
        registry.register("b", |_| Box::new(TokenRecorder));

        let failures = walk(&tree, source, &config_with(&["a", "b"]), &registry);
        // Per-rule failures stay contiguous, sequenced by activation order.
        let rules: Vec<&str> = failures.iter().map(|f| f.rule_name.as_str()).collect();
        assert_eq!(rules, vec!["a", "a", "a", "b", "b", "b"]);
    }
}
