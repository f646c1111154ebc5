//! Explicit rule registry: rule name to visitor factory.
//!
//! Constructed once per process or per session and passed by reference into
//! the walker; never ambient or global state.

use std::collections::BTreeMap;

use crate::walker::RuleVisitor;

/// Builds a fresh visitor for one walk, seeded with the rule's options.
pub type VisitorFactory = Box<dyn Fn(&[toml::Value]) -> Box<dyn RuleVisitor> + Send + Sync>;

/// Maps rule names to the factories that produce their visitors.
///
/// The engine is agnostic to what any individual rule checks; a rule is just
/// a named factory producing a stateful [`RuleVisitor`] per walk.
#[derive(Default)]
pub struct RuleRegistry {
    factories: BTreeMap<String, VisitorFactory>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&[toml::Value]) -> Box<dyn RuleVisitor> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Builds a fresh visitor for `name`, or `None` if unknown.
    #[must_use]
    pub fn create(&self, name: &str, options: &[toml::Value]) -> Option<Box<dyn RuleVisitor>> {
        self.factories.get(name).map(|factory| factory(options))
    }

    /// Returns true if a rule is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopVisitor;
    impl RuleVisitor for NoopVisitor {}

    #[test]
    fn create_returns_none_for_unknown_rule() {
        let registry = RuleRegistry::new();
        assert!(registry.create("missing", &[]).is_none());
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn factory_receives_options() {
        let mut registry = RuleRegistry::new();
        registry.register("counting", |options| {
            assert_eq!(options.first().and_then(toml::Value::as_integer), Some(3));
            Box::new(NoopVisitor)
        });

        assert!(registry.contains("counting"));
        assert!(registry
            .create("counting", &[toml::Value::Integer(3)])
            .is_some());
    }

    #[test]
    fn register_replaces_previous_entry() {
        let mut registry = RuleRegistry::new();
        registry.register("r", |_| Box::new(NoopVisitor));
        registry.register("r", |_| Box::new(NoopVisitor));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = RuleRegistry::new();
        registry.register("zeta", |_| Box::new(NoopVisitor));
        registry.register("alpha", |_| Box::new(NoopVisitor));
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
