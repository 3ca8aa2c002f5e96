use sieve_core::{ConfigError, SieveError, TypeShape};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, FnRule, RuleArguments, RuleOutcome};
use crate::rules::builtin_rules;

/// Name to rule map, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    rules: BTreeMap<String, Arc<dyn ConstraintRule>>,
}

impl ConstraintRegistry {
    /// An empty registry; most callers want [`ConstraintRegistry::with_builtins`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let rules = builtin_rules()
            .into_iter()
            .map(|rule| (rule.name().to_string(), rule))
            .collect();
        Self { rules }
    }

    /// Adds a rule. Names are unique, built-ins included.
    pub fn register(&mut self, rule: Arc<dyn ConstraintRule>) -> Result<(), ConfigError> {
        let name = rule.name().to_string();
        if self.rules.contains_key(&name) {
            return Err(ConfigError::DuplicateConstraint(name));
        }
        debug!(constraint = %name, "registered constraint");
        self.rules.insert(name, rule);
        Ok(())
    }

    /// Registers a custom constraint from an applicability predicate and an
    /// evaluation function.
    pub fn register_constraint<A, E>(
        &mut self,
        name: impl Into<String>,
        applies: A,
        evaluate: E,
    ) -> Result<(), ConfigError>
    where
        A: Fn(&TypeShape<'_>) -> bool + Send + Sync + 'static,
        E: Fn(&ValidationEnvironment<'_>, &RuleArguments) -> Result<RuleOutcome, SieveError>
            + Send
            + Sync
            + 'static,
    {
        self.register(Arc::new(FnRule::new(name, applies, evaluate)))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ConstraintRule>> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_ordered_by_name() {
        let registry = ConstraintRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(registry.contains("Pattern"));
        assert_eq!(registry.len(), 19);
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = ConstraintRegistry::with_builtins();
        registry
            .register_constraint(
                "Even",
                |shape| shape.is_numeric(),
                |env, _| Ok(RuleOutcome::check(env.value().as_i64().is_some_and(|n| n % 2 == 0))),
            )
            .unwrap();
        assert!(registry.get("Even").is_some());

        let duplicate = registry.register_constraint("Size", |_| true, |_, _| Ok(RuleOutcome::Passed));
        assert_eq!(duplicate, Err(ConfigError::DuplicateConstraint("Size".into())));
    }
}
