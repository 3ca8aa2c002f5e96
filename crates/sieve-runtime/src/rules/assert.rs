use serde_json::Value as JsonValue;
use sieve_core::{SieveError, TypeShape};

use super::json_kind;
use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, RuleArguments, RuleOutcome};

/// Passes when a boolean value equals `expected`.
#[derive(Debug, Clone, Copy)]
pub struct AssertRule {
    name: &'static str,
    expected: bool,
}

impl AssertRule {
    pub fn assert_true() -> Self {
        Self {
            name: "AssertTrue",
            expected: true,
        }
    }

    pub fn assert_false() -> Self {
        Self {
            name: "AssertFalse",
            expected: false,
        }
    }
}

impl ConstraintRule for AssertRule {
    fn name(&self) -> &str {
        self.name
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        shape.is_boolean()
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        _arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        match env.value() {
            JsonValue::Bool(b) => Ok(RuleOutcome::check(*b == self.expected)),
            other => Err(SieveError::internal(
                env.path(),
                format!("expected a boolean, found {}", json_kind(other)),
            )),
        }
    }
}
