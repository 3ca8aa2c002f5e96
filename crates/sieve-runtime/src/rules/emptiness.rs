use serde_json::Value as JsonValue;
use sieve_core::{SieveError, TypeShape};

use super::{json_kind, text_of};
use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, RuleArguments, RuleOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Targets {
    Text,
    Container,
    TextOrContainer,
}

/// Fails on an empty value; with `ignore_whitespace`, also on all-whitespace text.
#[derive(Debug, Clone)]
pub struct EmptinessRule {
    name: &'static str,
    targets: Targets,
    ignore_whitespace: bool,
}

impl EmptinessRule {
    pub fn not_empty() -> Self {
        Self {
            name: "NotEmpty",
            targets: Targets::TextOrContainer,
            ignore_whitespace: false,
        }
    }

    pub fn container_not_empty() -> Self {
        Self {
            name: "ContainerNotEmpty",
            targets: Targets::Container,
            ignore_whitespace: false,
        }
    }

    pub fn not_blank() -> Self {
        Self {
            name: "NotBlank",
            targets: Targets::Text,
            ignore_whitespace: true,
        }
    }
}

impl ConstraintRule for EmptinessRule {
    fn name(&self) -> &str {
        self.name
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        match self.targets {
            Targets::Text => shape.is_text(),
            Targets::Container => shape.is_container(),
            Targets::TextOrContainer => shape.is_text() || shape.is_container(),
        }
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        _arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        let value = env.value();
        let empty = match value {
            JsonValue::Array(items) => items.is_empty(),
            JsonValue::Object(entries) => entries.is_empty(),
            JsonValue::String(_) | JsonValue::Number(_) => {
                let text = text_of(env, value)?;
                if self.ignore_whitespace {
                    text.trim().is_empty()
                } else {
                    text.is_empty()
                }
            }
            other => {
                return Err(SieveError::internal(
                    env.path(),
                    format!("cannot measure {}", json_kind(other)),
                ))
            }
        };
        Ok(RuleOutcome::check(!empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::passes;
    use serde_json::json;
    use sieve_core::ConstraintDeclaration;

    #[test]
    fn test_not_blank() {
        let rule = EmptinessRule::not_blank();
        let declaration = ConstraintDeclaration::new("NotBlank");
        assert!(!passes(&rule, &declaration, "String", json!("")));
        assert!(!passes(&rule, &declaration, "String", json!(" \t\n")));
        assert!(passes(&rule, &declaration, "String", json!(" x ")));
    }

    #[test]
    fn test_not_empty_accepts_whitespace() {
        let rule = EmptinessRule::not_empty();
        let declaration = ConstraintDeclaration::new("NotEmpty");
        assert!(passes(&rule, &declaration, "String", json!(" ")));
        assert!(!passes(&rule, &declaration, "[String]", json!([])));
        assert!(passes(&rule, &declaration, "[String]", json!(["a"])));
    }

    #[test]
    fn test_container_not_empty_rejects_text_sites() {
        let schema = sieve_core::Schema::default();
        let text: sieve_core::InputType = "String".parse().unwrap();
        let rule = EmptinessRule::container_not_empty();
        assert!(!rule.applies_to(&schema.shape(&text).unwrap()));
        assert!(!passes(&rule, &ConstraintDeclaration::new("ContainerNotEmpty"), "[Int]", json!([])));
    }
}
