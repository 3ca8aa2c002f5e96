use sieve_core::{ConfigError, SieveError, TypeShape};

use super::text_of;
use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, ParamKind, ParamSpec, RuleArguments, RuleOutcome, RuleServices};

/// The whole value must match `regexp`.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule;

impl ConstraintRule for PatternRule {
    fn name(&self) -> &str {
        "Pattern"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("regexp", ParamKind::String)]
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        shape.is_text()
    }

    fn applies_to_list_elements(&self) -> bool {
        true
    }

    fn prepare(&self, arguments: &RuleArguments, services: &RuleServices) -> Result<(), ConfigError> {
        services
            .patterns()
            .get_or_compile(arguments.string("regexp")?)
            .map(|_| ())
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        let regex = env
            .services()
            .patterns()
            .get_or_compile(arguments.string("regexp")?)?;
        let text = text_of(env, env.value())?;
        Ok(RuleOutcome::check(regex.is_match(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::passes;
    use serde_json::json;
    use sieve_core::ConstraintDeclaration;

    #[test]
    fn test_pattern_matches_whole_string() {
        let declaration = ConstraintDeclaration::new("Pattern").with_argument("regexp", "[0-9]{5}");
        assert!(passes(&PatternRule, &declaration, "String", json!("12345")));
        assert!(!passes(&PatternRule, &declaration, "String", json!("123456")));
        assert!(!passes(&PatternRule, &declaration, "String", json!("x12345")));
    }

    #[test]
    fn test_invalid_pattern_fails_prepare() {
        let declaration = ConstraintDeclaration::new("Pattern").with_argument("regexp", "[");
        let arguments = crate::rules::testing::arguments(&PatternRule, &declaration);
        assert!(matches!(
            PatternRule.prepare(&arguments, &RuleServices::default()),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}
