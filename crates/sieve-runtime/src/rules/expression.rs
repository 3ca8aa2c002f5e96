use sieve_core::{ConfigError, SieveError, TypeShape};
use sieve_expr::ExprError;
use tracing::warn;

use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, ParamKind, ParamSpec, RuleArguments, RuleOutcome, RuleServices};

/// Custom boolean check written in the expression language.
///
/// Legal on any site, including output fields where `validatedValue` is
/// the whole argument map. An evaluation error or a non-boolean result
/// counts as a failure.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionRule;

impl ConstraintRule for ExpressionRule {
    fn name(&self) -> &str {
        "Expression"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("value", ParamKind::String)]
    }

    fn applies_to(&self, _shape: &TypeShape<'_>) -> bool {
        true
    }

    fn applies_to_field(&self) -> bool {
        true
    }

    fn prepare(&self, arguments: &RuleArguments, services: &RuleServices) -> Result<(), ConfigError> {
        let expression = arguments.string("value")?;
        services
            .engine()
            .check(expression)
            .map_err(|e| invalid_expression(expression, e))
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        let expression = arguments.string("value")?;
        let bindings = env.expression_bindings();
        match env.services().engine().evaluate_boolean(expression, &bindings) {
            Ok(passed) => Ok(RuleOutcome::check(passed)),
            Err(e) if e.is_syntax() => Err(invalid_expression(expression, e).into()),
            Err(e) => {
                warn!(path = %env.path(), error = %e, "expression constraint could not be evaluated");
                Ok(RuleOutcome::failed())
            }
        }
    }
}

pub(crate) fn invalid_expression(expression: &str, error: ExprError) -> ConfigError {
    ConfigError::InvalidExpression {
        expression: expression.to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{arguments, passes};
    use serde_json::json;
    use sieve_core::ConstraintDeclaration;

    fn expression(text: &str) -> ConstraintDeclaration {
        ConstraintDeclaration::new("Expression").with_argument("value", text)
    }

    #[test]
    fn test_validated_value_binding() {
        let declaration = expression("${validatedValue.startsWith('SKU-')}");
        assert!(passes(&ExpressionRule, &declaration, "String", json!("SKU-1")));
        assert!(!passes(&ExpressionRule, &declaration, "String", json!("1")));
    }

    #[test]
    fn test_evaluation_errors_fail_the_constraint() {
        let declaration = expression("validatedValue / 0 > 1");
        assert!(!passes(&ExpressionRule, &declaration, "Int", json!(4)));
        let declaration = expression("validatedValue + 1");
        assert!(!passes(&ExpressionRule, &declaration, "Int", json!(4)));
    }

    #[test]
    fn test_syntax_errors_fail_prepare() {
        let declaration = expression("validatedValue >");
        let resolved = arguments(&ExpressionRule, &declaration);
        assert!(matches!(
            ExpressionRule.prepare(&resolved, &RuleServices::default()),
            Err(ConfigError::InvalidExpression { .. })
        ));
    }
}
