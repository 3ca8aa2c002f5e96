//! Built-in constraints
//!
//! Families that differ only in a policy share one parameterized type:
//! [`BoundRule`] covers every single-bound comparison, [`SizeRule`] every
//! length check and [`AssertRule`] both boolean assertions.

mod assert;
mod bounds;
mod digits;
mod emptiness;
mod expression;
mod pattern;
mod size;

pub use assert::AssertRule;
pub use bounds::{BoundRule, Direction, Inclusivity, RangeRule, Threshold};
pub use digits::DigitsRule;
pub use emptiness::{EmptinessRule, Targets};
pub use expression::ExpressionRule;
pub(crate) use expression::invalid_expression;
pub use pattern::PatternRule;
pub use size::{Measure, SizeRule};

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sieve_core::SieveError;
use sieve_expr::{parse_decimal, value::json_number_to_decimal};
use std::borrow::Cow;
use std::sync::Arc;

use crate::environment::ValidationEnvironment;
use crate::rule::ConstraintRule;

/// Every built-in rule, in registration order.
pub fn builtin_rules() -> Vec<Arc<dyn ConstraintRule>> {
    vec![
        Arc::new(SizeRule::text()),
        Arc::new(SizeRule::container()),
        Arc::new(EmptinessRule::not_empty()),
        Arc::new(EmptinessRule::container_not_empty()),
        Arc::new(EmptinessRule::not_blank()),
        Arc::new(BoundRule::min()),
        Arc::new(BoundRule::max()),
        Arc::new(BoundRule::decimal_min()),
        Arc::new(BoundRule::decimal_max()),
        Arc::new(RangeRule),
        Arc::new(BoundRule::positive()),
        Arc::new(BoundRule::positive_or_zero()),
        Arc::new(BoundRule::negative()),
        Arc::new(BoundRule::negative_or_zero()),
        Arc::new(AssertRule::assert_true()),
        Arc::new(AssertRule::assert_false()),
        Arc::new(DigitsRule),
        Arc::new(PatternRule),
        Arc::new(ExpressionRule),
    ]
}

/// Exact decimal view of a numeric or textual value. `None` is a failed
/// constraint, not an error.
pub(crate) fn decimal_of(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => json_number_to_decimal(n),
        JsonValue::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Text of a `String`/`ID` value. IDs may arrive as JSON numbers.
pub(crate) fn text_of<'v>(
    env: &ValidationEnvironment<'_>,
    value: &'v JsonValue,
) -> Result<Cow<'v, str>, SieveError> {
    match value {
        JsonValue::String(s) => Ok(Cow::Borrowed(s)),
        JsonValue::Number(n) => Ok(Cow::Owned(n.to_string())),
        other => Err(SieveError::internal(
            env.path(),
            format!("expected a text value, found {}", json_kind(other)),
        )),
    }
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Runs a single rule against a single value outside a full walk.

    use serde_json::{Map as JsonMap, Value as JsonValue};
    use sieve_core::{ConstraintDeclaration, FieldCoordinates, InputType, Path, Schema};

    use crate::catalog::Locale;
    use crate::environment::ValidationEnvironment;
    use crate::rule::{ConstraintRule, RuleArguments, RuleOutcome, RuleServices};

    pub fn arguments(rule: &dyn ConstraintRule, declaration: &ConstraintDeclaration) -> RuleArguments {
        RuleArguments::resolve(
            declaration,
            &rule.parameters(),
            rule.accepts_extra_arguments(),
            "Test.field(value:)",
        )
        .unwrap()
    }

    pub fn outcome(
        rule: &dyn ConstraintRule,
        declaration: &ConstraintDeclaration,
        ty: &str,
        value: JsonValue,
    ) -> RuleOutcome {
        let schema = Schema::default();
        let services = RuleServices::default();
        let coordinates = FieldCoordinates::new("Test", "field");
        let locale = Locale::default();
        let arguments = JsonMap::new();
        let ty: InputType = ty.parse().unwrap();
        let resolved = self::arguments(rule, declaration);
        rule.prepare(&resolved, &services).unwrap();

        let env = ValidationEnvironment::builder(&schema, &services, &coordinates, &arguments, &locale)
            .argument("value")
            .value(&value)
            .input_type(&ty)
            .path(Path::root().field("value"))
            .build();
        rule.evaluate(&env, &resolved).unwrap()
    }

    pub fn passes(
        rule: &dyn ConstraintRule,
        declaration: &ConstraintDeclaration,
        ty: &str,
        value: JsonValue,
    ) -> bool {
        !outcome(rule, declaration, ty, value).is_failed()
    }
}
