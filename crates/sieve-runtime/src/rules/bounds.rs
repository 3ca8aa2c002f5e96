use rust_decimal::Decimal;
use sieve_core::{ConfigError, SieveError, TypeShape};

use super::decimal_of;
use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, ParamKind, ParamSpec, RuleArguments, RuleOutcome, RuleServices};

const INCLUSIVE_ARGUMENT: &str = "inclusive";

/// Which side of the bound a valid value lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// value >= bound (or > when exclusive)
    Lower,
    /// value <= bound (or < when exclusive)
    Upper,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    /// Read from the named declaration argument.
    Argument(ParamSpec),
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusivity {
    Inclusive,
    Exclusive,
    /// Read from the boolean `inclusive` argument, which defaults to true.
    FromArgument,
}

/// One-sided comparison against a decimal bound.
///
/// The sign checks (`Positive`, `NegativeOrZero`, ...) are fixed-zero
/// instances; `Min`/`Max` read an integer bound and `DecimalMin`/
/// `DecimalMax` a decimal one with configurable inclusivity.
#[derive(Debug, Clone)]
pub struct BoundRule {
    name: &'static str,
    direction: Direction,
    threshold: Threshold,
    inclusivity: Inclusivity,
    /// Also legal on text sites, whose values are parsed as decimals. Such
    /// rules are pushed down onto list elements.
    text_values: bool,
}

impl BoundRule {
    pub fn new(
        name: &'static str,
        direction: Direction,
        threshold: Threshold,
        inclusivity: Inclusivity,
    ) -> Self {
        Self {
            name,
            direction,
            threshold,
            inclusivity,
            text_values: false,
        }
    }

    pub fn with_text_values(mut self) -> Self {
        self.text_values = true;
        self
    }

    pub fn min() -> Self {
        Self::new(
            "Min",
            Direction::Lower,
            Threshold::Argument(ParamSpec::optional("value", ParamKind::Int, 0)),
            Inclusivity::Inclusive,
        )
    }

    pub fn max() -> Self {
        Self::new(
            "Max",
            Direction::Upper,
            Threshold::Argument(ParamSpec::optional("value", ParamKind::Int, i64::MAX)),
            Inclusivity::Inclusive,
        )
    }

    pub fn decimal_min() -> Self {
        Self::new(
            "DecimalMin",
            Direction::Lower,
            Threshold::Argument(ParamSpec::required("value", ParamKind::Decimal)),
            Inclusivity::FromArgument,
        )
        .with_text_values()
    }

    pub fn decimal_max() -> Self {
        Self::new(
            "DecimalMax",
            Direction::Upper,
            Threshold::Argument(ParamSpec::required("value", ParamKind::Decimal)),
            Inclusivity::FromArgument,
        )
        .with_text_values()
    }

    pub fn positive() -> Self {
        Self::new("Positive", Direction::Lower, Threshold::Zero, Inclusivity::Exclusive)
    }

    pub fn positive_or_zero() -> Self {
        Self::new(
            "PositiveOrZero",
            Direction::Lower,
            Threshold::Zero,
            Inclusivity::Inclusive,
        )
    }

    pub fn negative() -> Self {
        Self::new("Negative", Direction::Upper, Threshold::Zero, Inclusivity::Exclusive)
    }

    pub fn negative_or_zero() -> Self {
        Self::new(
            "NegativeOrZero",
            Direction::Upper,
            Threshold::Zero,
            Inclusivity::Inclusive,
        )
    }

    fn bound(&self, arguments: &RuleArguments) -> Result<Decimal, ConfigError> {
        match &self.threshold {
            Threshold::Argument(spec) => arguments.decimal(spec.name),
            Threshold::Zero => Ok(Decimal::ZERO),
        }
    }

    fn inclusive(&self, arguments: &RuleArguments) -> Result<bool, ConfigError> {
        match self.inclusivity {
            Inclusivity::Inclusive => Ok(true),
            Inclusivity::Exclusive => Ok(false),
            Inclusivity::FromArgument => arguments.boolean(INCLUSIVE_ARGUMENT),
        }
    }
}

impl ConstraintRule for BoundRule {
    fn name(&self) -> &str {
        self.name
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        if let Threshold::Argument(spec) = &self.threshold {
            params.push(spec.clone());
        }
        if self.inclusivity == Inclusivity::FromArgument {
            params.push(ParamSpec::optional(INCLUSIVE_ARGUMENT, ParamKind::Bool, true));
        }
        params
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        shape.is_numeric() || (self.text_values && shape.is_text())
    }

    fn applies_to_list_elements(&self) -> bool {
        self.text_values
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        let Some(value) = decimal_of(env.value()) else {
            return Ok(RuleOutcome::failed());
        };
        let bound = self.bound(arguments)?;
        let inclusive = self.inclusive(arguments)?;
        let passed = match (self.direction, inclusive) {
            (Direction::Lower, true) => value >= bound,
            (Direction::Lower, false) => value > bound,
            (Direction::Upper, true) => value <= bound,
            (Direction::Upper, false) => value < bound,
        };
        Ok(RuleOutcome::check(passed))
    }
}

/// `min <= value <= max`, both ends inclusive.
#[derive(Debug, Clone, Copy)]
pub struct RangeRule;

impl ConstraintRule for RangeRule {
    fn name(&self) -> &str {
        "Range"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::optional("min", ParamKind::Decimal, 0),
            ParamSpec::optional("max", ParamKind::Decimal, i64::MAX),
        ]
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        shape.is_numeric() || shape.is_text()
    }

    fn applies_to_list_elements(&self) -> bool {
        true
    }

    fn prepare(&self, arguments: &RuleArguments, _services: &RuleServices) -> Result<(), ConfigError> {
        if arguments.decimal("max")? < arguments.decimal("min")? {
            return Err(arguments.invalid("max", "must not be less than `min`"));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        let Some(value) = decimal_of(env.value()) else {
            return Ok(RuleOutcome::failed());
        };
        let min = arguments.decimal("min")?;
        let max = arguments.decimal("max")?;
        Ok(RuleOutcome::check(value >= min && value <= max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::passes;
    use serde_json::json;
    use sieve_core::ConstraintDeclaration;

    #[test]
    fn test_min_max_are_inclusive() {
        let min = ConstraintDeclaration::new("Min").with_argument("value", 5);
        assert!(passes(&BoundRule::min(), &min, "Int", json!(5)));
        assert!(!passes(&BoundRule::min(), &min, "Int", json!(4)));
        let max = ConstraintDeclaration::new("Max").with_argument("value", 5);
        assert!(passes(&BoundRule::max(), &max, "Float", json!(5.0)));
        assert!(!passes(&BoundRule::max(), &max, "Float", json!(5.000001)));
    }

    #[test]
    fn test_decimal_bounds_respect_inclusive_flag() {
        let inclusive = ConstraintDeclaration::new("DecimalMin").with_argument("value", "0.1");
        let exclusive = inclusive.clone().with_argument("inclusive", false);
        let rule = BoundRule::decimal_min();
        assert!(passes(&rule, &inclusive, "Float", json!(0.1)));
        assert!(!passes(&rule, &exclusive, "Float", json!(0.1)));
        assert!(passes(&rule, &exclusive, "String", json!("0.10000000001")));
        assert!(!passes(&rule, &inclusive, "String", json!("not a number")));

        let max = ConstraintDeclaration::new("DecimalMax").with_argument("value", 99.5);
        assert!(passes(&BoundRule::decimal_max(), &max, "Float", json!(99.5)));
        assert!(!passes(&BoundRule::decimal_max(), &max, "String", json!("99.51")));
    }

    #[test]
    fn test_sign_checks() {
        let zero = json!(0);
        let declaration = |name: &str| ConstraintDeclaration::new(name);
        assert!(!passes(&BoundRule::positive(), &declaration("Positive"), "Int", zero.clone()));
        assert!(passes(
            &BoundRule::positive_or_zero(),
            &declaration("PositiveOrZero"),
            "Int",
            zero.clone()
        ));
        assert!(!passes(&BoundRule::negative(), &declaration("Negative"), "Int", zero.clone()));
        assert!(passes(
            &BoundRule::negative_or_zero(),
            &declaration("NegativeOrZero"),
            "Int",
            zero
        ));
        assert!(passes(&BoundRule::negative(), &declaration("Negative"), "Float", json!(-0.5)));
    }

    #[test]
    fn test_range() {
        let declaration = ConstraintDeclaration::new("Range")
            .with_argument("min", 1)
            .with_argument("max", 10);
        assert!(passes(&RangeRule, &declaration, "Int", json!(1)));
        assert!(passes(&RangeRule, &declaration, "Int", json!(10)));
        assert!(!passes(&RangeRule, &declaration, "Int", json!(11)));
        assert!(passes(&RangeRule, &declaration, "String", json!("7.5")));
        assert!(!passes(&RangeRule, &declaration, "String", json!("seven")));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let declaration = ConstraintDeclaration::new("Max").with_argument("value", i64::MAX);
        assert!(passes(&BoundRule::max(), &declaration, "Int", json!(i64::MAX)));
        assert!(!passes(&BoundRule::max(), &declaration, "Int", json!(u64::MAX)));
    }
}
