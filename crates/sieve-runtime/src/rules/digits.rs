use rust_decimal::Decimal;
use sieve_core::{ConfigError, SieveError, TypeShape};

use super::decimal_of;
use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, ParamKind, ParamSpec, RuleArguments, RuleOutcome, RuleServices};

/// Caps the digits before and after the decimal point. Trailing
/// fractional zeros do not count.
#[derive(Debug, Clone, Copy)]
pub struct DigitsRule;

/// `(integer digits, fraction digits)` of the normalized absolute value.
pub(crate) fn digit_counts(value: Decimal) -> (i64, i64) {
    let normalized = value.abs().normalize();
    let scale = i64::from(normalized.scale());
    let mut mantissa = normalized.mantissa().unsigned_abs();
    let mut precision = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        precision += 1;
    }
    ((precision - scale).max(0), scale)
}

impl ConstraintRule for DigitsRule {
    fn name(&self) -> &str {
        "Digits"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("integer", ParamKind::Int),
            ParamSpec::required("fraction", ParamKind::Int),
        ]
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        shape.is_numeric() || shape.is_text()
    }

    fn applies_to_list_elements(&self) -> bool {
        true
    }

    fn prepare(&self, arguments: &RuleArguments, _services: &RuleServices) -> Result<(), ConfigError> {
        for name in ["integer", "fraction"] {
            if arguments.int(name)? < 0 {
                return Err(arguments.invalid(name, "must not be negative"));
            }
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
        let (integer, fraction) = digit_counts(value);
        Ok(RuleOutcome::check(
            integer <= arguments.int("integer")? && fraction <= arguments.int("fraction")?,
        ))
    }
}
