use serde_json::Value as JsonValue;
use sieve_core::{ConfigError, SieveError, TypeShape};

use super::{json_kind, text_of};
use crate::environment::ValidationEnvironment;
use crate::rule::{ConstraintRule, ParamKind, ParamSpec, RuleArguments, RuleOutcome, RuleServices};

const DEFAULT_MAX: i64 = i32::MAX as i64;

/// What gets counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Characters of a `String`/`ID`; pushed down onto list elements.
    Text,
    /// Elements of a list or entries of an input object.
    Container,
}

/// `min <= size <= max`.
#[derive(Debug, Clone)]
pub struct SizeRule {
    name: &'static str,
    measure: Measure,
}

impl SizeRule {
    pub fn text() -> Self {
        Self {
            name: "Size",
            measure: Measure::Text,
        }
    }

    pub fn container() -> Self {
        Self {
            name: "ContainerSize",
            measure: Measure::Container,
        }
    }

    fn size(&self, env: &ValidationEnvironment<'_>) -> Result<usize, SieveError> {
        let value = env.value();
        match (self.measure, value) {
            (Measure::Text, _) => Ok(text_of(env, value)?.chars().count()),
            (Measure::Container, JsonValue::Array(items)) => Ok(items.len()),
            (Measure::Container, JsonValue::Object(entries)) => Ok(entries.len()),
            (Measure::Container, other) => Err(SieveError::internal(
                env.path(),
                format!("expected a list or an object, found {}", json_kind(other)),
            )),
        }
    }
}

impl ConstraintRule for SizeRule {
    fn name(&self) -> &str {
        self.name
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::optional("min", ParamKind::Int, 0),
            ParamSpec::optional("max", ParamKind::Int, DEFAULT_MAX),
        ]
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        match self.measure {
            Measure::Text => shape.is_text(),
            Measure::Container => shape.is_container(),
        }
    }

    fn applies_to_list_elements(&self) -> bool {
        self.measure == Measure::Text
    }

    fn prepare(&self, arguments: &RuleArguments, _services: &RuleServices) -> Result<(), ConfigError> {
        let min = arguments.int("min")?;
        let max = arguments.int("max")?;
        if min < 0 {
            return Err(arguments.invalid("min", "must not be negative"));
        }
        if max < min {
            return Err(arguments.invalid("max", "must not be less than `min`"));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        let size = i64::try_from(self.size(env)?).unwrap_or(i64::MAX);
        let min = arguments.int("min")?;
        let max = arguments.int("max")?;
        Ok(RuleOutcome::check(size >= min && size <= max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::passes;
    use proptest::prelude::*;
    use serde_json::json;
    use sieve_core::ConstraintDeclaration;

    fn size(min: i64, max: i64) -> ConstraintDeclaration {
        ConstraintDeclaration::new("Size")
            .with_argument("min", min)
            .with_argument("max", max)
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let rule = SizeRule::text();
        assert!(passes(&rule, &size(1, 3), "String", json!("héé")));
        assert!(!passes(&rule, &size(1, 3), "String", json!("héllo")));
        assert!(!passes(&rule, &size(1, 3), "String", json!("")));
        assert!(passes(&rule, &size(1, 3), "ID", json!(42)));
    }

    #[test]
    fn test_container_sizes() {
        let rule = SizeRule::container();
        let declaration = ConstraintDeclaration::new("ContainerSize")
            .with_argument("min", 2)
            .with_argument("max", 4);
        assert!(passes(&rule, &declaration, "[Int]", json!([1, 2])));
        assert!(!passes(&rule, &declaration, "[Int]", json!([1])));
        assert!(!passes(&rule, &declaration, "[Int]", json!([1, 2, 3, 4, 5])));
    }

    #[test]
    fn test_defaults() {
        let rule = SizeRule::text();
        assert!(passes(&rule, &ConstraintDeclaration::new("Size"), "String", json!("")));
    }

    #[test]
    fn test_applicability() {
        let schema = sieve_core::Schema::default();
        let string: sieve_core::InputType = "String!".parse().unwrap();
        let list: sieve_core::InputType = "[String]".parse().unwrap();
        assert!(SizeRule::text().applies_to(&schema.shape(&string).unwrap()));
        assert!(!SizeRule::text().applies_to(&schema.shape(&list).unwrap()));
        assert!(SizeRule::container().applies_to(&schema.shape(&list).unwrap()));
        assert!(SizeRule::text().applies_to_list_elements());
        assert!(!SizeRule::container().applies_to_list_elements());
    }

    proptest! {
        #[test]
        fn prop_size_fails_iff_out_of_bounds(text in "\\PC{0,12}", min in 0i64..8, span in 0i64..8) {
            let max = min + span;
            let length = text.chars().count() as i64;
            let passed = passes(&SizeRule::text(), &size(min, max), "String", json!(text));
            prop_assert_eq!(!passed, length < min || length > max);
        }
    }
}
