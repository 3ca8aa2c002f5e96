//! Recursive descent through argument values
//!
//! Null stops descent. Every rule at a node runs; a failing node still has
//! its children walked. Errors come out in a fixed order: a node's own
//! errors, then list elements by index, then input-object fields by name.

use serde_json::Value as JsonValue;
use sieve_core::{InputValueDefinition, SieveError};
use tracing::trace;

use crate::container::{BoundConstraint, RuleContainer};
use crate::environment::ValidationEnvironment;
use crate::errors::ValidationError;
use crate::interpolator::MessageInterpolator;
use crate::rule::RuleOutcome;
use crate::rules::json_kind;

#[derive(Debug, Clone, Copy)]
pub struct TreeWalker<'v> {
    container: &'v RuleContainer,
    interpolator: &'v MessageInterpolator,
}

impl<'v> TreeWalker<'v> {
    pub fn new(container: &'v RuleContainer, interpolator: &'v MessageInterpolator) -> Self {
        Self {
            container,
            interpolator,
        }
    }

    /// Validates `env`'s value and everything beneath it with `rules`
    /// bound at this position.
    pub fn walk(
        &self,
        env: &ValidationEnvironment<'_>,
        rules: &[&BoundConstraint],
    ) -> Result<Vec<ValidationError>, SieveError> {
        let mut errors = Vec::new();
        self.visit(env, rules, &mut errors)?;
        Ok(errors)
    }

    fn visit(
        &self,
        env: &ValidationEnvironment<'_>,
        rules: &[&BoundConstraint],
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), SieveError> {
        let value = env.value();
        if value.is_null() {
            return Ok(());
        }
        trace!(path = %env.path(), rules = rules.len(), "visiting value");

        let Some(ty) = env.input_type() else {
            return self.apply(env, rules, errors);
        };

        if let Some(element) = ty.list_element() {
            let (pushed, own): (Vec<&BoundConstraint>, Vec<&BoundConstraint>) =
                rules.iter().copied().partition(|bound| bound.pushes_down());
            self.apply(env, &own, errors)?;

            let JsonValue::Array(items) = value else {
                return Err(SieveError::internal(
                    env.path(),
                    format!("`{}` expects a list, found {}", ty, json_kind(value)),
                ));
            };
            if pushed.is_empty() && !self.container.has_constraints_beneath(element) {
                return Ok(());
            }
            for (index, item) in items.iter().enumerate() {
                let child = env.for_list_element(index, item, element);
                self.visit(&child, &pushed, errors)?;
            }
            return Ok(());
        }

        self.apply(env, rules, errors)?;

        let Some(object) = env.schema().input_object(ty.named_type()) else {
            return Ok(());
        };
        let JsonValue::Object(entries) = value else {
            return Err(SieveError::internal(
                env.path(),
                format!("`{}` expects an object, found {}", ty, json_kind(value)),
            ));
        };

        let mut fields: Vec<&InputValueDefinition> = object.fields.iter().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        for field in fields {
            let Some(field_value) = entries.get(&field.name).or(field.default.as_ref()) else {
                continue;
            };
            if field_value.is_null() {
                continue;
            }
            let bound: Vec<&BoundConstraint> = self
                .container
                .rules_for_input_field(&object.name, &field.name)
                .iter()
                .collect();
            if bound.is_empty() && !self.container.has_constraints_beneath(&field.ty) {
                continue;
            }
            let child = env.for_field(&field.name, field_value, &field.ty);
            self.visit(&child, &bound, errors)?;
        }
        Ok(())
    }

    fn apply(
        &self,
        env: &ValidationEnvironment<'_>,
        rules: &[&BoundConstraint],
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), SieveError> {
        for bound in rules {
            let outcome = bound.rule().evaluate(env, bound.arguments())?;
            trace!(
                constraint = bound.name(),
                path = %env.path(),
                failed = outcome.is_failed(),
                "evaluated constraint"
            );
            let RuleOutcome::Failed(extra) = outcome else {
                continue;
            };
            let mut params = bound.arguments().to_bindings();
            params.extend(extra);
            let error = self
                .interpolator
                .interpolate(&bound.message_key(), bound.name(), params, env)?
                .with_coordinates(bound.site().clone());
            errors.push(error);
        }
        Ok(())
    }
}
