//! Entry point for validating one field's arguments

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use sieve_core::{
    ConfigError, FieldCoordinates, InputValueDefinition, Path, Schema, SieveError,
};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::Locale;
use crate::config::ValidatorConfig;
use crate::container::{BoundConstraint, RuleContainer};
use crate::environment::ValidationEnvironment;
use crate::errors::ValidationErrors;
use crate::interpolator::MessageInterpolator;
use crate::registry::ConstraintRegistry;
use crate::rule::RuleServices;
use crate::walker::TreeWalker;

/// What the caller does with a field whose arguments failed validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnValidationErrorStrategy {
    /// Do not resolve the field; report the errors with a null result.
    #[default]
    ReturnNull,
    /// Resolve the field anyway and report the errors alongside the data.
    ContinueWithErrors,
}

/// Argument values submitted for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRequest {
    pub coordinates: FieldCoordinates,
    pub arguments: JsonMap<String, JsonValue>,
    /// Response path of the field; `/<field name>` when absent.
    pub path: Option<Path>,
    pub locale: Option<Locale>,
}

impl FieldRequest {
    pub fn new(coordinates: FieldCoordinates, arguments: JsonMap<String, JsonValue>) -> Self {
        Self {
            coordinates,
            arguments,
            path: None,
            locale: None,
        }
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub errors: ValidationErrors,
    pub strategy: OnValidationErrorStrategy,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether the field should still be resolved.
    pub fn should_continue(&self) -> bool {
        self.is_valid() || self.strategy == OnValidationErrorStrategy::ContinueWithErrors
    }
}

/// Rules bound once per schema, shared by every request.
#[derive(Debug)]
pub struct Validator {
    schema: Arc<Schema>,
    container: RuleContainer,
    services: RuleServices,
    interpolator: MessageInterpolator,
    strategy: OnValidationErrorStrategy,
    default_locale: Locale,
}

impl Validator {
    pub fn new(
        schema: Arc<Schema>,
        registry: &ConstraintRegistry,
        config: &ValidatorConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_services(schema, registry, config, RuleServices::default())
    }

    /// Like [`Validator::new`] with a caller-supplied expression engine.
    pub fn with_services(
        schema: Arc<Schema>,
        registry: &ConstraintRegistry,
        config: &ValidatorConfig,
        services: RuleServices,
    ) -> Result<Self, ConfigError> {
        let container = RuleContainer::build(&schema, registry, &services)?;
        Ok(Self {
            schema,
            container,
            services,
            interpolator: MessageInterpolator::new(config.catalog()),
            strategy: config.error_strategy,
            default_locale: config.locale(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn container(&self) -> &RuleContainer {
        &self.container
    }

    /// Validates the field-level constraints, then every argument in name
    /// order.
    pub fn run_validation(&self, request: &FieldRequest) -> Result<ValidationOutcome, SieveError> {
        let coordinates = &request.coordinates;
        let field = self
            .schema
            .field(coordinates)
            .ok_or_else(|| ConfigError::UnknownField(coordinates.to_string()))?;
        let locale = request.locale.as_ref().unwrap_or(&self.default_locale);
        let path = request
            .path
            .clone()
            .unwrap_or_else(|| Path::root().field(&coordinates.field));

        let field_rules: Vec<&BoundConstraint> =
            self.container.rules_for(&coordinates.site()).iter().collect();
        let whole = (!field_rules.is_empty()).then(|| JsonValue::Object(request.arguments.clone()));

        let walker = TreeWalker::new(&self.container, &self.interpolator);
        let base = ValidationEnvironment::builder(
            &self.schema,
            &self.services,
            coordinates,
            &request.arguments,
            locale,
        )
        .path(path.clone())
        .build();
        let mut errors = ValidationErrors::new();

        if let Some(whole) = &whole {
            let env = base.derive().value(whole).build();
            errors.merge(walker.walk(&env, &field_rules)?.into());
        }

        let mut arguments: Vec<&InputValueDefinition> = field.arguments.iter().collect();
        arguments.sort_by(|a, b| a.name.cmp(&b.name));
        for argument in arguments {
            let Some(value) = request
                .arguments
                .get(&argument.name)
                .or(argument.default.as_ref())
            else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let rules: Vec<&BoundConstraint> = self
                .container
                .rules_for(&coordinates.argument(&argument.name))
                .iter()
                .collect();
            if rules.is_empty() && !self.container.has_constraints_beneath(&argument.ty) {
                continue;
            }
            let env = base
                .derive()
                .argument(&argument.name)
                .value(value)
                .input_type(&argument.ty)
                .path(path.field(&argument.name))
                .build();
            errors.merge(walker.walk(&env, &rules)?.into());
        }

        debug!(field = %coordinates, errors = errors.len(), "validated field arguments");
        Ok(ValidationOutcome {
            errors,
            strategy: self.strategy,
        })
    }
}
