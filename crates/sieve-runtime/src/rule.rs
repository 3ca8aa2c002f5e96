//! The contract every constraint implements
//!
//! Built-in and user-registered constraints go through the same
//! [`ConstraintRule`] trait. A rule is stateless: everything it needs at
//! evaluation time comes from the [`ValidationEnvironment`] and the
//! declaration's resolved [`RuleArguments`]; the only shared state is the
//! insert-only caches in [`RuleServices`].

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sieve_core::{ConfigError, ConstraintDeclaration, SieveError, TypeShape};
use sieve_expr::{parse_decimal, Bindings, CachingEngine, ExpressionEngine, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::environment::ValidationEnvironment;
use crate::pattern_cache::PatternCache;

/// Declaration argument every constraint accepts; overrides the message key.
pub const MESSAGE_ARGUMENT: &str = "message";

/// JSON kind a declaration argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Bool,
    String,
    /// A JSON number or a string holding a decimal literal.
    Decimal,
}

impl ParamKind {
    fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            ParamKind::Int => value.is_i64(),
            ParamKind::Bool => value.is_boolean(),
            ParamKind::String => value.is_string(),
            ParamKind::Decimal => decimal_argument(value).is_some(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ParamKind::Int => "an integer",
            ParamKind::Bool => "a boolean",
            ParamKind::String => "a string",
            ParamKind::Decimal => "a decimal number",
        }
    }
}

/// One declaration argument a rule understands.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// `None` makes the argument required.
    pub default: Option<JsonValue>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, default: impl Into<JsonValue>) -> Self {
        Self {
            name,
            kind,
            default: Some(default.into()),
        }
    }
}

/// A declaration's arguments after defaults are filled in and kinds checked.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleArguments {
    constraint: String,
    site: String,
    values: BTreeMap<String, JsonValue>,
}

impl RuleArguments {
    /// Checks `declaration` against `specs` and fills in defaults.
    pub fn resolve(
        declaration: &ConstraintDeclaration,
        specs: &[ParamSpec],
        accepts_extra: bool,
        site: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let mut arguments = Self {
            constraint: declaration.name.clone(),
            site: site.into(),
            values: BTreeMap::new(),
        };

        for (name, value) in &declaration.arguments {
            if name == MESSAGE_ARGUMENT {
                if !value.is_string() {
                    return Err(arguments.invalid(name, "expected a string"));
                }
            } else if let Some(spec) = specs.iter().find(|s| s.name == name) {
                if !spec.kind.accepts(value) {
                    return Err(arguments.invalid(name, format!("expected {}", spec.kind.describe())));
                }
            } else if !accepts_extra {
                return Err(ConfigError::UnknownArgument {
                    constraint: arguments.constraint.clone(),
                    argument: name.clone(),
                    site: arguments.site.clone(),
                });
            }
            arguments.values.insert(name.clone(), value.clone());
        }

        for spec in specs {
            if arguments.values.contains_key(spec.name) {
                continue;
            }
            match &spec.default {
                Some(default) => {
                    arguments.values.insert(spec.name.to_string(), default.clone());
                }
                None => return Err(arguments.missing(spec.name)),
            }
        }
        Ok(arguments)
    }

    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Result<i64, ConfigError> {
        let value = self.require(name)?;
        value
            .as_i64()
            .ok_or_else(|| self.invalid(name, "expected an integer"))
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ConfigError> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| self.invalid(name, "expected a boolean"))
    }

    pub fn string(&self, name: &str) -> Result<&str, ConfigError> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| self.invalid(name, "expected a string"))
    }

    pub fn decimal(&self, name: &str) -> Result<Decimal, ConfigError> {
        let value = self.require(name)?;
        decimal_argument(value).ok_or_else(|| self.invalid(name, "expected a decimal number"))
    }

    /// Message key or literal that replaces the rule's own key.
    pub fn message(&self) -> Option<&str> {
        self.values.get(MESSAGE_ARGUMENT).and_then(JsonValue::as_str)
    }

    /// Arguments as message parameters, the override message excluded.
    pub fn to_bindings(&self) -> Bindings {
        self.values
            .iter()
            .filter(|(name, _)| name.as_str() != MESSAGE_ARGUMENT)
            .map(|(name, value)| (name.clone(), Value::from_json(value)))
            .collect()
    }

    /// A configuration error about argument `name`, for use in `prepare`.
    pub fn invalid(&self, name: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidArgument {
            constraint: self.constraint.clone(),
            argument: name.to_string(),
            site: self.site.clone(),
            reason: reason.into(),
        }
    }

    fn missing(&self, name: &str) -> ConfigError {
        ConfigError::MissingArgument {
            constraint: self.constraint.clone(),
            argument: name.to_string(),
            site: self.site.clone(),
        }
    }

    fn require(&self, name: &str) -> Result<&JsonValue, ConfigError> {
        self.values.get(name).ok_or_else(|| self.missing(name))
    }
}

fn decimal_argument(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => sieve_expr::value::json_number_to_decimal(n),
        JsonValue::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// What a rule reports for one value.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Passed,
    /// Carries message parameters beyond the declaration's own arguments.
    Failed(Bindings),
}

impl RuleOutcome {
    pub fn failed() -> Self {
        RuleOutcome::Failed(Bindings::new())
    }

    pub fn check(passed: bool) -> Self {
        if passed {
            RuleOutcome::Passed
        } else {
            RuleOutcome::failed()
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RuleOutcome::Failed(_))
    }
}

/// Caches shared by every rule of one validator.
#[derive(Debug, Clone)]
pub struct RuleServices {
    engine: Arc<dyn ExpressionEngine>,
    patterns: Arc<PatternCache>,
}

impl RuleServices {
    pub fn new(engine: Arc<dyn ExpressionEngine>) -> Self {
        Self {
            engine,
            patterns: Arc::new(PatternCache::new()),
        }
    }

    pub fn engine(&self) -> &dyn ExpressionEngine {
        self.engine.as_ref()
    }

    pub fn patterns(&self) -> &PatternCache {
        &self.patterns
    }
}

impl Default for RuleServices {
    fn default() -> Self {
        Self::new(Arc::new(CachingEngine::new()))
    }
}

pub trait ConstraintRule: Send + Sync {
    /// Name used in declarations, e.g. `Size`.
    fn name(&self) -> &str;

    fn message_key(&self) -> String {
        format!("sieve.validation.{}.message", self.name())
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Whether a declaration is legal on a site of this shape. Non-null
    /// wrappers are already gone.
    fn applies_to(&self, shape: &TypeShape<'_>) -> bool;

    /// On a list-typed site the rule runs once per element instead of on
    /// the list itself.
    fn applies_to_list_elements(&self) -> bool {
        false
    }

    /// Whether the rule may be declared on an output field, where the value
    /// is the whole argument map.
    fn applies_to_field(&self) -> bool {
        false
    }

    fn accepts_extra_arguments(&self) -> bool {
        false
    }

    /// Build-time checks beyond argument kinds: compile patterns, parse
    /// expressions, check ranges.
    fn prepare(
        &self,
        _arguments: &RuleArguments,
        _services: &RuleServices,
    ) -> Result<(), ConfigError> {
        Ok(())
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError>;
}

impl fmt::Debug for dyn ConstraintRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstraintRule").field(&self.name()).finish()
    }
}

type AppliesFn = dyn Fn(&TypeShape<'_>) -> bool + Send + Sync;
type EvaluateFn = dyn Fn(&ValidationEnvironment<'_>, &RuleArguments) -> Result<RuleOutcome, SieveError>
    + Send
    + Sync;

/// A rule assembled from two closures, for custom registrations. Any
/// declaration arguments are passed through untouched.
pub struct FnRule {
    name: String,
    applies: Box<AppliesFn>,
    evaluate: Box<EvaluateFn>,
}

impl FnRule {
    pub fn new<A, E>(name: impl Into<String>, applies: A, evaluate: E) -> Self
    where
        A: Fn(&TypeShape<'_>) -> bool + Send + Sync + 'static,
        E: Fn(&ValidationEnvironment<'_>, &RuleArguments) -> Result<RuleOutcome, SieveError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            applies: Box::new(applies),
            evaluate: Box::new(evaluate),
        }
    }
}

impl ConstraintRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies_to(&self, shape: &TypeShape<'_>) -> bool {
        (self.applies)(shape)
    }

    fn accepts_extra_arguments(&self) -> bool {
        true
    }

    fn evaluate(
        &self,
        env: &ValidationEnvironment<'_>,
        arguments: &RuleArguments,
    ) -> Result<RuleOutcome, SieveError> {
        (self.evaluate)(env, arguments)
    }
}
