//! Constraint binding and validation for sieve
//!
//! A [`Validator`] binds every constraint declared in a [`sieve_core::Schema`]
//! once, then checks argument values of individual fields on request:
//!
//! ```
//! use serde_json::json;
//! use sieve_core::{ConstraintDeclaration, FieldCoordinates, FieldDefinition, InputValueDefinition, ObjectType, Schema};
//! use sieve_runtime::{ConstraintRegistry, FieldRequest, Validator, ValidatorConfig};
//! use std::sync::Arc;
//!
//! let schema = Schema::builder()
//!     .object(ObjectType::new("Query").with_field(
//!         FieldDefinition::new("user").with_argument(
//!             InputValueDefinition::new("name", "String!".parse().unwrap())
//!                 .with_constraint(ConstraintDeclaration::new("Size").with_argument("max", 3)),
//!         ),
//!     ))
//!     .build()
//!     .unwrap();
//! let validator = Validator::new(
//!     Arc::new(schema),
//!     &ConstraintRegistry::with_builtins(),
//!     &ValidatorConfig::default(),
//! )
//! .unwrap();
//!
//! let arguments = json!({"name": "Ferris"}).as_object().cloned().unwrap_or_default();
//! let request = FieldRequest::new(FieldCoordinates::new("Query", "user"), arguments);
//! let outcome = validator.run_validation(&request).unwrap();
//! assert_eq!(
//!     outcome.errors.errors[0].to_string(),
//!     "/user/name: /user/name size must be between 0 and 3 [Size]"
//! );
//! ```

pub mod catalog;
pub mod config;
pub mod container;
pub mod environment;
pub mod errors;
pub mod interpolator;
pub mod matcher;
pub mod pattern_cache;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod validator;
pub mod walker;

pub use catalog::{bundled_template, CatalogSet, Locale, MessageCatalog};
pub use config::{ConfigFileError, ValidatorConfig};
pub use container::{BoundConstraint, RuleContainer};
pub use environment::{EnvironmentBuilder, ValidationEnvironment};
pub use errors::{ValidationError, ValidationErrors};
pub use interpolator::MessageInterpolator;
pub use matcher::{applicable_type, ConstraintPresence};
pub use pattern_cache::PatternCache;
pub use registry::ConstraintRegistry;
pub use rule::{
    ConstraintRule, FnRule, ParamKind, ParamSpec, RuleArguments, RuleOutcome, RuleServices,
    MESSAGE_ARGUMENT,
};
pub use validator::{FieldRequest, OnValidationErrorStrategy, ValidationOutcome, Validator};
pub use walker::TreeWalker;
