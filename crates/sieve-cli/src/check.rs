use anyhow::{Context, Result};
use sieve_core::FieldCoordinates;
use sieve_runtime::{
    ConstraintRegistry, FieldRequest, ValidationOutcome, Validator, ValidatorConfig,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::source::{load_config, load_schema, load_values};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub schema: PathBuf,
    /// `Type.field`
    pub field: String,
    pub values: PathBuf,
    pub locale: Option<String>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug)]
pub struct CheckReport {
    pub outcome: ValidationOutcome,
    pub rendered: String,
}

/// Validates one field's argument values against the schema's constraints.
pub fn run_check(options: &CheckOptions) -> Result<CheckReport> {
    let coordinates: FieldCoordinates = options
        .field
        .parse()
        .with_context(|| format!("Invalid field: {}", options.field))?;
    let schema = load_schema(&options.schema)?;
    let arguments = load_values(&options.values)?;
    let config = load_config(options.config.as_deref())?;

    let validator = Validator::new(Arc::new(schema), &ConstraintRegistry::with_builtins(), &config)
        .context("Schema constraints are invalid")?;
    let mut request = FieldRequest::new(coordinates, arguments);
    if let Some(locale) = &options.locale {
        request = request.with_locale(locale.as_str());
    }

    info!("Validating arguments of {}", request.coordinates);
    let outcome = validator
        .run_validation(&request)
        .with_context(|| format!("Validation of {} aborted", request.coordinates))?;

    let rendered = match options.format {
        OutputFormat::Text => outcome.errors.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
    };
    Ok(CheckReport { outcome, rendered })
}

/// One line per constrained site: `Mutation.tag(tags:): Size(max: 5, min: 1)`.
pub fn list_rules(schema: &std::path::Path) -> Result<String> {
    let validator = Validator::new(
        Arc::new(load_schema(schema)?),
        &ConstraintRegistry::with_builtins(),
        &ValidatorConfig::default(),
    )
    .context("Schema constraints are invalid")?;

    let mut listing = String::new();
    for (site, rules) in validator.container().sites() {
        let rendered: Vec<String> = rules
            .iter()
            .map(|bound| {
                let arguments: Vec<String> = bound
                    .arguments()
                    .to_bindings()
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .collect();
                if arguments.is_empty() {
                    bound.name().to_string()
                } else {
                    format!("{}({})", bound.name(), arguments.join(", "))
                }
            })
            .collect();
        writeln!(listing, "{}: {}", site, rendered.join(", "))?;
    }
    Ok(listing)
}
