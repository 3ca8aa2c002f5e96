//! Reading schemas, argument values and validator config from disk

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Value as JsonValue};
use sieve_core::Schema;
use sieve_runtime::ValidatorConfig;
use std::fs;
use std::path::Path;
use tracing::debug;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Parses JSON, or YAML when the extension says so.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML: {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON: {}", path.display()))
    }
}

pub fn load_schema(path: &Path) -> Result<Schema> {
    let schema: Schema = read_document(path)?;
    debug!(
        path = %path.display(),
        inputs = schema.input_objects().count(),
        objects = schema.objects().count(),
        "loaded schema"
    );
    Ok(schema)
}

/// Argument values for one field: a JSON (or YAML) object keyed by
/// argument name.
pub fn load_values(path: &Path) -> Result<JsonMap<String, JsonValue>> {
    match read_document::<JsonValue>(path)? {
        JsonValue::Object(arguments) => Ok(arguments),
        other => bail!(
            "{} must hold an object of argument values, found {}",
            path.display(),
            kind(&other)
        ),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    match path {
        Some(path) => ValidatorConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(ValidatorConfig::default()),
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "an object",
    }
}
