//! Message rendering
//!
//! A message key is resolved through the catalog, or used as literal text
//! when no template exists. `{name}` placeholders are then filled from the
//! parameters and every `${...}` block is evaluated with the same
//! parameters bound as variables.

use sieve_core::SieveError;
use sieve_expr::{split_template, Bindings, Segment, Value};
use tracing::warn;

use crate::catalog::CatalogSet;
use crate::environment::ValidationEnvironment;
use crate::errors::ValidationError;
use crate::rules::invalid_expression;

#[derive(Debug, Clone, Default)]
pub struct MessageInterpolator {
    catalog: CatalogSet,
}

impl MessageInterpolator {
    pub fn new(catalog: CatalogSet) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &CatalogSet {
        &self.catalog
    }

    /// Renders the failure of `constraint` at the environment's position.
    ///
    /// `validatedValue`, `constraint` and `path` are always bound; values
    /// already in `params` under those names are replaced.
    pub fn interpolate(
        &self,
        key: &str,
        constraint: &str,
        mut params: Bindings,
        env: &ValidationEnvironment<'_>,
    ) -> Result<ValidationError, SieveError> {
        let template = self.catalog.resolve(env.locale(), key).unwrap_or(key);
        params.insert("validatedValue".into(), Value::from_json(env.value()));
        params.insert("constraint".into(), Value::from(constraint));
        params.insert("path".into(), Value::from(env.path().to_string()));

        let mut message = String::with_capacity(template.len());
        for segment in split_template(template) {
            match segment {
                Segment::Literal(text) => substitute(text, &params, &mut message),
                Segment::Expression(expression) => {
                    match env.services().engine().evaluate(expression, &params) {
                        Ok(value) => message.push_str(&value.to_string()),
                        Err(e) if e.is_syntax() => {
                            return Err(invalid_expression(expression, e).into())
                        }
                        Err(e) => {
                            warn!(key, error = %e, "message expression could not be evaluated");
                            message.push_str("${");
                            message.push_str(expression);
                            message.push('}');
                        }
                    }
                }
            }
        }

        Ok(ValidationError::new(env.path().clone(), constraint, message).with_coordinates(env.site()))
    }
}

/// Replaces `{name}` with the bound value. Unknown names and anything that
/// is not a plain identifier are copied through.
fn substitute(text: &str, params: &Bindings, out: &mut String) {
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        match (after[name_len..].starts_with('}'), params.get(name)) {
            (true, Some(value)) if !name.is_empty() => {
                out.push_str(&value.to_string());
                rest = &after[name_len + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
}
