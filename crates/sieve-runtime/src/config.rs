//! Validator settings loaded from TOML
//!
//! ```toml
//! default_locale = "en"
//! error_strategy = "continue-with-errors"
//!
//! [messages.de]
//! "sieve.validation.NotBlank.message" = "{path} darf nicht leer sein"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{CatalogSet, Locale};
use crate::validator::OnValidationErrorStrategy;

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid validator config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Locale used when a request names none, and the last fallback before
    /// the bundled English templates.
    #[serde(default = "default_locale")]
    pub default_locale: String,
    #[serde(default)]
    pub error_strategy: OnValidationErrorStrategy,
    /// Locale to message key to template.
    #[serde(default)]
    pub messages: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            error_strategy: OnValidationErrorStrategy::default(),
            messages: BTreeMap::new(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigFileError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn locale(&self) -> Locale {
        Locale::new(&self.default_locale)
    }

    /// The message catalog described by this config.
    pub fn catalog(&self) -> CatalogSet {
        self.messages
            .iter()
            .fold(CatalogSet::new(self.locale()), |catalog, (locale, table)| {
                catalog.with_messages(
                    locale.as_str(),
                    table.iter().map(|(k, v)| (k.clone(), v.clone())),
                )
            })
    }
}
