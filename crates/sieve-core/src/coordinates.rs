//! Addresses of validation sites inside a schema

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A field on an object type (`Mutation.createUser`) or an input object
/// (`AddressInput.street`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldCoordinates {
    pub container: String,
    pub field: String,
}

impl FieldCoordinates {
    pub fn new(container: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            field: field.into(),
        }
    }

    /// The argument-level site beneath this field.
    pub fn argument(&self, argument: impl Into<String>) -> SiteCoordinates {
        SiteCoordinates {
            field: self.clone(),
            argument: Some(argument.into()),
        }
    }

    /// The field-level site itself.
    pub fn site(&self) -> SiteCoordinates {
        SiteCoordinates {
            field: self.clone(),
            argument: None,
        }
    }
}

impl fmt::Display for FieldCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.container, self.field)
    }
}

impl FromStr for FieldCoordinates {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((container, field))
                if !container.is_empty() && !field.is_empty() && !field.contains('.') =>
            {
                Ok(Self::new(container, field))
            }
            _ => Err(ConfigError::UnknownField(format!(
                "`{}` (expected `Type.field`)",
                s
            ))),
        }
    }
}

/// `(container type, field, optional argument)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteCoordinates {
    pub field: FieldCoordinates,
    pub argument: Option<String>,
}

impl fmt::Display for SiteCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(argument) => write!(f, "{}({}:)", self.field, argument),
            None => write!(f, "{}", self.field),
        }
    }
}
