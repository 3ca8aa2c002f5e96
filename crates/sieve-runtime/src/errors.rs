//! Constraint failures collected during a validation run
//!
//! Failures are values, never `Err`: every rule at a node runs and the
//! walk keeps going into children, so a run produces a full ordered list.

use serde::{Serialize, Serializer};
use sieve_core::{Path, SiteCoordinates};
use std::fmt;

/// All constraint failures from one run, in walk order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Appends `other` after the errors already collected.
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "No validation errors")
        } else if self.errors.len() == 1 {
            write!(f, "Validation error: {}", self.errors[0])
        } else {
            writeln!(f, "{} validation errors:", self.errors.len())?;
            for (i, error) in self.errors.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, error)?;
            }
            Ok(())
        }
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// A single failed constraint.
///
/// Immutable once built; the `with_*` methods consume and return it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    message: String,
    #[serde(serialize_with = "display")]
    path: Path,
    /// Name of the constraint that produced this error (`Size`, `Pattern`, ...).
    constraint: String,
    #[serde(serialize_with = "display_option")]
    coordinates: Option<SiteCoordinates>,
}

impl ValidationError {
    pub fn new(path: Path, constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path,
            constraint: constraint.into(),
            coordinates: None,
        }
    }

    /// Record the argument (or field) site the failing value belongs to.
    pub fn with_coordinates(mut self, coordinates: SiteCoordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    pub fn coordinates(&self) -> Option<&SiteCoordinates> {
        self.coordinates.as_ref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.path, self.message, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn display_option<T: fmt::Display, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}
