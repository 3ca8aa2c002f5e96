//! Root-to-node locations inside argument values

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step from a parent value to a child value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Ordered sequence of field names and list indices.
///
/// Displayed the way GraphQL result paths usually are: fields are separated
/// by `/` and indices are bracketed, e.g. `/createUser/input/tags[1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path with `name` appended; `self` is left untouched.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(name.into()));
        Self { segments }
    }

    /// Returns a new path with `index` appended.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => write!(f, "/{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = Path::root().field("createUser").field("tags").index(1);
        assert_eq!(path.to_string(), "/createUser/tags[1]");
        assert_eq!(Path::root().to_string(), "/");
        assert!(Path::root().is_empty());
        assert!(!path.is_empty());
    }

    #[test]
    fn test_derived_paths_leave_parent_untouched() {
        let parent = Path::root().field("input");
        let child = parent.field("address");
        assert_eq!(parent.len(), 1);
        assert_eq!(child.len(), 2);
        assert_eq!(child.last(), Some(&PathSegment::Field("address".into())));
    }

    #[test]
    fn test_path_serializes_as_segment_list() {
        let path = Path::root().field("items").index(0).field("name");
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!(["items", 0, "name"]));
    }
}
