use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A named constraint with its arguments, attached to an argument, an input
/// field or an output field. Defaults are filled in when the declaration is
/// bound to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, Value>,
}

impl ConstraintDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_from_yaml() {
        let decl: ConstraintDeclaration = serde_yaml::from_str(
            "name: Size\narguments:\n  min: 1\n  max: 5\n",
        )
        .unwrap();
        assert_eq!(decl.name, "Size");
        assert_eq!(decl.argument("min"), Some(&Value::from(1)));
        assert_eq!(decl.argument("regexp"), None);
    }

    #[test]
    fn test_argumentless_declaration() {
        let decl: ConstraintDeclaration = serde_yaml::from_str("name: NotBlank\n").unwrap();
        assert!(decl.arguments.is_empty());
        assert_eq!(decl, ConstraintDeclaration::new("NotBlank"));
    }
}
