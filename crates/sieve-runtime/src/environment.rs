//! Per-value validation context
//!
//! A [`ValidationEnvironment`] is an immutable snapshot of where the walk
//! is: the value, its declared type, its path and the request it belongs
//! to. Children are made with [`ValidationEnvironment::derive`], which
//! copies the parent and overrides a few parts; the parent never changes,
//! so sibling environments are independent.

use serde_json::{Map as JsonMap, Value as JsonValue};
use sieve_core::{
    ConfigError, FieldCoordinates, InputType, Path, Schema, SiteCoordinates, TypeShape,
};
use sieve_expr::{Bindings, Value};

use crate::catalog::Locale;
use crate::rule::RuleServices;

static NULL: JsonValue = JsonValue::Null;

#[derive(Debug, Clone)]
pub struct ValidationEnvironment<'a> {
    schema: &'a Schema,
    services: &'a RuleServices,
    coordinates: &'a FieldCoordinates,
    argument: Option<&'a str>,
    arguments: &'a JsonMap<String, JsonValue>,
    value: &'a JsonValue,
    input_type: Option<&'a InputType>,
    path: Path,
    locale: &'a Locale,
}

impl<'a> ValidationEnvironment<'a> {
    /// Starts an environment for one field of one request. The value
    /// defaults to null and the path to the root.
    pub fn builder(
        schema: &'a Schema,
        services: &'a RuleServices,
        coordinates: &'a FieldCoordinates,
        arguments: &'a JsonMap<String, JsonValue>,
        locale: &'a Locale,
    ) -> EnvironmentBuilder<'a> {
        EnvironmentBuilder {
            env: ValidationEnvironment {
                schema,
                services,
                coordinates,
                argument: None,
                arguments,
                value: &NULL,
                input_type: None,
                path: Path::root(),
                locale,
            },
        }
    }

    /// A builder pre-filled with everything in `self`.
    pub fn derive(&self) -> EnvironmentBuilder<'a> {
        EnvironmentBuilder { env: self.clone() }
    }

    /// Environment for element `index` of the list held here.
    pub fn for_list_element(
        &self,
        index: usize,
        value: &'a JsonValue,
        element_type: &'a InputType,
    ) -> Self {
        self.derive()
            .value(value)
            .input_type(element_type)
            .path(self.path.index(index))
            .build()
    }

    /// Environment for field `name` of the input object held here.
    pub fn for_field(&self, name: &str, value: &'a JsonValue, ty: &'a InputType) -> Self {
        self.derive()
            .value(value)
            .input_type(ty)
            .path(self.path.field(name))
            .build()
    }

    /// Schema the request is validated against.
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn services(&self) -> &'a RuleServices {
        self.services
    }

    pub fn coordinates(&self) -> &'a FieldCoordinates {
        self.coordinates
    }

    /// Top-level argument the current value sits under, if any.
    pub fn argument(&self) -> Option<&'a str> {
        self.argument
    }

    /// Every argument value of the field being validated.
    pub fn arguments(&self) -> &'a JsonMap<String, JsonValue> {
        self.arguments
    }

    /// Value under check; the argument map for field-level checks.
    pub fn value(&self) -> &'a JsonValue {
        self.value
    }

    /// Declared type of the value; `None` for field-level checks.
    pub fn input_type(&self) -> Option<&'a InputType> {
        self.input_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Locale error messages are rendered in.
    pub fn locale(&self) -> &'a Locale {
        self.locale
    }

    pub fn site(&self) -> SiteCoordinates {
        match self.argument {
            Some(argument) => self.coordinates.argument(argument),
            None => self.coordinates.site(),
        }
    }

    pub fn shape(&self) -> Result<Option<TypeShape<'a>>, ConfigError> {
        self.input_type.map(|ty| self.schema.shape(ty)).transpose()
    }

    /// Variables visible to `Expression` constraints.
    pub fn expression_bindings(&self) -> Bindings {
        let arguments = Value::Map(
            self.arguments
                .iter()
                .map(|(k, v)| (k.clone(), Value::from_json(v)))
                .collect(),
        );
        let mut bindings = Bindings::new();
        bindings.insert("validatedValue".into(), Value::from_json(self.value));
        bindings.insert("args".into(), arguments.clone());
        bindings.insert("arguments".into(), arguments);
        bindings.insert("gqlField".into(), Value::from(self.coordinates.field.as_str()));
        bindings.insert(
            "gqlFieldContainer".into(),
            Value::from(self.coordinates.container.as_str()),
        );
        bindings.insert(
            "gqlArgument".into(),
            self.argument.map(Value::from).unwrap_or(Value::Null),
        );
        bindings.insert("path".into(), Value::from(self.path.to_string()));
        bindings.insert("locale".into(), Value::from(self.locale.as_str()));
        bindings
    }
}

/// Copy-and-override construction of a [`ValidationEnvironment`].
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder<'a> {
    env: ValidationEnvironment<'a>,
}

impl<'a> EnvironmentBuilder<'a> {
    pub fn argument(mut self, argument: &'a str) -> Self {
        self.env.argument = Some(argument);
        self
    }

    pub fn value(mut self, value: &'a JsonValue) -> Self {
        self.env.value = value;
        self
    }

    pub fn input_type(mut self, ty: &'a InputType) -> Self {
        self.env.input_type = Some(ty);
        self
    }

    pub fn path(mut self, path: Path) -> Self {
        self.env.path = path;
        self
    }

    pub fn locale(mut self, locale: &'a Locale) -> Self {
        self.env.locale = locale;
        self
    }

    pub fn build(self) -> ValidationEnvironment<'a> {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derive_leaves_parent_untouched() {
        let schema = Schema::default();
        let services = RuleServices::default();
        let coordinates = FieldCoordinates::new("Mutation", "tag");
        let locale = Locale::default();
        let arguments = json!({"tags": ["a", "b"]});
        let Some(map) = arguments.as_object() else {
            panic!("object literal");
        };
        let tags = &map["tags"];
        let list_type: InputType = "[String!]".parse().unwrap();
        let element_type: InputType = "String!".parse().unwrap();

        let parent = ValidationEnvironment::builder(&schema, &services, &coordinates, map, &locale)
            .argument("tags")
            .value(tags)
            .input_type(&list_type)
            .path(Path::root().field("tag").field("tags"))
            .build();
        let child = parent.for_list_element(1, &tags[1], &element_type);

        assert_eq!(parent.path().to_string(), "/tag/tags");
        assert_eq!(parent.value(), tags);
        assert_eq!(child.path().to_string(), "/tag/tags[1]");
        assert_eq!(child.value(), &json!("b"));
        assert_eq!(child.site(), coordinates.argument("tags"));
        assert!(child.shape().unwrap().is_some_and(|s| s.is_text()));
    }

    #[test]
    fn test_expression_bindings() {
        let schema = Schema::default();
        let services = RuleServices::default();
        let coordinates = FieldCoordinates::new("Query", "search");
        let locale: Locale = "de-CH".into();
        let arguments = json!({"email": "a@b.c"});
        let Some(map) = arguments.as_object() else {
            panic!("object literal");
        };

        let env = ValidationEnvironment::builder(&schema, &services, &coordinates, map, &locale)
            .value(&arguments)
            .path(Path::root().field("search"))
            .build();
        let bindings = env.expression_bindings();

        assert_eq!(bindings["gqlField"], Value::from("search"));
        assert_eq!(bindings["gqlFieldContainer"], Value::from("Query"));
        assert_eq!(bindings["gqlArgument"], Value::Null);
        assert_eq!(bindings["path"], Value::from("/search"));
        assert_eq!(bindings["args"], bindings["arguments"]);
        assert!(env.shape().unwrap().is_none());
    }
}
