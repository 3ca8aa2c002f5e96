//! Read-only view of the schema the validator consumes
//!
//! Type references are GraphQL-style (`[String!]!`) and resolve by name
//! through the [`Schema`], which is what makes self-referential input
//! objects representable without owning cycles.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::coordinates::FieldCoordinates;
use crate::declaration::ConstraintDeclaration;
use crate::error::ConfigError;

/// Names of the scalars every schema carries.
pub const BUILTIN_SCALARS: [(&str, ScalarCategory); 5] = [
    ("String", ScalarCategory::Text),
    ("ID", ScalarCategory::Text),
    ("Int", ScalarCategory::Integer),
    ("Float", ScalarCategory::Decimal),
    ("Boolean", ScalarCategory::Boolean),
];

/// A reference to an input type, possibly wrapped in lists and non-null markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InputType {
    Named(String),
    List(Box<InputType>),
    NonNull(Box<InputType>),
}

impl InputType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(element: InputType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn non_null(inner: InputType) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Strips every outer non-null wrapper.
    pub fn unwrap_non_null(&self) -> &InputType {
        let mut current = self;
        while let InputType::NonNull(inner) = current {
            current = inner;
        }
        current
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, InputType::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.unwrap_non_null(), InputType::List(_))
    }

    /// Element type when this (after unwrapping non-null) is a list.
    pub fn list_element(&self) -> Option<&InputType> {
        match self.unwrap_non_null() {
            InputType::List(element) => Some(element),
            _ => None,
        }
    }

    /// The innermost named type, beneath all list and non-null wrappers.
    pub fn named_type(&self) -> &str {
        match self {
            InputType::Named(name) => name,
            InputType::List(inner) | InputType::NonNull(inner) => inner.named_type(),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Named(name) => write!(f, "{}", name),
            InputType::List(element) => write!(f, "[{}]", element),
            InputType::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

impl FromStr for InputType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some(inner) = text.strip_suffix('!') {
            let parsed: InputType = inner.parse()?;
            if parsed.is_non_null() {
                return Err(ConfigError::InvalidTypeReference(s.to_string()));
            }
            return Ok(InputType::non_null(parsed));
        }
        if let Some(rest) = text.strip_prefix('[') {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| ConfigError::InvalidTypeReference(s.to_string()))?;
            return Ok(InputType::list(inner.parse()?));
        }
        if is_valid_name(text) {
            Ok(InputType::named(text))
        } else {
            Err(ConfigError::InvalidTypeReference(s.to_string()))
        }
    }
}

impl TryFrom<String> for InputType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InputType> for String {
    fn from(ty: InputType) -> Self {
        ty.to_string()
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// How constraint rules see a scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarCategory {
    Text,
    Integer,
    Decimal,
    Boolean,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarType {
    pub name: String,
    #[serde(default)]
    pub category: ScalarCategory,
}

impl ScalarType {
    pub fn new(name: impl Into<String>, category: ScalarCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// An argument of an output field or a field of an input object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputValueDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintDeclaration>,
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>, ty: InputType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_constraint(mut self, declaration: ConstraintDeclaration) -> Self {
        self.constraints.push(declaration);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputObjectType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<InputValueDefinition>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: InputValueDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&InputValueDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<InputValueDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintDeclaration>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_constraint(mut self, declaration: ConstraintDeclaration) -> Self {
        self.constraints.push(declaration);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

/// Output object type; only its fields' arguments are ever validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named input-capable type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    Scalar(ScalarType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Scalar(s) => &s.name,
            TypeDefinition::Enum(e) => &e.name,
            TypeDefinition::InputObject(o) => &o.name,
        }
    }
}

/// What a type reference looks like once non-null wrappers are gone and the
/// name has been resolved.
#[derive(Debug, Clone, Copy)]
pub enum TypeShape<'a> {
    List(&'a InputType),
    Scalar(&'a ScalarType),
    Enum(&'a EnumType),
    InputObject(&'a InputObjectType),
}

impl TypeShape<'_> {
    pub fn is_text(&self) -> bool {
        matches!(self, TypeShape::Scalar(s) if s.category == ScalarCategory::Text)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeShape::Scalar(s)
                if matches!(s.category, ScalarCategory::Integer | ScalarCategory::Decimal)
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, TypeShape::Scalar(s) if s.category == ScalarCategory::Boolean)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TypeShape::List(_))
    }

    pub fn is_input_object(&self) -> bool {
        matches!(self, TypeShape::InputObject(_))
    }

    /// Lists and input objects: things with a countable number of entries.
    pub fn is_container(&self) -> bool {
        self.is_list() || self.is_input_object()
    }
}

impl fmt::Display for TypeShape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::List(element) => write!(f, "[{}]", element),
            TypeShape::Scalar(s) => write!(f, "{}", s.name),
            TypeShape::Enum(e) => write!(f, "{}", e.name),
            TypeShape::InputObject(o) => write!(f, "{}", o.name),
        }
    }
}

/// Serialized form of a schema, as read from JSON or YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scalars: Vec<ScalarType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputObjectType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectType>,
}

/// Immutable type registry. Built-in scalars are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument", into = "SchemaDocument")]
pub struct Schema {
    types: BTreeMap<String, TypeDefinition>,
    objects: BTreeMap<String, ObjectType>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn from_document(document: SchemaDocument) -> Result<Self, ConfigError> {
        let mut types = builtin_types();

        let definitions = document
            .scalars
            .into_iter()
            .map(TypeDefinition::Scalar)
            .chain(document.enums.into_iter().map(TypeDefinition::Enum))
            .chain(document.inputs.into_iter().map(TypeDefinition::InputObject));
        for definition in definitions {
            let name = definition.name().to_string();
            if types.insert(name.clone(), definition).is_some() {
                return Err(ConfigError::DuplicateType(name));
            }
        }

        let mut objects = BTreeMap::new();
        for object in document.objects {
            let name = object.name.clone();
            if types.contains_key(&name) || objects.insert(name.clone(), object).is_some() {
                return Err(ConfigError::DuplicateType(name));
            }
        }

        let schema = Self { types, objects };
        schema.check_references()?;
        Ok(schema)
    }

    fn check_references(&self) -> Result<(), ConfigError> {
        for object in self.input_objects() {
            for field in &object.fields {
                self.check_reference(&field.ty, || format!("{}.{}", object.name, field.name))?;
            }
        }
        for object in self.objects.values() {
            for field in &object.fields {
                for argument in &field.arguments {
                    self.check_reference(&argument.ty, || {
                        FieldCoordinates::new(&object.name, &field.name)
                            .argument(&argument.name)
                            .to_string()
                    })?;
                }
            }
        }
        Ok(())
    }

    fn check_reference(
        &self,
        ty: &InputType,
        site: impl FnOnce() -> String,
    ) -> Result<(), ConfigError> {
        let name = ty.named_type();
        if self.types.contains_key(name) {
            Ok(())
        } else {
            Err(ConfigError::UnknownType {
                name: name.to_string(),
                site: site(),
            })
        }
    }

    pub fn definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn input_object(&self, name: &str) -> Option<&InputObjectType> {
        match self.types.get(name) {
            Some(TypeDefinition::InputObject(object)) => Some(object),
            _ => None,
        }
    }

    /// Input objects in name order.
    pub fn input_objects(&self) -> impl Iterator<Item = &InputObjectType> {
        self.types.values().filter_map(|d| match d {
            TypeDefinition::InputObject(object) => Some(object),
            _ => None,
        })
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.objects.get(name)
    }

    /// Output object types in name order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectType> {
        self.objects.values()
    }

    pub fn field(&self, coordinates: &FieldCoordinates) -> Option<&FieldDefinition> {
        self.objects
            .get(&coordinates.container)
            .and_then(|object| object.field(&coordinates.field))
    }

    /// Resolves a type reference to its shape after unwrapping non-null.
    pub fn shape<'a>(&'a self, ty: &'a InputType) -> Result<TypeShape<'a>, ConfigError> {
        let mut current = ty;
        loop {
            match current {
                InputType::NonNull(inner) => current = inner,
                InputType::List(element) => return Ok(TypeShape::List(element)),
                InputType::Named(name) => {
                    return match self.types.get(name) {
                        Some(TypeDefinition::Scalar(s)) => Ok(TypeShape::Scalar(s)),
                        Some(TypeDefinition::Enum(e)) => Ok(TypeShape::Enum(e)),
                        Some(TypeDefinition::InputObject(o)) => Ok(TypeShape::InputObject(o)),
                        None => Err(ConfigError::UnknownType {
                            name: name.clone(),
                            site: ty.to_string(),
                        }),
                    }
                }
            }
        }
    }

    pub fn to_document(&self) -> SchemaDocument {
        let mut document = SchemaDocument::default();
        for definition in self.types.values() {
            match definition {
                TypeDefinition::Scalar(s) => {
                    if !BUILTIN_SCALARS.iter().any(|(name, _)| *name == s.name) {
                        document.scalars.push(s.clone());
                    }
                }
                TypeDefinition::Enum(e) => document.enums.push(e.clone()),
                TypeDefinition::InputObject(o) => document.inputs.push(o.clone()),
            }
        }
        document.objects = self.objects.values().cloned().collect();
        document
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            types: builtin_types(),
            objects: BTreeMap::new(),
        }
    }
}

fn builtin_types() -> BTreeMap<String, TypeDefinition> {
    BUILTIN_SCALARS
        .iter()
        .map(|(name, category)| {
            (
                name.to_string(),
                TypeDefinition::Scalar(ScalarType::new(*name, *category)),
            )
        })
        .collect()
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = ConfigError;

    fn try_from(document: SchemaDocument) -> Result<Self, Self::Error> {
        Schema::from_document(document)
    }
}

impl From<Schema> for SchemaDocument {
    fn from(schema: Schema) -> Self {
        schema.to_document()
    }
}

/// Collects definitions and validates them together on [`SchemaBuilder::build`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    document: SchemaDocument,
}

impl SchemaBuilder {
    pub fn scalar(mut self, scalar: ScalarType) -> Self {
        self.document.scalars.push(scalar);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumType) -> Self {
        self.document.enums.push(enumeration);
        self
    }

    pub fn input_object(mut self, object: InputObjectType) -> Self {
        self.document.inputs.push(object);
        self
    }

    pub fn object(mut self, object: ObjectType) -> Self {
        self.document.objects.push(object);
        self
    }

    pub fn build(self) -> Result<Schema, ConfigError> {
        Schema::from_document(self.document)
    }
}
