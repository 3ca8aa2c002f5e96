//! Precomputed bindings from schema sites to rules
//!
//! Built once per schema (or per field) and read-only afterwards. Every
//! declaration is checked while building: unknown constraint names,
//! declarations on incompatible types and bad arguments all fail here
//! rather than during a request.

use sieve_core::{
    ConfigError, ConstraintDeclaration, FieldCoordinates, FieldDefinition, InputObjectType,
    InputType, Schema, SiteCoordinates,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

use crate::matcher::{applicable_type, ConstraintPresence};
use crate::registry::ConstraintRegistry;
use crate::rule::{ConstraintRule, RuleArguments, RuleServices};

/// A declaration resolved against its rule.
#[derive(Debug, Clone)]
pub struct BoundConstraint {
    rule: Arc<dyn ConstraintRule>,
    arguments: RuleArguments,
    site: SiteCoordinates,
}

impl BoundConstraint {
    /// The registered rule this declaration resolved to.
    pub fn rule(&self) -> &dyn ConstraintRule {
        self.rule.as_ref()
    }

    /// Registered name of the rule, e.g. `Size`.
    pub fn name(&self) -> &str {
        self.rule.name()
    }

    /// Declaration arguments with defaults filled in.
    pub fn arguments(&self) -> &RuleArguments {
        &self.arguments
    }

    /// Where the declaration was written.
    pub fn site(&self) -> &SiteCoordinates {
        &self.site
    }

    /// Whether this runs per element when bound to a list.
    pub fn pushes_down(&self) -> bool {
        self.rule.applies_to_list_elements()
    }

    /// The declaration's `message` override, else the rule's own key.
    pub fn message_key(&self) -> String {
        self.arguments
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| self.rule.message_key())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleContainer {
    sites: BTreeMap<SiteCoordinates, Vec<BoundConstraint>>,
    /// Input object name to "some field at or below it has rules".
    presence: BTreeMap<String, bool>,
}

struct Binder<'a> {
    schema: &'a Schema,
    registry: &'a ConstraintRegistry,
    services: &'a RuleServices,
    sites: BTreeMap<SiteCoordinates, Vec<BoundConstraint>>,
}

impl<'a> Binder<'a> {
    fn rule(&self, declaration: &ConstraintDeclaration, site: &SiteCoordinates) -> Result<&'a Arc<dyn ConstraintRule>, ConfigError> {
        self.registry
            .get(&declaration.name)
            .ok_or_else(|| ConfigError::UnknownConstraint {
                name: declaration.name.clone(),
                site: site.to_string(),
            })
    }

    fn resolve(
        &self,
        rule: &Arc<dyn ConstraintRule>,
        declaration: &ConstraintDeclaration,
        site: &SiteCoordinates,
    ) -> Result<BoundConstraint, ConfigError> {
        let arguments = RuleArguments::resolve(
            declaration,
            &rule.parameters(),
            rule.accepts_extra_arguments(),
            site.to_string(),
        )?;
        rule.prepare(&arguments, self.services)?;
        Ok(BoundConstraint {
            rule: Arc::clone(rule),
            arguments,
            site: site.clone(),
        })
    }

    /// Argument or input-field site holding a value of type `ty`.
    fn bind_value(
        &mut self,
        site: SiteCoordinates,
        ty: &InputType,
        declarations: &[ConstraintDeclaration],
    ) -> Result<(), ConfigError> {
        let mut bound = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let rule = self.rule(declaration, &site)?;
            if !applicable_type(rule.as_ref(), ty, self.schema)? {
                return Err(ConfigError::IncompatibleType {
                    constraint: declaration.name.clone(),
                    ty: ty.to_string(),
                    site: site.to_string(),
                });
            }
            bound.push(self.resolve(rule, declaration, &site)?);
        }
        self.insert(site, bound);
        Ok(())
    }

    /// Output-field site; the value checked is the whole argument map.
    fn bind_field(&mut self, object: &str, field: &FieldDefinition) -> Result<(), ConfigError> {
        let coordinates = FieldCoordinates::new(object, &field.name);
        let site = coordinates.site();
        let mut bound = Vec::with_capacity(field.constraints.len());
        for declaration in &field.constraints {
            let rule = self.rule(declaration, &site)?;
            if !rule.applies_to_field() {
                return Err(ConfigError::IncompatibleType {
                    constraint: declaration.name.clone(),
                    ty: "field".to_string(),
                    site: site.to_string(),
                });
            }
            bound.push(self.resolve(rule, declaration, &site)?);
        }
        self.insert(site, bound);

        for argument in &field.arguments {
            self.bind_value(
                coordinates.argument(&argument.name),
                &argument.ty,
                &argument.constraints,
            )?;
        }
        Ok(())
    }

    fn bind_input_object(&mut self, object: &InputObjectType) -> Result<(), ConfigError> {
        for field in &object.fields {
            self.bind_value(
                FieldCoordinates::new(&object.name, &field.name).site(),
                &field.ty,
                &field.constraints,
            )?;
        }
        Ok(())
    }

    fn insert(&mut self, site: SiteCoordinates, bound: Vec<BoundConstraint>) {
        if !bound.is_empty() {
            self.sites.entry(site).or_default().extend(bound);
        }
    }

    fn finish<'n>(self, objects: impl IntoIterator<Item = &'n str>) -> RuleContainer {
        let sites = self.sites;
        let mut search = ConstraintPresence::new(self.schema, |object, field| {
            sites.contains_key(&FieldCoordinates::new(object, field).site())
        });
        let presence = objects
            .into_iter()
            .map(|name| {
                let found = search.exists_under_type(&InputType::named(name));
                (name.to_string(), found)
            })
            .collect();
        drop(search);

        let container = RuleContainer { sites, presence };
        debug!(
            sites = container.sites.len(),
            rules = container.rule_count(),
            "built rule container"
        );
        container
    }
}

impl RuleContainer {
    /// Binds every declaration in the schema.
    pub fn build(
        schema: &Schema,
        registry: &ConstraintRegistry,
        services: &RuleServices,
    ) -> Result<Self, ConfigError> {
        let mut binder = Binder {
            schema,
            registry,
            services,
            sites: BTreeMap::new(),
        };
        for object in schema.input_objects() {
            binder.bind_input_object(object)?;
        }
        for object in schema.objects() {
            for field in &object.fields {
                binder.bind_field(&object.name, field)?;
            }
        }
        Ok(binder.finish(schema.input_objects().map(|o| o.name.as_str())))
    }

    /// Binds one output field: its own declarations, its arguments and
    /// every input object reachable from them.
    pub fn build_for_field(
        schema: &Schema,
        registry: &ConstraintRegistry,
        services: &RuleServices,
        coordinates: &FieldCoordinates,
    ) -> Result<Self, ConfigError> {
        let field = schema
            .field(coordinates)
            .ok_or_else(|| ConfigError::UnknownField(coordinates.to_string()))?;
        let mut binder = Binder {
            schema,
            registry,
            services,
            sites: BTreeMap::new(),
        };
        binder.bind_field(&coordinates.container, field)?;

        let reachable = reachable_input_objects(schema, field.arguments.iter().map(|a| &a.ty));
        for name in &reachable {
            if let Some(object) = schema.input_object(name) {
                binder.bind_input_object(object)?;
            }
        }
        Ok(binder.finish(reachable.iter().map(String::as_str)))
    }

    /// Rules bound at `site`, in declaration order.
    pub fn rules_for(&self, site: &SiteCoordinates) -> &[BoundConstraint] {
        self.sites.get(site).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rules_for_input_field(&self, object: &str, field: &str) -> &[BoundConstraint] {
        self.rules_for(&FieldCoordinates::new(object, field).site())
    }

    /// Whether a value of type `ty` holds any constrained input-object field.
    pub fn has_constraints_beneath(&self, ty: &InputType) -> bool {
        self.presence
            .get(ty.named_type())
            .copied()
            .unwrap_or(false)
    }

    /// Bound sites in coordinate order.
    pub fn sites(&self) -> impl Iterator<Item = (&SiteCoordinates, &[BoundConstraint])> {
        self.sites.iter().map(|(site, rules)| (site, rules.as_slice()))
    }

    pub fn rule_count(&self) -> usize {
        self.sites.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

fn reachable_input_objects<'t>(
    schema: &Schema,
    roots: impl IntoIterator<Item = &'t InputType>,
) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<String> = roots
        .into_iter()
        .map(|ty| ty.named_type().to_string())
        .collect();
    while let Some(name) = queue.pop_front() {
        let Some(object) = schema.input_object(&name) else {
            continue;
        };
        if !seen.insert(name) {
            continue;
        }
        queue.extend(object.fields.iter().map(|f| f.ty.named_type().to_string()));
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sieve_core::{InputValueDefinition, ObjectType};

    fn ty(text: &str) -> InputType {
        text.parse().unwrap()
    }

    fn schema_with(argument: InputValueDefinition) -> Schema {
        Schema::builder()
            .input_object(
                InputObjectType::new("AddressInput").with_field(
                    InputValueDefinition::new("street", ty("String"))
                        .with_constraint(ConstraintDeclaration::new("NotBlank")),
                ),
            )
            .input_object(
                InputObjectType::new("UserInput")
                    .with_field(InputValueDefinition::new("address", ty("AddressInput")))
                    .with_field(InputValueDefinition::new("nickname", ty("String"))),
            )
            .input_object(
                InputObjectType::new("Unrelated").with_field(
                    InputValueDefinition::new("code", ty("String")).with_constraint(
                        ConstraintDeclaration::new("Pattern").with_argument("regexp", "[A-Z]+"),
                    ),
                ),
            )
            .object(ObjectType::new("Mutation").with_field(
                FieldDefinition::new("createUser").with_argument(argument),
            ))
            .build()
            .unwrap()
    }

    fn build(schema: &Schema) -> Result<RuleContainer, ConfigError> {
        RuleContainer::build(schema, &ConstraintRegistry::with_builtins(), &RuleServices::default())
    }

    #[test]
    fn test_binds_arguments_and_input_fields() {
        let schema = schema_with(
            InputValueDefinition::new("tags", ty("[String!]")).with_constraint(
                ConstraintDeclaration::new("Size")
                    .with_argument("min", 1)
                    .with_argument("max", 5),
            ),
        );
        let container = build(&schema).unwrap();

        let site = FieldCoordinates::new("Mutation", "createUser").argument("tags");
        let rules = container.rules_for(&site);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].pushes_down());
        assert_eq!(rules[0].arguments().int("max").unwrap(), 5);
        assert_eq!(rules[0].message_key(), "sieve.validation.Size.message");
        assert_eq!(
            container.rules_for_input_field("AddressInput", "street")[0].name(),
            "NotBlank"
        );
        assert!(container.has_constraints_beneath(&ty("UserInput!")));
        assert!(container.has_constraints_beneath(&ty("[AddressInput]")));
        assert!(!container.has_constraints_beneath(&ty("String")));
        assert_eq!(container.rule_count(), 3);
    }

    #[test]
    fn test_build_for_field_only_binds_reachable_types() {
        let schema = schema_with(InputValueDefinition::new("input", ty("UserInput!")));
        let container = RuleContainer::build_for_field(
            &schema,
            &ConstraintRegistry::with_builtins(),
            &RuleServices::default(),
            &FieldCoordinates::new("Mutation", "createUser"),
        )
        .unwrap();
        let sites: Vec<String> = container.sites().map(|(site, _)| site.to_string()).collect();
        assert_eq!(sites, vec!["AddressInput.street"]);
        assert!(container.has_constraints_beneath(&ty("UserInput")));
    }

    #[test]
    fn test_configuration_errors() {
        let incompatible = schema_with(
            InputValueDefinition::new("age", ty("Int"))
                .with_constraint(ConstraintDeclaration::new("NotBlank")),
        );
        assert_eq!(
            build(&incompatible).unwrap_err(),
            ConfigError::IncompatibleType {
                constraint: "NotBlank".into(),
                ty: "Int".into(),
                site: "Mutation.createUser(age:)".into()
            }
        );

        let unknown = schema_with(
            InputValueDefinition::new("age", ty("Int"))
                .with_constraint(ConstraintDeclaration::new("Frobnicate")),
        );
        assert!(matches!(
            build(&unknown),
            Err(ConfigError::UnknownConstraint { name, .. }) if name == "Frobnicate"
        ));

        let missing = schema_with(
            InputValueDefinition::new("code", ty("String"))
                .with_constraint(ConstraintDeclaration::new("Pattern")),
        );
        assert!(matches!(
            build(&missing),
            Err(ConfigError::MissingArgument { argument, .. }) if argument == "regexp"
        ));

        let malformed = schema_with(InputValueDefinition::new("code", ty("String")).with_constraint(
            ConstraintDeclaration::new("Expression").with_argument("value", "validatedValue =="),
        ));
        assert!(matches!(
            build(&malformed),
            Err(ConfigError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_field_level_declarations() {
        let schema = Schema::builder()
            .object(ObjectType::new("Query").with_field(
                FieldDefinition::new("contact")
                    .with_argument(InputValueDefinition::new("email", ty("String")))
                    .with_constraint(ConstraintDeclaration::new("NotBlank")),
            ))
            .build()
            .unwrap();
        assert!(matches!(
            build(&schema),
            Err(ConfigError::IncompatibleType { ty, .. }) if ty == "field"
        ));
    }
}
