//! Which declarations are legal where, and where constraints exist at all

use sieve_core::{ConfigError, InputType, Schema, TypeShape};
use std::collections::HashMap;

use crate::rule::ConstraintRule;

/// Whether `rule` may be declared on a site of type `ty`.
///
/// Non-null wrappers are ignored. For rules that run on list elements a
/// list type is judged by its innermost element type, so `Size` is legal
/// on `[[String!]]`.
pub fn applicable_type(
    rule: &dyn ConstraintRule,
    ty: &InputType,
    schema: &Schema,
) -> Result<bool, ConfigError> {
    let mut current = ty.unwrap_non_null();
    if rule.applies_to_list_elements() {
        while let InputType::List(element) = current {
            current = element.unwrap_non_null();
        }
    }
    let shape = schema.shape(current)?;
    Ok(rule.applies_to(&shape))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    /// On the search stack with this discovery index.
    Active(usize),
    Done(bool),
}

/// Memoized "is any constraint bound anywhere beneath this type" search
/// over input objects.
///
/// Runs Tarjan's strongly-connected-components walk: types that reach each
/// other through fields or lists share one answer, recorded for the whole
/// component when its root finishes. Every field is inspected once.
pub struct ConstraintPresence<'s, F> {
    schema: &'s Schema,
    has_rules: F,
    memo: HashMap<&'s str, Presence>,
    /// Types of unfinished components with their own local answer.
    stack: Vec<(&'s str, bool)>,
    next_index: usize,
}

impl<'s, F> ConstraintPresence<'s, F>
where
    F: Fn(&str, &str) -> bool,
{
    /// `has_rules(object, field)` reports whether any rule is bound to that
    /// input-object field.
    pub fn new(schema: &'s Schema, has_rules: F) -> Self {
        Self {
            schema,
            has_rules,
            memo: HashMap::new(),
            stack: Vec::new(),
            next_index: 0,
        }
    }

    /// Whether a value of type `ty` can hold any constrained field.
    pub fn exists_under_type(&mut self, ty: &InputType) -> bool {
        match self.schema.shape(ty) {
            Ok(TypeShape::InputObject(_)) | Ok(TypeShape::List(_)) => {
                match self.visit(ty.named_type()) {
                    Some(Presence::Done(found)) => found,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// `None` for names that are not input objects.
    fn visit(&mut self, name: &str) -> Option<Presence> {
        let schema = self.schema;
        let object = schema.input_object(name)?;
        let key = object.name.as_str();
        if let Some(known) = self.memo.get(key) {
            return Some(*known);
        }

        let index = self.next_index;
        self.next_index += 1;
        self.memo.insert(key, Presence::Active(index));
        let slot = self.stack.len();
        self.stack.push((key, false));

        let mut lowlink = index;
        let mut found = false;
        for field in &object.fields {
            found |= (self.has_rules)(key, &field.name);
            match self.visit(field.ty.named_type()) {
                Some(Presence::Done(beneath)) => found |= beneath,
                Some(Presence::Active(low)) => lowlink = lowlink.min(low),
                None => {}
            }
        }
        self.stack[slot].1 = found;

        if lowlink != index {
            return Some(Presence::Active(lowlink));
        }
        let component = self.stack.split_off(slot);
        let found = component.iter().any(|(_, local)| *local);
        for (member, _) in component {
            self.memo.insert(member, Presence::Done(found));
        }
        Some(Presence::Done(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{BoundRule, PatternRule, SizeRule};
    use sieve_core::{InputObjectType, InputValueDefinition};
    use std::cell::Cell;

    fn ty(text: &str) -> InputType {
        text.parse().unwrap()
    }

    #[test]
    fn test_non_null_and_list_unwrapping() {
        let schema = Schema::default();
        assert!(applicable_type(&SizeRule::text(), &ty("String!"), &schema).unwrap());
        assert!(applicable_type(&PatternRule, &ty("[[String!]!]"), &schema).unwrap());
        assert!(!applicable_type(&SizeRule::text(), &ty("Int"), &schema).unwrap());
        assert!(!applicable_type(&BoundRule::min(), &ty("[Int]"), &schema).unwrap());
        assert!(applicable_type(&SizeRule::container(), &ty("[Int]!"), &schema).unwrap());
    }

    fn cyclic_schema() -> Schema {
        Schema::builder()
            .input_object(
                InputObjectType::new("Node")
                    .with_field(InputValueDefinition::new("next", ty("Node")))
                    .with_field(InputValueDefinition::new("children", ty("[Node!]")))
                    .with_field(InputValueDefinition::new("leaf", ty("Leaf"))),
            )
            .input_object(
                InputObjectType::new("Leaf")
                    .with_field(InputValueDefinition::new("owner", ty("Node")))
                    .with_field(InputValueDefinition::new("label", ty("String"))),
            )
            .input_object(
                InputObjectType::new("Plain")
                    .with_field(InputValueDefinition::new("again", ty("[Plain]"))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_self_reference_terminates() {
        let schema = cyclic_schema();
        let mut presence = ConstraintPresence::new(&schema, |_, _| false);
        assert!(!presence.exists_under_type(&ty("Node!")));
        assert!(!presence.exists_under_type(&ty("[Plain]")));
        assert!(!presence.exists_under_type(&ty("String")));
    }

    #[test]
    fn test_constraint_found_through_cycle() {
        let schema = cyclic_schema();
        let mut presence =
            ConstraintPresence::new(&schema, |object, field| object == "Leaf" && field == "label");
        assert!(presence.exists_under_type(&ty("[Node]")));
        assert!(presence.exists_under_type(&ty("Leaf")));
        assert!(!presence.exists_under_type(&ty("Plain")));
    }

    #[test]
    fn test_cut_answers_are_not_memoized_early() {
        // Leaf is reached from Node before Node's own constrained field is seen.
        let schema = Schema::builder()
            .input_object(
                InputObjectType::new("Node")
                    .with_field(InputValueDefinition::new("a_leaf", ty("Leaf")))
                    .with_field(InputValueDefinition::new("name", ty("String"))),
            )
            .input_object(
                InputObjectType::new("Leaf")
                    .with_field(InputValueDefinition::new("parent", ty("Node"))),
            )
            .build()
            .unwrap();
        let mut presence =
            ConstraintPresence::new(&schema, |object, field| object == "Node" && field == "name");
        assert!(presence.exists_under_type(&ty("Node")));
        assert!(presence.exists_under_type(&ty("Leaf")));
    }

    /// `k` types where each has two fields of the next type and the last
    /// one points back at N0.
    fn braided_chain(k: usize) -> Schema {
        let builder = (0..k).fold(Schema::builder(), |builder, i| {
            let next = ty(&format!("N{}", (i + 1) % k));
            builder.input_object(
                InputObjectType::new(format!("N{}", i))
                    .with_field(InputValueDefinition::new("a", next.clone()))
                    .with_field(InputValueDefinition::new("b", next)),
            )
        });
        builder.build().unwrap()
    }

    #[test]
    fn test_each_field_is_inspected_once() {
        let k = 20;
        let fields = 2 * k;
        let schema = braided_chain(k);

        let calls = Cell::new(0usize);
        let mut presence = ConstraintPresence::new(&schema, |_, _| {
            calls.set(calls.get() + 1);
            false
        });
        assert!(!presence.exists_under_type(&ty("N0")));
        for i in 0..k {
            assert!(!presence.exists_under_type(&ty(&format!("N{}", i))));
        }
        assert!(calls.get() <= 2 * fields, "{} calls for {} fields", calls.get(), fields);

        let calls = Cell::new(0usize);
        let mut presence = ConstraintPresence::new(&schema, |object, field| {
            calls.set(calls.get() + 1);
            object == "N19" && field == "b"
        });
        for i in 0..k {
            assert!(presence.exists_under_type(&ty(&format!("[N{}!]", i))));
        }
        assert!(calls.get() <= 2 * fields, "{} calls for {} fields", calls.get(), fields);
    }
}
