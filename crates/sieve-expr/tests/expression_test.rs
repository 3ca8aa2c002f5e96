//! Evaluation behavior seen through the public API

use proptest::prelude::*;
use sieve_expr::{evaluate, evaluate_boolean, Bindings, CachingEngine, ExpressionEngine, Value};
use std::collections::BTreeMap;

fn bind(name: &str, value: serde_json::Value) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.insert(name.to_string(), Value::from_json(&value));
    bindings
}

#[test]
fn test_argument_helpers() -> Result<(), Box<dyn std::error::Error>> {
    let one_of = "args.containsOneOf('a', 'b')";
    let all_of = "args.containsAllOf('a', 'b')";

    assert!(evaluate_boolean(one_of, &bind("args", serde_json::json!({"a": 1})))?);
    assert!(!evaluate_boolean(one_of, &bind("args", serde_json::json!({"a": 1, "b": 2})))?);
    assert!(!evaluate_boolean(one_of, &bind("args", serde_json::json!({})))?);
    assert!(evaluate_boolean(all_of, &bind("args", serde_json::json!({"a": 1, "b": 2})))?);
    assert!(!evaluate_boolean(all_of, &bind("args", serde_json::json!({"a": 1})))?);
    Ok(())
}

#[test]
fn test_decimal_boundaries_are_exact() -> Result<(), Box<dyn std::error::Error>> {
    let bindings = bind("price", serde_json::json!(19.99));
    assert!(evaluate_boolean("price <= 19.99", &bindings)?);
    assert!(!evaluate_boolean("price > 19.99", &bindings)?);
    assert_eq!(evaluate("price * 3", &bindings)?.to_string(), "59.97");
    Ok(())
}

#[test]
fn test_template_forms_agree() -> Result<(), Box<dyn std::error::Error>> {
    let bindings = bind("name", serde_json::json!("  "));
    let delimited = evaluate("${name.trim().isEmpty() ? 'blank' : 'set'}", &bindings)?;
    let bare = evaluate("name.trim().isEmpty() ? 'blank' : 'set'", &bindings)?;
    assert_eq!(delimited, bare);
    assert_eq!(bare, Value::from("blank"));
    Ok(())
}

#[test]
fn test_syntax_and_evaluation_errors_differ() {
    assert!(evaluate("a ==", &Bindings::new()).unwrap_err().is_syntax());
    assert!(!evaluate("'a' - 1", &Bindings::new()).unwrap_err().is_syntax());
}

proptest! {
    #[test]
    fn prop_contains_one_of_counts_present_keys(
        entries in proptest::collection::btree_map("[a-d]", proptest::option::of(0i64..5), 0..4)
    ) {
        let present = ["a", "b"]
            .iter()
            .filter(|k| matches!(entries.get(**k), Some(Some(_))))
            .count();
        let map: BTreeMap<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.map(Value::from).unwrap_or(Value::Null)))
            .collect();
        let mut bindings = Bindings::new();
        bindings.insert("args".into(), Value::Map(map));

        let engine = CachingEngine::new();
        prop_assert_eq!(
            engine.evaluate_boolean("args.containsOneOf('a', 'b')", &bindings).unwrap(),
            present == 1
        );
        prop_assert_eq!(
            engine.evaluate_boolean("args.containsAllOf('a', 'b')", &bindings).unwrap(),
            present == 2
        );
    }

    #[test]
    fn prop_integer_comparison_matches_native(a in any::<i64>(), b in any::<i64>()) {
        let mut bindings = Bindings::new();
        bindings.insert("a".into(), Value::from(a));
        bindings.insert("b".into(), Value::from(b));
        prop_assert_eq!(evaluate_boolean("a < b", &bindings).unwrap(), a < b);
        prop_assert_eq!(evaluate_boolean("a ge b", &bindings).unwrap(), a >= b);
    }
}
