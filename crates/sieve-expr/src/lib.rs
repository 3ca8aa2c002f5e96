//! Small expression language for constraint checks and message templates
//!
//! Expressions see only the [`Value`] shapes (null, booleans, decimal
//! numbers, strings, lists and string-keyed maps) handed to them through
//! [`Bindings`]. The validator reaches this crate through the
//! [`ExpressionEngine`] trait; [`CachingEngine`] is the default.
//!
//! ```
//! use sieve_expr::{evaluate_boolean, Bindings, Value};
//!
//! let mut bindings = Bindings::new();
//! bindings.insert(
//!     "args".to_string(),
//!     Value::from_json(&serde_json::json!({"email": "a@b.c", "phone": null})),
//! );
//! assert!(evaluate_boolean("${args.containsOneOf('email', 'phone')}", &bindings).unwrap());
//! ```

pub mod ast;
pub mod engine;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod template;
pub mod value;

pub use ast::Expr;
pub use engine::{CachingEngine, ExpressionEngine};
pub use error::ExprError;
pub use template::{normalize, split_template, Segment};
pub use value::{parse_decimal, Bindings, Value};

/// Parses bare or `${...}`-delimited expression text.
pub fn parse(expression: &str) -> Result<Expr, ExprError> {
    parser::parse(normalize(expression))
}

/// One-off evaluation without caching.
pub fn evaluate(expression: &str, bindings: &Bindings) -> Result<Value, ExprError> {
    let expr = parse(expression)?;
    eval::Evaluator::new(bindings)
        .eval(&expr)
        .map_err(|message| ExprError::Evaluation {
            expression: expression.to_string(),
            message,
        })
}

pub fn evaluate_boolean(expression: &str, bindings: &Bindings) -> Result<bool, ExprError> {
    let value = evaluate(expression, bindings)?;
    engine::as_boolean(expression, value)
}
