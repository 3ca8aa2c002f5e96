use dashmap::DashMap;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::ast::Expr;
use crate::error::ExprError;
use crate::eval::Evaluator;
use crate::parser::parse;
use crate::template::normalize;
use crate::value::{Bindings, Value};

/// The narrow seam the validator evaluates expressions through.
///
/// Implementations must accept both bare and `${...}`-delimited text.
pub trait ExpressionEngine: Send + Sync + fmt::Debug {
    /// Parses without evaluating so syntax errors surface at build time.
    fn check(&self, expression: &str) -> Result<(), ExprError>;

    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<Value, ExprError>;

    /// Null counts as false; any other non-boolean result is an error.
    fn evaluate_boolean(&self, expression: &str, bindings: &Bindings) -> Result<bool, ExprError> {
        let value = self.evaluate(expression, bindings)?;
        as_boolean(expression, value)
    }
}

pub(crate) fn as_boolean(expression: &str, value: Value) -> Result<bool, ExprError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(ExprError::Evaluation {
            expression: expression.to_string(),
            message: format!("expected a boolean, found {}", other.type_name()),
        }),
    }
}

/// Default engine: parsed trees are cached by exact expression text, and
/// patterns used by `matches()` by exact pattern text. Both caches only
/// ever grow.
#[derive(Default)]
pub struct CachingEngine {
    parsed: DashMap<String, Arc<Expr>>,
    patterns: DashMap<String, Regex>,
}

impl CachingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn compiled(&self, expression: &str) -> Result<Arc<Expr>, ExprError> {
        if let Some(expr) = self.parsed.get(expression) {
            return Ok(Arc::clone(&expr));
        }
        trace!(expression, "compiling expression");
        let expr = Arc::new(parse(normalize(expression))?);
        Ok(Arc::clone(
            &self
                .parsed
                .entry(expression.to_string())
                .or_insert(expr),
        ))
    }

    /// Number of distinct expression texts parsed so far.
    pub fn cached(&self) -> usize {
        self.parsed.len()
    }
}

impl fmt::Debug for CachingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingEngine")
            .field("parsed", &self.parsed.len())
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

impl ExpressionEngine for CachingEngine {
    fn check(&self, expression: &str) -> Result<(), ExprError> {
        self.compiled(expression).map(|_| ())
    }

    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<Value, ExprError> {
        let expr = self.compiled(expression)?;
        Evaluator::new(bindings)
            .with_patterns(&self.patterns)
            .eval(&expr)
            .map_err(|message| ExprError::Evaluation {
                expression: expression.to_string(),
                message,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_delimited_and_bare_share_semantics() {
        let engine = CachingEngine::new();
        let mut bindings = Bindings::new();
        bindings.insert("n".into(), Value::from(3));
        assert!(engine.evaluate_boolean("${n > 2}", &bindings).unwrap());
        assert!(engine.evaluate_boolean("n > 2", &bindings).unwrap());
        assert_eq!(engine.cached(), 2);
    }

    #[test]
    fn test_boolean_coercion() {
        let engine = CachingEngine::new();
        let bindings = Bindings::new();
        assert!(!engine.evaluate_boolean("missing", &bindings).unwrap());
        let err = engine.evaluate_boolean("1 + 1", &bindings).unwrap_err();
        assert!(!err.is_syntax());
    }

    #[test]
    fn test_check_reports_syntax() {
        let engine = CachingEngine::new();
        assert!(engine.check("a &&").unwrap_err().is_syntax());
        assert!(engine.check("a && b").is_ok());
        assert_eq!(engine.cached(), 1);
    }

    #[test]
    fn test_concurrent_first_use() {
        let engine = Arc::new(CachingEngine::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    let mut bindings = Bindings::new();
                    bindings.insert("s".into(), Value::from(format!("id{}", i)));
                    engine
                        .evaluate_boolean("s.matches('id[0-9]+')", &bindings)
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(engine.cached(), 1);
    }
}
