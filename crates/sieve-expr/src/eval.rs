//! Tree-walking evaluator
//!
//! Unknown variables evaluate to null, as do missing map keys, out-of-range
//! list indices and any property read on null. Everything else that does
//! not fit the operand shapes is an evaluation error.

use dashmap::DashMap;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::value::{Bindings, Value};

type EvalResult = Result<Value, String>;

pub struct Evaluator<'a> {
    bindings: &'a Bindings,
    patterns: Option<&'a DashMap<String, Regex>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Self {
            bindings,
            patterns: None,
        }
    }

    /// Reuse compiled `matches()` patterns across evaluations.
    pub fn with_patterns(mut self, patterns: &'a DashMap<String, Regex>) -> Self {
        self.patterns = Some(patterns);
        self
    }

    pub fn eval(&self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Variable(name) => Ok(self.bindings.get(name).cloned().unwrap_or(Value::Null)),
            Expr::Property { target, name } => match self.eval(target)? {
                Value::Null => Ok(Value::Null),
                Value::Map(entries) => Ok(entries.get(name).cloned().unwrap_or(Value::Null)),
                other => Err(format!(
                    "cannot read property `{}` of {}",
                    name,
                    other.type_name()
                )),
            },
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                self.index(target, index)
            }
            Expr::MethodCall {
                target,
                method,
                args,
            } => {
                let receiver = self.eval(target)?;
                let args = self.eval_all(args)?;
                self.call_method(&receiver, method, &args)
            }
            Expr::FunctionCall { name, args } => {
                let args = self.eval_all(args)?;
                call_function(name, &args)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Negate => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(format!("cannot negate {}", other.type_name())),
                    },
                }
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    if !self.eval(left)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.eval(right)?.is_truthy()))
                }
                BinaryOp::Or => {
                    if self.eval(left)?.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.eval(right)?.is_truthy()))
                }
                _ => {
                    let left = self.eval(left)?;
                    let right = self.eval(right)?;
                    binary(*op, left, right)
                }
            },
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr]) -> Result<Vec<Value>, String> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn index(&self, target: Value, index: Value) -> EvalResult {
        match (target, index) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::List(items), Value::Number(n)) => {
                let position = if n.fract().is_zero() {
                    n.to_usize()
                } else {
                    None
                };
                Ok(position
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or(Value::Null))
            }
            (Value::Map(entries), Value::String(key)) => {
                Ok(entries.get(&key).cloned().unwrap_or(Value::Null))
            }
            (target, index) => Err(format!(
                "cannot index {} with {}",
                target.type_name(),
                index.type_name()
            )),
        }
    }

    fn call_method(&self, receiver: &Value, method: &str, args: &[Value]) -> EvalResult {
        match receiver {
            Value::Map(entries) => map_method(entries, method, args),
            Value::String(s) => self.string_method(s, method, args),
            Value::List(items) => list_method(items, method, args),
            other => Err(format!(
                "no method `{}` on {}",
                method,
                other.type_name()
            )),
        }
    }

    fn string_method(&self, s: &str, method: &str, args: &[Value]) -> EvalResult {
        match method {
            "length" | "size" => {
                arity(method, args, 0)?;
                Ok(Value::from(s.chars().count() as i64))
            }
            "isEmpty" => {
                arity(method, args, 0)?;
                Ok(Value::Bool(s.is_empty()))
            }
            "toUpperCase" => {
                arity(method, args, 0)?;
                Ok(Value::String(s.to_uppercase()))
            }
            "toLowerCase" => {
                arity(method, args, 0)?;
                Ok(Value::String(s.to_lowercase()))
            }
            "trim" => {
                arity(method, args, 0)?;
                Ok(Value::String(s.trim().to_string()))
            }
            "startsWith" => Ok(Value::Bool(s.starts_with(string_arg(method, args)?))),
            "endsWith" => Ok(Value::Bool(s.ends_with(string_arg(method, args)?))),
            "contains" => Ok(Value::Bool(s.contains(string_arg(method, args)?))),
            "matches" => {
                let pattern = string_arg(method, args)?;
                Ok(Value::Bool(self.full_match(pattern, s)?))
            }
            _ => Err(format!("no method `{}` on string", method)),
        }
    }

    fn full_match(&self, pattern: &str, text: &str) -> Result<bool, String> {
        if let Some(cached) = self.patterns.and_then(|p| p.get(pattern)) {
            return Ok(cached.is_match(text));
        }
        let compiled = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| format!("invalid pattern `{}`: {}", pattern, e))?;
        let matched = compiled.is_match(text);
        if let Some(patterns) = self.patterns {
            patterns.entry(pattern.to_string()).or_insert(compiled);
        }
        Ok(matched)
    }
}

fn map_method(entries: &BTreeMap<String, Value>, method: &str, args: &[Value]) -> EvalResult {
    let present = |key: &str| entries.get(key).is_some_and(|v| !v.is_null());
    match method {
        "containsOneOf" => {
            let keys = key_args(method, args)?;
            Ok(Value::Bool(keys.iter().filter(|k| present(k)).count() == 1))
        }
        "containsAllOf" => {
            let keys = key_args(method, args)?;
            Ok(Value::Bool(keys.iter().all(|k| present(k))))
        }
        "containsKey" => Ok(Value::Bool(entries.contains_key(string_arg(method, args)?))),
        "get" => Ok(entries
            .get(string_arg(method, args)?)
            .cloned()
            .unwrap_or(Value::Null)),
        "size" => {
            arity(method, args, 0)?;
            Ok(Value::from(entries.len() as i64))
        }
        "isEmpty" => {
            arity(method, args, 0)?;
            Ok(Value::Bool(entries.is_empty()))
        }
        _ => Err(format!("no method `{}` on map", method)),
    }
}

fn list_method(items: &[Value], method: &str, args: &[Value]) -> EvalResult {
    match method {
        "size" => {
            arity(method, args, 0)?;
            Ok(Value::from(items.len() as i64))
        }
        "isEmpty" => {
            arity(method, args, 0)?;
            Ok(Value::Bool(items.is_empty()))
        }
        "contains" => {
            arity(method, args, 1)?;
            Ok(Value::Bool(items.contains(&args[0])))
        }
        _ => Err(format!("no method `{}` on list", method)),
    }
}

fn call_function(name: &str, args: &[Value]) -> EvalResult {
    match name {
        "size" => {
            arity(name, args, 1)?;
            let len = match &args[0] {
                Value::Null => 0,
                Value::String(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(entries) => entries.len(),
                other => return Err(format!("size() of {}", other.type_name())),
            };
            Ok(Value::from(len as i64))
        }
        "empty" => {
            arity(name, args, 1)?;
            let empty = match &args[0] {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::List(items) => items.is_empty(),
                Value::Map(entries) => entries.is_empty(),
                Value::Bool(_) | Value::Number(_) => false,
            };
            Ok(Value::Bool(empty))
        }
        _ => Err(format!("unknown function `{}`", name)),
    }
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), String> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(format!(
            "`{}` takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        ))
    }
}

fn string_arg<'v>(name: &str, args: &'v [Value]) -> Result<&'v str, String> {
    arity(name, args, 1)?;
    args[0]
        .as_str()
        .ok_or_else(|| format!("`{}` expects a string, got {}", name, args[0].type_name()))
}

/// Key names given either as separate arguments or as one list.
fn key_args<'v>(name: &str, args: &'v [Value]) -> Result<Vec<&'v str>, String> {
    let mut keys = Vec::new();
    for arg in args {
        match arg {
            Value::String(key) => keys.push(key.as_str()),
            Value::List(items) => {
                for item in items {
                    keys.push(item.as_str().ok_or_else(|| {
                        format!("`{}` expects key names, got {}", name, item.type_name())
                    })?);
                }
            }
            other => {
                return Err(format!(
                    "`{}` expects key names, got {}",
                    name,
                    other.type_name()
                ))
            }
        }
    }
    Ok(keys)
}

fn binary(op: BinaryOp, left: Value, right: Value) -> EvalResult {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&left, &right).ok_or_else(|| {
                format!(
                    "cannot compare {} {} {}",
                    left.type_name(),
                    op.symbol(),
                    right.type_name()
                )
            })?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => checked(op, a.checked_add(*b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => Err(operand_error(op, &left, &right)),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(operand_error(op, &left, &right));
            };
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b.is_zero() {
                return Err("division by zero".to_string());
            }
            let result = match op {
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                BinaryOp::Div => a.checked_div(*b),
                _ => a.checked_rem(*b),
            };
            checked(op, result)
        }
        BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn checked(op: BinaryOp, result: Option<Decimal>) -> EvalResult {
    result
        .map(Value::Number)
        .ok_or_else(|| format!("numeric overflow in `{}`", op.symbol()))
}

fn operand_error(op: BinaryOp, left: &Value, right: &Value) -> String {
    format!(
        "unsupported operands for `{}`: {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    )
}
