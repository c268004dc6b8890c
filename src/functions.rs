//! Functions module: the fixed table of operator functions carried by compiled instructions.
//!
//! Every operator a compiled expression can apply is one `Func` variant with pinned arity
//! and semantics, so instruction streams stay comparable and serializable.

use crate::types::Value;
use crate::EvaluationError;
use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use std::fmt;

macro_rules! operator_functions {
    ($( $variant:ident: $name:expr, $arity:expr ),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Func {
            $($variant,)*
        }

        impl Func {
            /// Display name of the function.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Func::$variant => $name,)*
                }
            }

            /// Number of operands the function takes, `None` for variadic combinators.
            pub fn fixed_arity(&self) -> Option<usize> {
                match self {
                    $(Func::$variant => $arity,)*
                }
            }
        }
    };
}

operator_functions! {
    Eq: "eq", Some(2),
    Ne: "ne", Some(2),
    Lt: "lt", Some(2),
    Le: "le", Some(2),
    Gt: "gt", Some(2),
    Ge: "ge", Some(2),
    Add: "add", Some(2),
    Sub: "sub", Some(2),
    Mul: "mul", Some(2),
    Div: "truediv", Some(2),
    Mod: "mod", Some(2),
    In: "in", Some(2),
    NotIn: "not_in", Some(2),
    Contains: "contains", Some(2),
    Matches: "matches", Some(2),
    Inv: "inv", Some(1),
    Neg: "neg", Some(1),
    Not: "not", Some(1),
    All: "all", None,
    Any: "any", None,
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Func {
    /// Applies the function to operands given in stack-pop order.
    ///
    /// For binary functions that is `[left, right]`.
    pub fn apply(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        if let Some(expected) = self.fixed_arity() {
            if args.len() != expected {
                return Err(EvaluationError::Arity { func: *self, expected, got: args.len() });
            }
        }
        match self {
            Func::Eq => Ok(Value::Bool(values_equal(&args[0], &args[1]))),
            Func::Ne => Ok(Value::Bool(!values_equal(&args[0], &args[1]))),
            Func::Lt => self.cmp_ord(args, |o| o == Ordering::Less),
            Func::Le => self.cmp_ord(args, |o| o != Ordering::Greater),
            Func::Gt => self.cmp_ord(args, |o| o == Ordering::Greater),
            Func::Ge => self.cmp_ord(args, |o| o != Ordering::Less),
            Func::Add => self.arith(args),
            Func::Sub => self.arith(args),
            Func::Mul => self.arith(args),
            Func::Div => self.arith(args),
            Func::Mod => self.arith(args),
            Func::In => self.cmp_in(&args[0], &args[1]).map(Value::Bool),
            Func::NotIn => self.cmp_in(&args[0], &args[1]).map(|b| Value::Bool(!b)),
            Func::Contains => self.cmp_in(&args[1], &args[0]).map(Value::Bool),
            Func::Matches => self.cmp_matches(&args[0], &args[1]).map(Value::Bool),
            Func::Inv => match &args[0] {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                Value::Int(i) => Ok(Value::Int(!i)),
                _ => Err(self.mismatch(args)),
            },
            Func::Neg => match &args[0] {
                Value::Int(i) => i.checked_neg().map(Value::Int).ok_or(EvaluationError::Overflow(*self)),
                Value::Float(x) => Ok(Value::Float(-x)),
                _ => Err(self.mismatch(args)),
            },
            Func::Not => Ok(Value::Bool(!args[0].is_truthy())),
            Func::All => Ok(Value::Bool(args.iter().all(Value::is_truthy))),
            Func::Any => Ok(Value::Bool(args.iter().any(Value::is_truthy))),
        }
    }

    fn mismatch(&self, args: &[Value]) -> EvaluationError {
        let operands = args.iter().map(Value::type_name).collect::<Vec<_>>().join(", ");
        EvaluationError::TypeMismatch { func: *self, operands }
    }

    // Ordered comparisons; NaN compares false against everything
    fn cmp_ord<F>(&self, args: &[Value], cmp: F) -> Result<Value, EvaluationError>
    where
        F: Fn(Ordering) -> bool,
    {
        match compare_values(&args[0], &args[1]) {
            Some(Comparable::Ordered(ordering)) => Ok(Value::Bool(cmp(ordering))),
            Some(Comparable::Unordered) => Ok(Value::Bool(false)),
            None => Err(self.mismatch(args)),
        }
    }

    fn arith(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        match (&args[0], &args[1]) {
            (Value::Int(a), Value::Int(b)) => {
                let result = match self {
                    Func::Add => a.checked_add(*b),
                    Func::Sub => a.checked_sub(*b),
                    Func::Mul => a.checked_mul(*b),
                    Func::Div => {
                        if *b == 0 {
                            return Err(EvaluationError::DivisionByZero);
                        }
                        return Ok(Value::Float(*a as f64 / *b as f64));
                    }
                    Func::Mod => {
                        if *b == 0 {
                            return Err(EvaluationError::DivisionByZero);
                        }
                        a.checked_rem(*b)
                    }
                    _ => return Err(self.mismatch(args)),
                };
                result.map(Value::Int).ok_or(EvaluationError::Overflow(*self))
            }
            (Value::Text(a), Value::Text(b)) if *self == Func::Add => Ok(Value::Text(format!("{}{}", a, b))),
            (Value::List(a), Value::List(b)) if *self == Func::Add => {
                Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
            }
            (a, b) => {
                let (a, b) = match (as_float(a), as_float(b)) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(self.mismatch(args)),
                };
                match self {
                    Func::Add => Ok(Value::Float(a + b)),
                    Func::Sub => Ok(Value::Float(a - b)),
                    Func::Mul => Ok(Value::Float(a * b)),
                    Func::Div if b == 0.0 => Err(EvaluationError::DivisionByZero),
                    Func::Div => Ok(Value::Float(a / b)),
                    Func::Mod if b == 0.0 => Err(EvaluationError::DivisionByZero),
                    Func::Mod => Ok(Value::Float(a % b)),
                    _ => Err(self.mismatch(args)),
                }
            }
        }
    }

    // Membership of `needle` in `haystack`: list elements or substrings
    fn cmp_in(&self, needle: &Value, haystack: &Value) -> Result<bool, EvaluationError> {
        match (needle, haystack) {
            (needle, Value::List(items)) => Ok(items.iter().any(|item| values_equal(needle, item))),
            (Value::Text(n), Value::Text(h)) => Ok(h.contains(n.as_str())),
            _ => Err(self.mismatch(&[needle.clone(), haystack.clone()])),
        }
    }

    fn cmp_matches(&self, subject: &Value, pattern: &Value) -> Result<bool, EvaluationError> {
        match (subject, pattern) {
            (Value::Text(s), Value::Text(pat)) => pattern_match(s, pat),
            _ => Err(self.mismatch(&[subject.clone(), pattern.clone()])),
        }
    }
}

#[cfg(feature = "regex")]
fn pattern_match(s: &str, pat: &str) -> Result<bool, EvaluationError> {
    let re = regex::Regex::new(pat).map_err(|e| EvaluationError::InvalidPattern {
        pattern: pat.to_string(),
        reason: e.to_string(),
    })?;
    Ok(re.is_match(s))
}

// Without the regex feature a pattern is matched as a plain substring
#[cfg(not(feature = "regex"))]
fn pattern_match(s: &str, pat: &str) -> Result<bool, EvaluationError> {
    Ok(s.contains(pat))
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

/// Equality as the evaluator sees it: numeric across int/float, structural otherwise.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            cmp_int_float(*x, *y) == Some(Ordering::Equal)
        }
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

// Exact int/float ordering; `None` only for NaN
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return None;
    }
    if f >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if f < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    let fraction = f - whole;
    Some(i.cmp(&(whole as i64)).then_with(|| 0.0f64.partial_cmp(&fraction).unwrap_or(Ordering::Equal)))
}

enum Comparable {
    Ordered(Ordering),
    Unordered,
}

fn compare_values(a: &Value, b: &Value) -> Option<Comparable> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Some(Comparable::Ordered(x.cmp(y))),
        (Value::Int(x), Value::Int(y)) => Some(Comparable::Ordered(x.cmp(y))),
        (Value::Text(x), Value::Text(y)) => Some(Comparable::Ordered(x.cmp(y))),
        (Value::Int(x), Value::Float(y)) => {
            Some(cmp_int_float(*x, *y).map_or(Comparable::Unordered, Comparable::Ordered))
        }
        (Value::Float(x), Value::Int(y)) => Some(
            cmp_int_float(*y, *x).map_or(Comparable::Unordered, |o| Comparable::Ordered(o.reverse())),
        ),
        (Value::List(xs), Value::List(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                match compare_values(x, y)? {
                    Comparable::Ordered(Ordering::Equal) => continue,
                    other => return Some(other),
                }
            }
            Some(Comparable::Ordered(xs.len().cmp(&ys.len())))
        }
        (a, b) => {
            let (x, y) = (as_float(a)?, as_float(b)?);
            Some(x.partial_cmp(&y).map_or(Comparable::Unordered, Comparable::Ordered))
        }
    }
}
