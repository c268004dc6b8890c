//! Expression (tree) module: defines the clause elements that make up a column predicate.
//!
//! Trees are normally produced by an external query builder; the helpers here build the
//! same shapes so callers and tests can describe predicates directly in Rust.

use crate::schema::Column;
use crate::types::Value;
use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClauseElement {
    /// A bound literal value.
    BindParam(Value),
    /// A parenthesized list of scalar elements, e.g. the right side of `IN`.
    Grouping(Vec<ClauseElement>),
    Null,
    Column(Column),
    /// A column used with boolean comparison semantics.
    AsBoolean {
        element: Column,
        op: Operator,
    },
    Unary {
        op: Operator,
        element: Box<ClauseElement>,
    },
    ClauseList {
        op: BoolOp,
        clauses: Vec<ClauseElement>,
    },
    Binary {
        left: Box<ClauseElement>,
        op: Operator,
        right: Box<ClauseElement>,
    },
    /// A SQL function call. Not evaluable in memory.
    Function {
        name: String,
        args: Vec<ClauseElement>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    In,
    NotIn,
    Is,
    IsNot,
    IsTrue,
    IsFalse,
    Inv, // NOT / bitwise ~
    Neg,
    Contains,
    Matches,
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

impl Operator {
    pub fn is_custom(&self) -> bool {
        matches!(self, Operator::Custom(_))
    }

    pub fn symbol(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::IsTrue => "IS true",
            Operator::IsFalse => "IS false",
            Operator::Inv => "NOT",
            Operator::Neg => "-",
            Operator::Contains => "CONTAINS",
            Operator::Matches => "MATCHES",
            Operator::Custom(op) => op,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl ClauseElement {
    pub fn literal(value: impl Into<Value>) -> Self {
        ClauseElement::BindParam(value.into())
    }

    pub fn null() -> Self {
        ClauseElement::Null
    }

    /// A parenthesized list of bound values.
    pub fn tuple<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ClauseElement::Grouping(values.into_iter().map(ClauseElement::literal).collect())
    }

    pub fn function(name: impl Into<String>, args: Vec<ClauseElement>) -> Self {
        ClauseElement::Function { name: name.into(), args }
    }

    /// Name of this node's shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            ClauseElement::BindParam(_) => "BindParam",
            ClauseElement::Grouping(_) => "Grouping",
            ClauseElement::Null => "Null",
            ClauseElement::Column(_) => "Column",
            ClauseElement::AsBoolean { .. } => "AsBoolean",
            ClauseElement::Unary { .. } => "Unary",
            ClauseElement::ClauseList { .. } => "ClauseList",
            ClauseElement::Binary { .. } => "Binary",
            ClauseElement::Function { .. } => "Function",
        }
    }

    fn binary(self, op: Operator, right: impl Into<ClauseElement>) -> Self {
        ClauseElement::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Eq, right)
    }
    pub fn ne(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Ne, right)
    }
    pub fn lt(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Lt, right)
    }
    pub fn le(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Le, right)
    }
    pub fn gt(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Gt, right)
    }
    pub fn ge(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Ge, right)
    }
    pub fn add(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Add, right)
    }
    pub fn sub(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Sub, right)
    }
    pub fn mul(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Mul, right)
    }
    pub fn div(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Div, right)
    }
    pub fn rem(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Mod, right)
    }
    pub fn contains(self, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Contains, right)
    }
    pub fn matches(self, pattern: &str) -> Self {
        self.binary(Operator::Matches, pattern)
    }

    pub fn in_<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.binary(Operator::In, ClauseElement::tuple(values))
    }

    pub fn not_in<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.binary(Operator::NotIn, ClauseElement::tuple(values))
    }

    pub fn is_null(self) -> Self {
        self.binary(Operator::Is, ClauseElement::Null)
    }

    pub fn is_not_null(self) -> Self {
        self.binary(Operator::IsNot, ClauseElement::Null)
    }

    /// Applies a caller-defined operator. Such trees can be built but not compiled.
    pub fn op(self, name: &str, right: impl Into<ClauseElement>) -> Self {
        self.binary(Operator::Custom(name.to_string()), right)
    }

    pub fn neg(self) -> Self {
        ClauseElement::Unary { op: Operator::Neg, element: Box::new(self) }
    }
}

impl From<Column> for ClauseElement {
    fn from(column: Column) -> Self {
        ClauseElement::Column(column)
    }
}

impl From<&Column> for ClauseElement {
    fn from(column: &Column) -> Self {
        ClauseElement::Column(column.clone())
    }
}

impl From<Value> for ClauseElement {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ClauseElement::Null,
            value => ClauseElement::BindParam(value),
        }
    }
}

impl From<i64> for ClauseElement {
    fn from(i: i64) -> Self {
        ClauseElement::literal(i)
    }
}

impl From<i32> for ClauseElement {
    fn from(i: i32) -> Self {
        ClauseElement::literal(i)
    }
}

impl From<f64> for ClauseElement {
    fn from(x: f64) -> Self {
        ClauseElement::literal(x)
    }
}

impl From<bool> for ClauseElement {
    fn from(b: bool) -> Self {
        ClauseElement::literal(b)
    }
}

impl From<&str> for ClauseElement {
    fn from(s: &str) -> Self {
        ClauseElement::literal(s)
    }
}

impl Column {
    pub fn expr(&self) -> ClauseElement {
        ClauseElement::Column(self.clone())
    }
}

pub fn and_(clauses: impl IntoIterator<Item = ClauseElement>) -> ClauseElement {
    ClauseElement::ClauseList { op: BoolOp::And, clauses: clauses.into_iter().collect() }
}

pub fn or_(clauses: impl IntoIterator<Item = ClauseElement>) -> ClauseElement {
    ClauseElement::ClauseList { op: BoolOp::Or, clauses: clauses.into_iter().collect() }
}

/// Negates an element. Boolean columns negate through `IS false`, everything else
/// is wrapped in a unary `NOT`.
pub fn not_(element: impl Into<ClauseElement>) -> ClauseElement {
    match element.into() {
        ClauseElement::Column(column) if column.is_bool() => ClauseElement::AsBoolean {
            element: column,
            op: Operator::IsFalse,
        },
        element => ClauseElement::Unary { op: Operator::Inv, element: Box::new(element) },
    }
}

impl fmt::Display for ClauseElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseElement::BindParam(value) => write!(f, "{}", value),
            ClauseElement::Grouping(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, ")")
            }
            ClauseElement::Null => write!(f, "NULL"),
            ClauseElement::Column(column) => write!(f, "{}", column.name()),
            ClauseElement::AsBoolean { element, op: Operator::IsFalse } => write!(f, "NOT {}", element.name()),
            ClauseElement::AsBoolean { element, .. } => write!(f, "{}", element.name()),
            ClauseElement::Unary { op, element } => match **element {
                ClauseElement::Column(_) | ClauseElement::BindParam(_) => write!(f, "{} {}", op, element),
                _ => write!(f, "{} ({})", op, element),
            },
            ClauseElement::ClauseList { op, clauses } => {
                let sep = match op {
                    BoolOp::And => " AND ",
                    BoolOp::Or => " OR ",
                };
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    match clause {
                        ClauseElement::ClauseList { .. } => write!(f, "({})", clause)?,
                        _ => write!(f, "{}", clause)?,
                    }
                }
                Ok(())
            }
            ClauseElement::Binary { left, op, right } => write!(f, "{} {} {}", left, op, right),
            ClauseElement::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;

    fn int_a() -> Column {
        Column::new("int_a", ColumnType::Int)
    }

    fn bool_a() -> Column {
        Column::new("bool_a", ColumnType::Bool)
    }

    #[test]
    fn test_build_comparison() {
        let expr = int_a().expr().ge(18);
        match expr {
            ClauseElement::Binary { left, op, right } => {
                assert_eq!(*left, ClauseElement::Column(int_a()));
                assert_eq!(op, Operator::Ge);
                assert_eq!(*right, ClauseElement::BindParam(Value::Int(18)));
            }
            _ => panic!("Expected binary expr"),
        }
    }

    #[test]
    fn test_is_null_builds_against_null() {
        let expr = int_a().expr().is_not_null();
        assert_eq!(expr, int_a().expr().binary(Operator::IsNot, Value::Null));
        assert_eq!(expr.to_string(), "int_a IS NOT NULL");
    }

    #[test]
    fn test_not_bool_column_is_as_boolean() {
        assert_eq!(
            not_(bool_a()),
            ClauseElement::AsBoolean { element: bool_a(), op: Operator::IsFalse }
        );
    }

    #[test]
    fn test_not_other_is_unary() {
        match not_(int_a()) {
            ClauseElement::Unary { op: Operator::Inv, element } => {
                assert_eq!(*element, ClauseElement::Column(int_a()))
            }
            other => panic!("Expected unary NOT, got {:?}", other),
        }
    }

    #[test]
    fn test_in_builds_grouping() {
        let expr = int_a().expr().in_([1, 2, 3]);
        match expr {
            ClauseElement::Binary { op: Operator::In, right, .. } => match *right {
                ClauseElement::Grouping(ref elems) => assert_eq!(elems.len(), 3),
                _ => panic!("Expected grouping"),
            },
            _ => panic!("Expected IN expr"),
        }
    }

    #[test]
    fn test_display() {
        let expr = and_([
            bool_a().expr(),
            or_([int_a().expr().eq(1), not_(int_a())]),
        ]);
        assert_eq!(expr.to_string(), "bool_a AND (int_a = 1 OR NOT int_a)");
        assert_eq!(ClauseElement::function("exp", vec![int_a().expr(), 2.into()]).to_string(), "exp(int_a, 2)");
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(ClauseElement::Null.shape(), "Null");
        assert_eq!(ClauseElement::function("f", vec![]).shape(), "Function");
        assert_eq!(int_a().expr().op("^", 2).shape(), "Binary");
    }
}
