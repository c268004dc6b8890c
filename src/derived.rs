//! Derived columns: boolean flags computed from a compiled expression over a record.
//!
//! A flag such as `has_content` reads as `content IS NOT NULL` on any record in memory,
//! and, when given a default, can be written back: setting it to `true` stores the default
//! in the single underlying column, setting it to `false` stores `NULL`.

use crate::compiler::compile;
use crate::expr::ClauseElement;
use crate::expression::{ColumnValues, CompiledExpression};
use crate::rewrite::rephrase_as_boolean;
use crate::schema::ColumnId;
use crate::types::Value;
use crate::{ColExprError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A record whose column attributes back a derived column.
pub trait Record {
    fn value(&self, column: &ColumnId) -> Option<Value>;
    fn set_value(&mut self, column: &ColumnId, value: Value) -> Result<()>;
}

/// Value written to the underlying column when a flag is set to `true`.
#[derive(Clone)]
pub enum FlagDefault {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FlagDefault {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        FlagDefault::Factory(Arc::new(f))
    }

    fn produce(&self) -> Value {
        match self {
            FlagDefault::Value(value) => value.clone(),
            FlagDefault::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for FlagDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FlagDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<Value> for FlagDefault {
    fn from(value: Value) -> Self {
        FlagDefault::Value(value)
    }
}

// Adapts a record to the evaluator's value lookup
struct RecordValues<'a, R: ?Sized>(&'a R);

impl<R: Record + ?Sized> ColumnValues for RecordValues<'_, R> {
    fn column_value(&self, column: &ColumnId) -> Option<Value> {
        self.0.value(column)
    }
}

#[derive(Debug, Clone)]
pub struct DerivedColumn {
    expression: CompiledExpression,
    default: Option<FlagDefault>,
}

impl DerivedColumn {
    pub fn new(expression: CompiledExpression, default: Option<FlagDefault>) -> Result<Self> {
        if default.is_some() {
            match expression.referenced_columns().len() {
                1 => {}
                0 => return Err(ColExprError::NoColumnDefault),
                _ => return Err(ColExprError::MultiColumnDefault),
            }
        }
        Ok(Self { expression, default })
    }

    pub fn expression(&self) -> &CompiledExpression {
        &self.expression
    }

    /// The expression tree, for use in queries against a real store.
    pub fn sql(&self) -> &ClauseElement {
        self.expression.sql()
    }

    pub fn is_writable(&self) -> bool {
        self.default.is_some()
    }

    /// Evaluates the flag on the record's current column values.
    pub fn get<R: Record + ?Sized>(&self, record: &R) -> Result<Value> {
        self.expression.evaluate(&RecordValues(record))
    }

    /// Writes the flag back through its single underlying column.
    pub fn set<R: Record + ?Sized>(&self, record: &mut R, value: &Value) -> Result<()> {
        let default = self.default.as_ref().ok_or(ColExprError::ReadOnlyFlag)?;
        let flag = match value {
            Value::Bool(flag) => *flag,
            other => {
                return Err(ColExprError::TypeError(format!(
                    "Flag only accepts boolean values, got {}",
                    other.type_name()
                )))
            }
        };
        let column = self
            .expression
            .referenced_columns()
            .into_iter()
            .next()
            .ok_or(ColExprError::NoColumnDefault)?;
        let stored = if flag { default.produce() } else { Value::Null };
        debug!(column = %column, flag, "setting derived flag");
        record.set_value(&column, stored)
    }
}

/// Builds a boolean flag over `expr`: non-boolean columns read as `IS NOT NULL`.
pub fn column_flag(expr: &ClauseElement, default: Option<FlagDefault>) -> Result<DerivedColumn> {
    let expression = compile(&rephrase_as_boolean(expr), false)?;
    DerivedColumn::new(expression, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Row;
    use crate::expr::{and_, not_};
    use crate::schema::Column;
    use crate::types::ColumnType;

    fn content() -> Column {
        Column::new("content", ColumnType::Text)
    }
    fn sent_at() -> Column {
        Column::new("sent_at", ColumnType::Int)
    }

    #[test]
    fn test_flag_follows_column() {
        let flag = column_flag(&content().expr(), None).unwrap();
        let mut row = Row::new();
        assert_eq!(flag.get(&row).unwrap(), Value::Bool(false));
        row.set_value(content().id(), Value::from("Spam spam spam")).unwrap();
        assert_eq!(flag.get(&row).unwrap(), Value::Bool(true));
        row.set_value(content().id(), Value::Null).unwrap();
        assert_eq!(flag.get(&row).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_flag_sql_is_rewritten() {
        let flag = column_flag(&content().expr(), None).unwrap();
        assert_eq!(flag.sql(), &content().expr().is_not_null());
    }

    #[test]
    fn test_assign_readonly() {
        let flag = column_flag(&content().expr(), None).unwrap();
        let mut row = Row::new();
        assert!(!flag.is_writable());
        assert!(matches!(flag.set(&mut row, &Value::Bool(true)), Err(ColExprError::ReadOnlyFlag)));
    }

    #[test]
    fn test_assign_non_bool() {
        let flag = column_flag(&sent_at().expr(), Some(FlagDefault::from(Value::Int(0)))).unwrap();
        let mut row = Row::new();
        for value in [Value::Null, Value::Int(1), Value::from("ham")] {
            let err = flag.set(&mut row, &value).unwrap_err();
            assert!(err.to_string().contains("boolean"));
        }
    }

    #[test]
    fn test_assign_uses_default_and_null() {
        let flag = column_flag(&sent_at().expr(), Some(FlagDefault::factory(|| Value::Int(1_700_000_000)))).unwrap();
        let mut row = Row::new();
        flag.set(&mut row, &Value::Bool(true)).unwrap();
        assert_eq!(row.get("sent_at"), Some(&Value::Int(1_700_000_000)));
        assert_eq!(flag.get(&row).unwrap(), Value::Bool(true));
        flag.set(&mut row, &Value::Bool(false)).unwrap();
        assert_eq!(row.get("sent_at"), Some(&Value::Null));
        assert_eq!(flag.get(&row).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_multi_column_default_rejected() {
        let expr = and_([content().expr(), not_(sent_at())]);
        assert!(matches!(
            column_flag(&expr, Some(FlagDefault::Value(Value::Bool(true)))),
            Err(ColExprError::MultiColumnDefault)
        ));
        let flag = column_flag(&expr, None).unwrap();
        let mut row = Row::new();
        row.set_value(content().id(), Value::from("draft")).unwrap();
        assert_eq!(flag.get(&row).unwrap(), Value::Bool(true));
        row.set_value(sent_at().id(), Value::Int(5)).unwrap();
        assert_eq!(flag.get(&row).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_columnless_default_rejected() {
        let constant = ClauseElement::literal(true);
        assert!(matches!(
            column_flag(&constant, Some(FlagDefault::from(Value::Int(1)))),
            Err(ColExprError::NoColumnDefault)
        ));
        let flag = column_flag(&constant, None).unwrap();
        assert_eq!(flag.get(&Row::new()).unwrap(), Value::Bool(true));
    }
}
