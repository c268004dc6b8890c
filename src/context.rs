//! Context module: holds the column values of one candidate row.
//!
//! This module provides the Row type, a schema-checked set of column values that can be
//! handed to evaluation directly or used as the record behind a derived column.

use crate::derived::Record;
use crate::expression::ColumnValues;
use crate::schema::{ColumnId, TableSchema};
use crate::types::{ColumnType, Value};
use crate::{ColExprError, Result};
use serde::{Serialize, Deserialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: HashMap<ColumnId, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self { values: HashMap::new() }
    }

    /// Sets a column value, checking it against the declared type. `Null` fits every column.
    pub fn set(&mut self, column: &str, value: impl Into<Value>, schema: &TableSchema) -> Result<()> {
        let value = value.into();
        let expected = schema
            .get_column_type(column)
            .ok_or_else(|| ColExprError::ColumnNotFound(column.to_string()))?;
        if !fits(&value, expected) {
            return Err(ColExprError::TypeError(format!(
                "Type mismatch for column '{}': expected {:?}, got {:?}",
                column,
                expected,
                value.get_type()
            )));
        }
        self.values.insert(ColumnId::new(column), value);
        Ok(())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(&ColumnId::new(column))
    }

    pub fn values(&self) -> &HashMap<ColumnId, Value> {
        &self.values
    }
}

fn fits(value: &Value, expected: &ColumnType) -> bool {
    match (value, expected) {
        (Value::Null, _) | (_, ColumnType::Unknown) => true,
        (Value::Int(_), ColumnType::Float) => true,
        (Value::List(items), ColumnType::List(elem)) => items.iter().all(|item| fits(item, elem)),
        (value, expected) => &value.get_type() == expected,
    }
}

impl ColumnValues for Row {
    fn column_value(&self, column: &ColumnId) -> Option<Value> {
        self.values.get(column).cloned()
    }
}

// Columns never set read as NULL, like an unset attribute on a fresh record
impl Record for Row {
    fn value(&self, column: &ColumnId) -> Option<Value> {
        Some(self.values.get(column).cloned().unwrap_or(Value::Null))
    }

    fn set_value(&mut self, column: &ColumnId, value: Value) -> Result<()> {
        self.values.insert(column.clone(), value);
        Ok(())
    }
}
