//! Schema module: defines columns and the column/type registry for a table.
//!
//! This module provides the Column and ColumnId types and the TableSchema builder.

use crate::types::ColumnType;
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable identity of a column, used as the key when supplying values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(Arc<str>);

impl ColumnId {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(name: &str) -> Self {
        ColumnId::new(name)
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    ty: ColumnType,
}

impl Column {
    pub fn new(name: &str, ty: ColumnType) -> Self {
        Self { id: ColumnId::new(name), ty }
    }

    pub fn id(&self) -> &ColumnId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.ty
    }

    pub fn is_bool(&self) -> bool {
        self.ty.is_bool()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: HashMap<String, Column>,
    column_names: Vec<String>, // sorted
}

impl TableSchema {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }
    pub fn get_column_type(&self, name: &str) -> Option<&ColumnType> {
        self.columns.get(name).map(Column::column_type)
    }
    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.column_names.iter().map(|s| s.as_str())
    }
    pub fn num_columns(&self) -> usize {
        self.column_names.len()
    }
}

#[derive(Debug, Default)]
pub struct TableSchemaBuilder {
    name: String,
    columns: HashMap<String, ColumnType>,
}

impl TableSchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), columns: HashMap::new() }
    }
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(name.into(), ty);
        self
    }
    pub fn build(self) -> TableSchema {
        let mut column_names: Vec<_> = self.columns.keys().cloned().collect();
        column_names.sort();
        let columns = self
            .columns
            .into_iter()
            .map(|(name, ty)| {
                let column = Column::new(&name, ty);
                (name, column)
            })
            .collect();
        TableSchema {
            name: self.name,
            columns,
            column_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_column_registration_and_retrieval() {
        let schema = TableSchemaBuilder::new("message")
            .column("content", ColumnType::Text)
            .column("sent", ColumnType::Bool)
            .build();
        assert_eq!(schema.get_column_type("content"), Some(&ColumnType::Text));
        assert!(schema.column("sent").unwrap().is_bool());
        assert_eq!(schema.column("missing"), None);
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["content", "sent"]);
    }

    #[test]
    fn test_column_identity_is_stable() {
        let a = Column::new("int_a", ColumnType::Int);
        let b = Column::new("int_a", ColumnType::Int);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id(), &ColumnId::from("int_a"));
    }

    #[test]
    fn test_schema_builder_overwrite_column() {
        let schema = TableSchemaBuilder::new("t")
            .column("foo", ColumnType::Int)
            .column("foo", ColumnType::Text)
            .build();
        // Last one wins
        assert_eq!(schema.get_column_type("foo"), Some(&ColumnType::Text));
        assert_eq!(schema.num_columns(), 1);
    }

    #[test]
    fn test_schema_serialization_deserialization() {
        let schema = TableSchemaBuilder::new("t")
            .column("foo", ColumnType::Int)
            .column("tags", ColumnType::List(Box::new(ColumnType::Text)))
            .build();
        let json = serde_json::to_string(&schema).unwrap();
        let deserialized: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema.column("tags"), deserialized.column("tags"));
        assert_eq!(deserialized.name(), "t");
    }
}
