//! Compiled expressions: an immutable RPN program plus the tree it was compiled from.
//!
//! A `CompiledExpression` is built once and evaluated any number of times against
//! different substitute column values. It is cheap to clone and safe to share
//! across threads; every evaluation uses its own stack.

use crate::expr::ClauseElement;
use crate::ir::{Instruction, Stack};
use crate::schema::ColumnId;
use crate::types::Value;
use crate::{ColExprError, EvaluationError, Result};
use serde::{Serialize, Deserialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;
use tracing::trace;

/// Source of substitute column values for an evaluation.
pub trait ColumnValues {
    fn column_value(&self, column: &ColumnId) -> Option<Value>;
}

impl<S: BuildHasher> ColumnValues for HashMap<ColumnId, Value, S> {
    fn column_value(&self, column: &ColumnId) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl ColumnValues for BTreeMap<ColumnId, Value> {
    fn column_value(&self, column: &ColumnId) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl<T: ColumnValues + ?Sized> ColumnValues for &T {
    fn column_value(&self, column: &ColumnId) -> Option<Value> {
        (**self).column_value(column)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledExpression {
    instructions: Arc<[Instruction]>,
    sql: ClauseElement,
}

impl CompiledExpression {
    pub(crate) fn new(instructions: Vec<Instruction>, sql: ClauseElement) -> Self {
        Self { instructions: instructions.into(), sql }
    }

    /// Evaluates the expression on the given column values.
    pub fn evaluate<V: ColumnValues + ?Sized>(&self, values: &V) -> Result<Value> {
        let mut stack = Stack::with_capacity(self.instructions.len());
        for instruction in self.instructions.iter() {
            match instruction {
                Instruction::Literal(value) => stack.push(value.clone()),
                Instruction::ColumnRef(column) => match values.column_value(column) {
                    Some(value) => stack.push(value),
                    None => {
                        trace!(column = %column, "no value supplied for column");
                        return Err(ColExprError::MissingColumnValue(column.clone()));
                    }
                },
                Instruction::Operator { func, arity } => {
                    let args = stack.pop_n(*arity)?;
                    let result = func.apply(&args).map_err(|e| {
                        trace!(error = %e, expression = %self.sql, "operator failed");
                        e
                    })?;
                    stack.push(result);
                }
            }
        }
        let result = stack.pop()?;
        if !stack.is_empty() {
            return Err(EvaluationError::UnbalancedStack(stack.len() + 1).into());
        }
        Ok(result)
    }

    /// Columns referenced anywhere in the expression.
    pub fn referenced_columns(&self) -> BTreeSet<ColumnId> {
        self.instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::ColumnRef(column) => Some(column.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The source tree; the boolean-coerced rewrite when compiled with `force_bool`.
    pub fn sql(&self) -> &ClauseElement {
        &self.sql
    }
}

impl PartialEq for CompiledExpression {
    fn eq(&self, other: &Self) -> bool {
        self.instructions == other.instructions
    }
}
