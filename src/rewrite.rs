//! Boolean coercion: rephrases a tree so non-boolean columns can be used as truth values.

use crate::expr::{ClauseElement, Operator};
use tracing::trace;

/// Rephrases an expression allowing boolean usage of non-boolean columns.
///
/// Bare non-boolean columns become `column IS NOT NULL` and negated columns become
/// `column IS NULL`. Clause lists are rewritten child by child. Every other shape is
/// returned as is. The input tree is left untouched.
pub fn rephrase_as_boolean(expr: &ClauseElement) -> ClauseElement {
    match expr {
        ClauseElement::Column(column) if !column.is_bool() => {
            trace!(column = column.name(), "coercing column to IS NOT NULL");
            column.expr().is_not_null()
        }
        ClauseElement::Unary { op: Operator::Inv, element } => match &**element {
            ClauseElement::Column(column) if !column.is_bool() => {
                trace!(column = column.name(), "coercing negated column to IS NULL");
                column.expr().is_null()
            }
            _ => expr.clone(),
        },
        ClauseElement::ClauseList { op, clauses } => ClauseElement::ClauseList {
            op: *op,
            clauses: clauses.iter().map(rephrase_as_boolean).collect(),
        },
        _ => expr.clone(),
    }
}
