//! Colexpr: compile column predicates into flat RPN programs and evaluate them in memory.
//!
//! An expression tree over named columns (built with the helpers in [`expr`]) is lowered
//! once into a postfix instruction sequence. The resulting [`CompiledExpression`] can then
//! answer "does this candidate row satisfy the predicate?" any number of times against
//! different substitute column values, without walking the tree again.
//!
//! # Architecture
//! - Value and column model (`types`, `schema`)
//! - Expression tree and builders (`expr`)
//! - Boolean coercion rewrite (`rewrite`)
//! - Compilation to RPN instructions (`compiler`, `ir`, `functions`)
//! - Stack evaluation (`expression`)
//! - Schema-checked rows and derived flag columns (`context`, `derived`)

mod schema;
mod expr;
mod rewrite;
mod compiler;
mod ir;
mod expression;
mod context;
mod types;
mod functions;
mod derived;

pub use schema::*;
pub use expr::*;
pub use rewrite::*;
pub use compiler::*;
pub use ir::*;
pub use expression::*;
pub use context::*;
pub use types::*;
pub use functions::*;
pub use derived::*;

use thiserror::Error;

/// Unified error type for colexpr operations
#[derive(Debug, Error)]
pub enum ColExprError {
    #[error("Unsupported operator {0}")]
    UnsupportedOperator(String),
    #[error("Unsupported expression {expr} of type {shape}")]
    UnsupportedExpression { shape: &'static str, expr: String },
    #[error("Missing value for column '{0}'")]
    MissingColumnValue(ColumnId),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Cannot use default for multi-column expression")]
    MultiColumnDefault,
    #[error("Cannot use default for an expression without columns")]
    NoColumnDefault,
    #[error("Flag is read-only: no default value configured")]
    ReadOnlyFlag,
}

/// Failures raised while applying an operator to its operands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("operator {func} cannot be applied to ({operands})")]
    TypeMismatch { func: Func, operands: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {0}")]
    Overflow(Func),
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("operator {func} expects {expected} operands, got {got}")]
    Arity { func: Func, expected: usize, got: usize },
    #[error("evaluation stack underflow")]
    StackUnderflow,
    #[error("evaluation finished with {0} values on the stack")]
    UnbalancedStack(usize),
}

pub type Result<T> = std::result::Result<T, ColExprError>;
