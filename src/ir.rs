//! Intermediate Representation (IR) for compiled expressions.
//!
//! This module defines the RPN instructions and the stack they are evaluated on.

use crate::functions::Func;
use crate::schema::ColumnId;
use crate::types::Value;
use crate::EvaluationError;
use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    Literal,
    ColumnRef,
    Operator,
}

/// A single instruction in a compiled expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Push a literal value onto the stack.
    Literal(Value),
    /// Push the substitute value of a column onto the stack.
    ColumnRef(ColumnId),
    /// Pop `arity` values, apply `func`, push the result.
    Operator { func: Func, arity: usize },
}

impl Instruction {
    pub fn unary(func: Func) -> Self {
        Instruction::Operator { func, arity: 1 }
    }

    pub fn binary(func: Func) -> Self {
        Instruction::Operator { func, arity: 2 }
    }

    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Literal(_) => InstructionKind::Literal,
            Instruction::ColumnRef(_) => InstructionKind::ColumnRef,
            Instruction::Operator { .. } => InstructionKind::Operator,
        }
    }

    /// Operand count for operators, `None` for everything else.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Instruction::Operator { arity, .. } => Some(*arity),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Literal(value) => write!(f, "LIT {}", value),
            Instruction::ColumnRef(column) => write!(f, "COL {}", column),
            Instruction::Operator { func, arity } => write!(f, "OP {}/{}", func, arity),
        }
    }
}

/// The LIFO stack used during evaluation. One per evaluation call.
#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { values: Vec::with_capacity(capacity) }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, EvaluationError> {
        self.values.pop().ok_or(EvaluationError::StackUnderflow)
    }

    /// Pops `n` values, most recently pushed first.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, EvaluationError> {
        if n > self.values.len() {
            return Err(EvaluationError::StackUnderflow);
        }
        let split = self.values.len() - n;
        let mut popped = self.values.split_off(split);
        popped.reverse();
        Ok(popped)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
