//! Compiler module: lowers expression trees into RPN instruction sequences.
//!
//! Operands are emitted before their operator. Binary operands are emitted right first,
//! then left, so the evaluator pops the left operand first when applying the function.

use crate::expr::{BoolOp, ClauseElement, Operator};
use crate::expression::CompiledExpression;
use crate::functions::Func;
use crate::ir::Instruction;
use crate::rewrite::rephrase_as_boolean;
use crate::types::Value;
use crate::{ColExprError, Result};
use tracing::debug;

/// Compiles expression trees. With `force_bool` set, bare non-boolean columns and their
/// negations are compiled with `IS NOT NULL` / `IS NULL` semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    force_bool: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_bool(mut self, force_bool: bool) -> Self {
        self.force_bool = force_bool;
        self
    }

    pub fn compile(&self, expr: &ClauseElement) -> Result<CompiledExpression> {
        let mut instructions = Vec::new();
        serialize(expr, self.force_bool, &mut instructions)?;
        let sql = if self.force_bool { rephrase_as_boolean(expr) } else { expr.clone() };
        debug!(
            expression = %expr,
            force_bool = self.force_bool,
            instructions = instructions.len(),
            "compiled expression"
        );
        Ok(CompiledExpression::new(instructions, sql))
    }
}

/// Compiles `expr`, optionally with boolean coercion.
pub fn compile(expr: &ClauseElement, force_bool: bool) -> Result<CompiledExpression> {
    Compiler::new().force_bool(force_bool).compile(expr)
}

fn serialize(expr: &ClauseElement, force_bool: bool, out: &mut Vec<Instruction>) -> Result<()> {
    match expr {
        ClauseElement::BindParam(value) => out.push(Instruction::Literal(value.clone())),
        ClauseElement::Grouping(elements) => {
            let values = elements.iter().map(scalar_value).collect::<Result<Vec<_>>>()?;
            out.push(Instruction::Literal(Value::List(values)));
        }
        ClauseElement::Null => out.push(Instruction::Literal(Value::Null)),
        ClauseElement::Column(column) => {
            if force_bool && !column.is_bool() {
                serialize(&column.expr().is_not_null(), false, out)?;
            } else {
                out.push(Instruction::ColumnRef(column.id().clone()));
            }
        }
        ClauseElement::AsBoolean { element, op } => {
            out.push(Instruction::ColumnRef(element.id().clone()));
            if let Some(func) = as_boolean_func(op)? {
                out.push(Instruction::unary(func));
            }
        }
        ClauseElement::Unary { op, element } => match &**element {
            ClauseElement::Column(column) if force_bool && *op == Operator::Inv && !column.is_bool() => {
                serialize(&column.expr().is_null(), false, out)?;
            }
            _ => {
                serialize(element, force_bool, out)?;
                if let Some(func) = unary_func(op)? {
                    out.push(Instruction::unary(func));
                }
            }
        },
        ClauseElement::ClauseList { op, clauses } => {
            for clause in clauses {
                serialize(clause, force_bool, out)?;
            }
            let func = match op {
                BoolOp::And => Func::All,
                BoolOp::Or => Func::Any,
            };
            out.push(Instruction::Operator { func, arity: clauses.len() });
        }
        ClauseElement::Binary { left, op, right } => {
            if op.is_custom() {
                return Err(ColExprError::UnsupportedOperator(op.to_string()));
            }
            let func = binary_func(op)?;
            serialize(right, false, out)?;
            serialize(left, false, out)?;
            out.push(Instruction::binary(func));
        }
        ClauseElement::Function { .. } => return Err(unsupported(expr)),
    }
    Ok(())
}

fn unsupported(expr: &ClauseElement) -> ColExprError {
    ColExprError::UnsupportedExpression { shape: expr.shape(), expr: expr.to_string() }
}

fn scalar_value(expr: &ClauseElement) -> Result<Value> {
    match expr {
        ClauseElement::BindParam(value) => Ok(value.clone()),
        ClauseElement::Null => Ok(Value::Null),
        other => Err(unsupported(other)),
    }
}

// `IS true` is the identity transform and emits nothing
fn as_boolean_func(op: &Operator) -> Result<Option<Func>> {
    match op {
        Operator::IsTrue => Ok(None),
        Operator::IsFalse => Ok(Some(Func::Not)),
        other => Err(ColExprError::UnsupportedOperator(other.to_string())),
    }
}

fn unary_func(op: &Operator) -> Result<Option<Func>> {
    match op {
        Operator::Inv => Ok(Some(Func::Inv)),
        Operator::Neg => Ok(Some(Func::Neg)),
        Operator::IsFalse => Ok(Some(Func::Not)),
        Operator::IsTrue => Ok(None),
        other => Err(ColExprError::UnsupportedOperator(other.to_string())),
    }
}

fn binary_func(op: &Operator) -> Result<Func> {
    let func = match op {
        Operator::Eq | Operator::Is => Func::Eq,
        Operator::Ne | Operator::IsNot => Func::Ne,
        Operator::Lt => Func::Lt,
        Operator::Le => Func::Le,
        Operator::Gt => Func::Gt,
        Operator::Ge => Func::Ge,
        Operator::Add => Func::Add,
        Operator::Sub => Func::Sub,
        Operator::Mul => Func::Mul,
        Operator::Div => Func::Div,
        Operator::Mod => Func::Mod,
        Operator::In => Func::In,
        Operator::NotIn => Func::NotIn,
        Operator::Contains => Func::Contains,
        Operator::Matches => Func::Matches,
        other => return Err(ColExprError::UnsupportedOperator(other.to_string())),
    };
    Ok(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{and_, not_, or_};
    use crate::schema::{Column, ColumnId};
    use crate::types::ColumnType;

    fn int_a() -> Column {
        Column::new("int_a", ColumnType::Int)
    }
    fn text() -> Column {
        Column::new("text", ColumnType::Text)
    }
    fn bool_a() -> Column {
        Column::new("bool_a", ColumnType::Bool)
    }
    fn col(name: &str) -> Instruction {
        Instruction::ColumnRef(ColumnId::from(name))
    }

    #[test]
    fn test_binary_emits_right_then_left() {
        let compiled = compile(&int_a().expr().lt(5), false).unwrap();
        assert_eq!(
            compiled.instructions(),
            &[Instruction::Literal(Value::Int(5)), col("int_a"), Instruction::binary(Func::Lt)]
        );
    }

    #[test]
    fn test_grouping_becomes_list_literal() {
        let compiled = compile(&int_a().expr().in_([1, 2, 3]), false).unwrap();
        assert_eq!(compiled.instructions()[0], Instruction::Literal(Value::from(vec![1, 2, 3])));
        assert_eq!(compiled.instructions()[2], Instruction::binary(Func::In));
    }

    #[test]
    fn test_grouping_rejects_non_scalars() {
        let expr = ClauseElement::Binary {
            left: Box::new(int_a().expr()),
            op: Operator::In,
            right: Box::new(ClauseElement::Grouping(vec![int_a().expr()])),
        };
        let err = compile(&expr, false).unwrap_err();
        assert!(matches!(err, ColExprError::UnsupportedExpression { shape: "Column", .. }));
    }

    #[test]
    fn test_identity_operators_map_to_equality() {
        let left = compile(&text().expr().ne(ClauseElement::Null), false).unwrap();
        let right = compile(&text().expr().is_not_null(), false).unwrap();
        assert_eq!(left, right);
        let is_null = compile(&text().expr().is_null(), false).unwrap();
        assert_eq!(is_null.instructions()[2], Instruction::binary(Func::Eq));
    }

    #[test]
    fn test_clause_list_arity() {
        let expr = and_([bool_a().expr(), int_a().expr().gt(1), text().expr().eq("x")]);
        let compiled = compile(&expr, false).unwrap();
        let last = compiled.instructions().last().unwrap();
        assert_eq!(last, &Instruction::Operator { func: Func::All, arity: 3 });
        let empty = compile(&or_([]), false).unwrap();
        assert_eq!(empty.instructions(), &[Instruction::Operator { func: Func::Any, arity: 0 }]);
    }

    #[test]
    fn test_as_boolean_is_false_emits_not() {
        let compiled = compile(&not_(bool_a()), false).unwrap();
        assert_eq!(compiled.instructions(), &[col("bool_a"), Instruction::unary(Func::Not)]);
    }

    #[test]
    fn test_as_boolean_is_true_emits_nothing() {
        let expr = ClauseElement::AsBoolean { element: bool_a(), op: Operator::IsTrue };
        let compiled = compile(&expr, false).unwrap();
        assert_eq!(compiled.instructions(), &[col("bool_a")]);
    }

    #[test]
    fn test_as_boolean_rejects_binary_operator() {
        let expr = ClauseElement::AsBoolean { element: bool_a(), op: Operator::In };
        assert!(matches!(compile(&expr, false), Err(ColExprError::UnsupportedOperator(_))));
    }

    #[test]
    fn test_force_bool_column() {
        for column in [int_a(), text()] {
            let left = compile(&column.expr(), true).unwrap();
            let right = compile(&column.expr().is_not_null(), false).unwrap();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_force_bool_negated_column() {
        for column in [int_a(), text()] {
            let left = compile(&not_(column.clone()), true).unwrap();
            let right = compile(&column.expr().is_null(), false).unwrap();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_force_bool_leaves_bool_columns() {
        assert_eq!(compile(&bool_a().expr(), true).unwrap(), compile(&bool_a().expr(), false).unwrap());
        assert_eq!(compile(&not_(bool_a()), true).unwrap(), compile(&not_(bool_a()), false).unwrap());
    }

    #[test]
    fn test_force_bool_leaves_non_bool_expressions() {
        let expr = not_(text().expr().in_(["foo", "bar"]));
        assert_eq!(compile(&expr, true).unwrap(), compile(&expr, false).unwrap());
    }

    #[test]
    fn test_force_bool_keeps_rewritten_sql() {
        let compiled = compile(&text().expr(), true).unwrap();
        assert_eq!(compiled.sql(), &text().expr().is_not_null());
        let plain = compile(&text().expr(), false).unwrap();
        assert_eq!(plain.sql(), &text().expr());
    }

    #[test]
    fn test_unsupported_operator() {
        let err = compile(&int_a().expr().op("^", int_a()), false).unwrap_err();
        assert!(matches!(err, ColExprError::UnsupportedOperator(ref op) if op == "^"));
        assert!(err.to_string().contains("Unsupported operator"));
    }

    #[test]
    fn test_unsupported_expression() {
        let expr = ClauseElement::function("exp", vec![int_a().expr(), 2.into()]);
        let err = compile(&expr, false).unwrap_err();
        assert!(matches!(err, ColExprError::UnsupportedExpression { shape: "Function", .. }));
        assert!(err.to_string().contains("Unsupported expression exp(int_a, 2)"));
    }

    #[test]
    fn test_unsupported_nested_inside_clause_list() {
        let expr = and_([bool_a().expr(), ClauseElement::function("now", vec![])]);
        assert!(compile(&expr, false).is_err());
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let expr = and_([bool_a().expr(), int_a().expr().gt(5)]);
        assert_eq!(compile(&expr, true).unwrap(), compile(&expr, true).unwrap());
        assert_ne!(compile(&bool_a().expr(), false).unwrap(), compile(&not_(bool_a()), false).unwrap());
    }
}
