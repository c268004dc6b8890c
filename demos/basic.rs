use colexpr::*;

fn main() -> Result<()> {
    // 1. Define schema
    let schema = TableSchemaBuilder::new("account")
        .column("age", ColumnType::Int)
        .column("status", ColumnType::Text)
        .column("nickname", ColumnType::Text)
        .build();
    let age = schema.column("age").cloned().ok_or_else(|| ColExprError::ColumnNotFound("age".into()))?;
    let status = schema.column("status").cloned().ok_or_else(|| ColExprError::ColumnNotFound("status".into()))?;
    let nickname = schema.column("nickname").cloned().ok_or_else(|| ColExprError::ColumnNotFound("nickname".into()))?;

    // 2. Build the predicate
    let expr = and_([
        age.expr().ge(18),
        or_([status.expr().eq("active"), status.expr().eq("pending")]),
        nickname.expr(),
    ]);
    println!("Expression: {}", expr);

    // 3. Compile once, with boolean coercion for the bare nickname column
    let compiled = compile(&expr, true)?;
    println!("Coerced: {}", compiled.sql());
    for instruction in compiled.instructions() {
        println!("  {}", instruction);
    }

    // 4. Evaluate against candidate rows
    let mut row = Row::new();
    row.set("age", 20, &schema)?;
    row.set("status", "pending", &schema)?;
    row.set("nickname", Value::Null, &schema)?;
    println!("Without nickname: {}", compiled.evaluate(&row)?);
    row.set("nickname", "zed", &schema)?;
    println!("With nickname: {}", compiled.evaluate(&row)?);

    // 5. Derived flag backed by a single column
    let has_nickname = column_flag(&nickname.expr(), Some(FlagDefault::from(Value::from("anonymous"))))?;
    has_nickname.set(&mut row, &Value::Bool(false))?;
    println!("has_nickname after clearing: {}", has_nickname.get(&row)?);
    Ok(())
}
