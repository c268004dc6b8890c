use criterion::{black_box, criterion_group, criterion_main, Criterion};
use colexpr::*;
use std::collections::HashMap;

fn bench_compile_evaluate(c: &mut Criterion) {
    let age = Column::new("age", ColumnType::Int);
    let status = Column::new("status", ColumnType::Text);
    let nickname = Column::new("nickname", ColumnType::Text);
    let expr = and_([
        age.expr().ge(18),
        or_([status.expr().eq("active"), status.expr().eq("pending")]),
        nickname.expr(),
    ]);
    let mut values = HashMap::new();
    values.insert(age.id().clone(), Value::Int(20));
    values.insert(status.id().clone(), Value::from("pending"));
    values.insert(nickname.id().clone(), Value::Null);

    c.bench_function("compile", |b| {
        b.iter(|| {
            let _ = compile(black_box(&expr), false);
        })
    });
    c.bench_function("compile_force_bool", |b| {
        b.iter(|| {
            let _ = compile(black_box(&expr), true);
        })
    });
    let compiled = compile(&expr, true).unwrap();
    c.bench_function("evaluate", |b| {
        b.iter(|| {
            let _ = compiled.evaluate(black_box(&values));
        })
    });
}

criterion_group!(benches, bench_compile_evaluate);
criterion_main!(benches);
