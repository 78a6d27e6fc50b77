//! Benchmarks for row materialization throughput.
//!
//! Measures the hot paths of the engine:
//! - Entity population over a pre-built in-memory cursor
//! - Scalar streaming with lazy converter resolution
//! - First-access type description construction

extern crate rowcast;

use criterion::{criterion_group, criterion_main, Criterion};
use rowcast::{entity, prelude::*};
use std::hint::black_box;

entity! {
    pub struct OrderLine {
        order_id: i32,
        product_id: i32,
        quantity: i32,
        unit_price: f64,
        note: Option<String>,
    }
}

fn order_line_cursor(rows: usize) -> MemoryCursor {
    let mut cursor = MemoryCursor::new(vec![
        ("order_id".to_string(), CellKind::I32),
        ("product_id".to_string(), CellKind::I32),
        ("quantity".to_string(), CellKind::I32),
        ("unit_price".to_string(), CellKind::F64),
        ("note".to_string(), CellKind::String),
    ]);
    for index in 0..rows {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let id = index as i32;
        let note = if index % 10 == 0 {
            CellValue::String(format!("line-{index}"))
        } else {
            CellValue::Null
        };
        cursor = cursor.with_row(vec![
            CellValue::I32(id),
            CellValue::I32(id % 500),
            CellValue::I32(1 + id % 9),
            CellValue::F64(f64::from(id % 100) * 1.25),
            note,
        ]);
    }
    cursor
}

/// Benchmark materializing 10k rows into entities through a shared engine.
fn bench_fetch_all_10k(c: &mut Criterion) {
    let engine = Materializer::new();
    // Warm the cache so the measurement covers steady-state population
    let mut warmup = order_line_cursor(1);
    let _: Vec<OrderLine> = engine.fetch_all(&mut warmup, 1).unwrap();

    c.bench_function("materialize_fetch_all_10k", |b| {
        b.iter(|| {
            let mut cursor = order_line_cursor(10_000);
            let lines: Vec<OrderLine> = engine.fetch_all(black_box(&mut cursor), 10_000).unwrap();
            black_box(lines)
        });
    });
}

/// Benchmark streaming 10k scalars with a kind conversion on every cell.
fn bench_scalar_stream_10k(c: &mut Criterion) {
    let engine = Materializer::new();

    c.bench_function("materialize_scalars_10k", |b| {
        b.iter(|| {
            let mut cursor = MemoryCursor::new(vec![("Total".to_string(), CellKind::I64)])
                .with_rows((0..10_000).map(|index| vec![CellValue::I64(index)]));
            let totals: Vec<i32> = engine
                .scalars(black_box(&mut cursor), NullPolicy::Omit)
                .unwrap();
            black_box(totals)
        });
    });
}

/// Benchmark cold description construction against cached access.
fn bench_describe_first_access(c: &mut Criterion) {
    c.bench_function("registry_describe_cold", |b| {
        b.iter(|| {
            let registry = TypeRegistry::new();
            black_box(registry.describe::<OrderLine>())
        });
    });

    let registry = TypeRegistry::new();
    registry.describe::<OrderLine>();
    c.bench_function("registry_describe_cached", |b| {
        b.iter(|| black_box(registry.describe::<OrderLine>()));
    });
}

criterion_group!(
    benches,
    bench_fetch_all_10k,
    bench_scalar_stream_10k,
    bench_describe_first_access
);
criterion_main!(benches);
