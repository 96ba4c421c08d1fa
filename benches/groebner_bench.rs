//! Benchmarks for the Gröbner basis engine.
//!
//! Includes:
//! - Classical Buchberger with the queue-based reducers
//! - The matrix-based F4 reducer
//! - Divisor lookup implementations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quartus::prelude::*;
use quartus::groebner::config::ReducerKind;
use quartus::groebner::io::parse_ideal;
use quartus::poly::LookupKind;

// Cyclic-ish degree-two system over GF(101).
const CYCLE: &str = "101 3 4\n3\nx0^2 - x1\nx0*x1 - x2\nx1*x2 - x0\n";

// Boolean generators in six variables; every pair is coprime.
const BOOLEAN: &str = "101 6 4\n6\nx0^2 - x0\nx1^2 - x1\nx2^2 - x2\nx3^2 - x3\nx4^2 - x4\nx5^2 - x5\n";

fn compute(text: &str, config: GbConfig) -> usize {
    let parsed = parse_ideal(text).unwrap();
    let mut gb = ClassicalGb::new(parsed.monoid, parsed.field, config);
    for g in parsed.generators {
        gb.add_generator(g).unwrap();
    }
    gb.compute().unwrap();
    gb.into_reduced_basis().unwrap().len()
}

/// Benchmark the reducer variants on the same input.
fn bench_reducers(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducers");
    for reducer in [
        ReducerKind::Heap,
        ReducerKind::Tournament,
        ReducerKind::Geobucket,
        ReducerKind::Pairing,
        ReducerKind::F4,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{reducer:?}")),
            &reducer,
            |b, &reducer| {
                let config = GbConfig {
                    reducer,
                    ..GbConfig::default()
                };
                b.iter(|| black_box(compute(CYCLE, config.clone())))
            },
        );
    }
    group.finish();
}

/// Benchmark the divisor lookup implementations.
fn bench_divisor_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("divisor_lookup");
    for lookup in [LookupKind::DivList, LookupKind::KdTree] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{lookup:?}")),
            &lookup,
            |b, &lookup| {
                let config = GbConfig {
                    divisor_lookup: lookup,
                    ..GbConfig::default()
                };
                b.iter(|| black_box(compute(BOOLEAN, config.clone())))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_reducers, bench_divisor_lookup);
criterion_main!(benches);
