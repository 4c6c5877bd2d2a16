//! Benchmarks for the evaluator and a full engine turn.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use message_agent::calc;
use message_agent::engine::{Engine, EngineConfig};

fn bench_evaluate(c: &mut Criterion) {
    c.bench_function("evaluate_nested", |bench| {
        bench.iter(|| {
            black_box(calc::evaluate(black_box("((1 + 2) * 3 - 4 / 5) ** 2 // 7 % 3")).unwrap())
        })
    });
}

fn bench_read_only_turn(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let mut engine = Engine::new(EngineConfig::new(dir.path().join("memory.json")));

    // `calc` falls after several built-ins, so this covers predicate scanning too.
    c.bench_function("turn_calc", |bench| {
        bench.iter(|| black_box(engine.process_turn(black_box("calc 2 * (3 + 4)"))))
    });
    c.bench_function("turn_fallback", |bench| {
        bench.iter(|| black_box(engine.process_turn(black_box("something nobody handles"))))
    });
}

fn bench_mutating_turn(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let mut engine = Engine::new(EngineConfig::new(dir.path().join("memory.json")));

    c.bench_function("turn_note_with_save", |bench| {
        bench.iter(|| black_box(engine.process_turn("note benchmark entry")))
    });
}

criterion_group!(benches, bench_evaluate, bench_read_only_turn, bench_mutating_turn);
criterion_main!(benches);
