use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kgls::abort::AbortConditions;
use kgls::config::RunParameters;
use kgls::io;
use kgls::solver::Solver;

fn code(_unused: usize) {
    let instance = io::load_instance("instances/X-n101-k25.vrp").expect("failed to load benchmark instance");

    let mut abort_conditions = AbortConditions::new();
    abort_conditions.set("max_iterations", 500).unwrap();

    let solver = Solver::new(&instance.problem, RunParameters::default(), abort_conditions);
    solver.run();
}

pub fn bench(c: &mut Criterion) {
    c.bench_function("kgls", |b| b.iter(|| code(black_box(0))));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(50).measurement_time(Duration::from_secs(60));
    targets = bench
}
criterion_main!(benches);
