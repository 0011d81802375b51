//! Benchmarks comparing SpMV execution backends on the power method

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use powerbench::{backend, BackendKind, SparseMatrix};

const GRID: usize = 200; // 40_000 rows, ~199k nonzeros
const ITERATIONS: usize = 10;

fn bench_backend(c: &mut Criterion, name: &str, kind: BackendKind) {
    let threads = num_cpus::get();
    let partitions = threads;

    let mut mat = backend::select::<f64>(kind, threads).unwrap();
    mat.load_poisson(GRID, GRID, partitions).unwrap();

    let size = GRID * GRID;
    let mut x = vec![1.0; size];
    let mut y = vec![0.0; size];

    c.bench_function(name, |bench| {
        bench.iter(|| {
            x.fill(1.0);
            mat.power_iteration(black_box(&mut x), black_box(&mut y), ITERATIONS)
                .unwrap();
        })
    });
}

fn bench_power_method(c: &mut Criterion) {
    bench_backend(c, "sequential", BackendKind::Sequential);
    bench_backend(c, "thread_pool", BackendKind::ThreadPool);
    bench_backend(c, "thread_pool_pinned", BackendKind::ThreadPoolPinned);
    bench_backend(c, "dataflow_graph", BackendKind::DataflowGraph);
    bench_backend(c, "dataflow_graph_pinned", BackendKind::DataflowGraphPinned);
}

criterion_group!(benches, bench_power_method);
criterion_main!(benches);
