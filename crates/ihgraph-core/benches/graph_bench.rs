//! # Graph Benchmarks
//!
//! Performance benchmarks for ihgraph-core rewriting operations.
//!
//! Run with: `cargo bench -p ihgraph-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ihgraph_core::{EdgeType, IHGraph, graph_from_json, graph_to_json};
use std::hint::black_box;

/// Chain of `size` leaves whose links cycle through three edge types of
/// decreasing priority, so induction folds several levels.
fn create_layered_chain(size: usize) -> IHGraph {
    let mut graph = IHGraph::new("chain");
    let types = [
        graph.create_edge_type(EdgeType::new("A", 3)),
        graph.create_edge_type(EdgeType::new("B", 2)),
        graph.create_edge_type(EdgeType::new("C", 1)),
    ];
    let mut previous = graph.create_leaf("n0");
    for i in 1..size {
        let next = graph.create_leaf(format!("n{}", i));
        let ty = types[(i / 4) % types.len()];
        graph.create_edge(previous, next, ty).expect("edge");
        previous = next;
    }
    graph
}

/// Every spoke points at one hub through a single immediate type.
fn create_star_graph(size: usize) -> IHGraph {
    let mut graph = IHGraph::new("star");
    let ty = graph.create_edge_type(EdgeType::new("test", 0).with_immediate(true));
    let hub = graph.create_leaf("hub");
    for i in 1..size {
        let spoke = graph.create_leaf(format!("spoke{}", i));
        graph.create_edge(spoke, hub, ty).expect("edge");
    }
    graph
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_deep_clone(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_clone");

    for size in [100, 1000].iter() {
        let graph = create_layered_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(graph.deep_clone()));
        });
    }

    group.finish();
}

fn bench_induce(c: &mut Criterion) {
    let mut group = c.benchmark_group("induce");

    for size in [20, 60].iter() {
        let graph = create_layered_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(graph.induce()));
        });
    }

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for size in [20, 60].iter() {
        let induced = create_layered_chain(*size)
            .induce()
            .expect("induce should converge");
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(induced.flatten()));
        });
    }

    group.finish();
}

fn bench_immediate_cliques(c: &mut Criterion) {
    let mut group = c.benchmark_group("immediate_cliques");

    for size in [100, 500].iter() {
        let graph = create_star_graph(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(graph.immediate_cliques()));
        });
    }

    group.finish();
}

fn bench_json_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_round_trip");

    for size in [100, 1000].iter() {
        let graph = create_layered_chain(*size);
        let json = graph_to_json(&graph, true).expect("export");
        group.bench_with_input(BenchmarkId::new("export", size), size, |b, _| {
            b.iter(|| black_box(graph_to_json(&graph, true)));
        });
        group.bench_with_input(BenchmarkId::new("import", size), &json, |b, json| {
            b.iter(|| black_box(graph_from_json(json)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_deep_clone,
    bench_induce,
    bench_flatten,
    bench_immediate_cliques,
    bench_json_round_trip
);
criterion_main!(benches);
