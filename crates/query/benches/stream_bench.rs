//! Benchmarks for quarry-query index streams using criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quarry_core::{NodeId, ShardMatchSet};
use quarry_query::stream::{drain, remove_overlapping, BoxedStream, Intersection, LeafStream, Union};

/// Builds a leaf over `shards` shards, keeping every `step`-th shard, with
/// `uids` uids per shard offset by `offset`.
fn leaf(node: u32, shards: usize, step: usize, uids: usize, offset: usize) -> BoxedStream<'static> {
    let node = Some(NodeId::new(node));
    let sets = (0..shards)
        .step_by(step)
        .map(|s| {
            let ids = (0..uids).map(|u| format!("u{:06}", u * 2 + offset));
            ShardMatchSet::from_uids(format!("{:08}_{}", 20150101 + s / 10, s % 10), node, ids)
        })
        .collect();
    Box::new(LeafStream::new(node, sets).unwrap())
}

fn intersection_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersection");

    for shards in [100, 1000, 5000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(shards), shards, |b, &shards| {
            b.iter(|| {
                let children = vec![
                    leaf(0, shards, 1, 50, 0),
                    leaf(1, shards, 2, 50, 1),
                    leaf(2, shards, 3, 50, 0),
                ];
                let mut and = Intersection::new(None, children).unwrap();
                black_box(drain(&mut and).unwrap())
            });
        });
    }

    group.finish();
}

fn union_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");

    for shards in [100, 1000, 5000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(shards), shards, |b, &shards| {
            b.iter(|| {
                let children = vec![
                    leaf(0, shards, 1, 20, 0),
                    leaf(1, shards, 2, 20, 1),
                    leaf(2, shards, 3, 20, 0),
                ];
                let mut or = Union::new(None, children).unwrap();
                black_box(drain(&mut or).unwrap())
            });
        });
    }

    group.finish();
}

fn ancestor_dedup_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ancestor_dedup");

    for roots in [10, 100, 500].iter() {
        let node = Some(NodeId::new(0));
        let uids: Vec<String> = (0..*roots)
            .flat_map(|r| {
                let root = format!("r{r:04}");
                (0..5)
                    .map(move |c| format!("{root}.{c}"))
                    .chain(std::iter::once(format!("r{r:04}")))
            })
            .collect();
        let set = ShardMatchSet::from_uids("20150101_0", node, uids.iter().map(String::as_str));

        group.bench_with_input(BenchmarkId::from_parameter(roots), &set, |b, set| {
            b.iter(|| black_box(remove_overlapping(set)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    intersection_benchmark,
    union_benchmark,
    ancestor_dedup_benchmark
);
criterion_main!(benches);
