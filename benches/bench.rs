//! Criterion benchmarks for the boolean query algebra.
//!
//! Covers the composite iterators over random posting lists and full
//! searches through the filter layer:
//! - Heap and small disjunctions
//! - Min-match disjunctions
//! - Conjunctions with and without cost ordering
//! - End to end searches over an in-memory index

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sarissa_query::index::memory::{MemoryIndex, MemorySegment};
use sarissa_query::index::reader::Postings;
use sarissa_query::query::iterator::{DocId, DocIterator, PostingIterator};
use sarissa_query::query::*;
use sarissa_query::searcher::Searcher;

const MAX_DOC: DocId = 100_000;

/// Generate sorted posting lists with the given densities.
fn generate_postings(densities: &[f64], seed: u64) -> Vec<Arc<Postings>> {
    let mut rng = StdRng::seed_from_u64(seed);
    densities
        .iter()
        .map(|&density| {
            let docs: Vec<DocId> = (1..=MAX_DOC)
                .filter(|_| rng.random_bool(density))
                .collect();
            Arc::new(Postings::from_docs(&docs).unwrap())
        })
        .collect()
}

fn branches(postings: &[Arc<Postings>]) -> Vec<Box<dyn DocIterator>> {
    postings
        .iter()
        .map(|postings| Box::new(PostingIterator::new(Arc::clone(postings))) as Box<dyn DocIterator>)
        .collect()
}

fn drain(mut it: Box<dyn DocIterator>) -> usize {
    let mut count = 0;
    while it.next() {
        count += 1;
    }
    count
}

/// Benchmark unions of many posting lists.
fn bench_disjunction(c: &mut Criterion) {
    let mut group = c.benchmark_group("disjunction");
    let order = PreparedOrder::unordered();
    let config = QueryConfig::default();

    for count in [2, 4, 16] {
        let postings = generate_postings(&vec![0.05; count], 42);
        let total: usize = postings.iter().map(|p| p.len()).sum();
        group.throughput(Throughput::Elements(total as u64));

        group.bench_function(format!("union_{count}"), |b| {
            b.iter(|| {
                let it = make_disjunction(branches(&postings), &order, &config).unwrap();
                black_box(drain(it))
            })
        });
    }

    let postings = generate_postings(&[0.05; 4], 7);
    group.bench_function("heap_union_4", |b| {
        b.iter(|| {
            let it = Disjunction::new(branches(&postings), Arc::clone(&order)).unwrap();
            black_box(drain(Box::new(it)))
        })
    });

    group.finish();
}

/// Benchmark min-match unions.
fn bench_min_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("min_match");
    let order = PreparedOrder::unordered();
    let postings = generate_postings(&[0.2, 0.1, 0.05, 0.3, 0.15, 0.1], 11);

    for min_match in [2, 3, 5] {
        group.bench_function(format!("min_match_{min_match}_of_6"), |b| {
            b.iter(|| {
                let it =
                    MinMatchDisjunction::new(branches(&postings), min_match, Arc::clone(&order))
                        .unwrap();
                black_box(drain(Box::new(it)))
            })
        });
    }

    group.finish();
}

/// Benchmark intersections of dense and sparse lists.
fn bench_conjunction(c: &mut Criterion) {
    let mut group = c.benchmark_group("conjunction");
    let order = PreparedOrder::unordered();
    let postings = generate_postings(&[0.5, 0.3, 0.01], 23);

    for sorted in [true, false] {
        group.bench_function(format!("intersect_sorted_{sorted}"), |b| {
            b.iter(|| {
                let it = Conjunction::new(branches(&postings), Arc::clone(&order))
                    .unwrap()
                    .sort_by_cost(sorted);
                black_box(drain(Box::new(it)))
            })
        });
    }

    group.finish();
}

/// Benchmark searches through the filter layer.
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(20);

    let words = ["rust", "search", "engine", "query", "index", "boolean", "term"];
    let mut rng = StdRng::seed_from_u64(99);
    let mut builder = MemorySegment::builder();
    for _ in 0..10_000 {
        let text: Vec<&str> = (0..8)
            .map(|_| words[rng.random_range(0..words.len())])
            .collect();
        builder.add_document([("body", text.join(" "))]);
    }
    let searcher = Searcher::new(Box::new(MemoryIndex::new(vec![builder.build().unwrap()])));

    let filter = And::new()
        .add(Box::new(
            Or::new()
                .add(Box::new(TermFilter::new("body", "rust")))
                .add(Box::new(TermFilter::new("body", "search").with_boost(2.0)))
                .add(Box::new(TermFilter::new("body", "engine"))),
        ))
        .add(Box::new(Not::new(Box::new(TermFilter::new("body", "boolean")))));
    let order = Order::new().add(BoostSort);

    group.bench_function("top_10_by_boost", |b| {
        b.iter(|| black_box(searcher.search(&filter, &order, 10).unwrap()))
    });
    group.bench_function("count", |b| {
        b.iter(|| black_box(searcher.count(&filter).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_disjunction,
    bench_min_match,
    bench_conjunction,
    bench_search
);

criterion_main!(benches);
