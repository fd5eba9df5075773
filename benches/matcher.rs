use std::hint::black_box;
use std::path::PathBuf;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use photomatch::corpus::CorpusIndex;
use photomatch::matcher;
use rand::prelude::*;

fn random_index(n: usize, dim: usize) -> CorpusIndex {
    let mut rng = rand::rng();
    let embeddings = Array2::from_shape_fn((n, dim), |_| rng.random::<f32>());
    let paths = (0..n).map(|i| PathBuf::from(format!("{i:04}.jpg"))).collect();
    CorpusIndex::from_parts(embeddings, paths)
}

fn bench_best_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("best_match");
    let mut rng = rand::rng();
    let dim = 512;
    let query = Array1::from_shape_fn(dim, |_| rng.random::<f32>());

    for n in [16, 64, 256] {
        let index = random_index(n, dim);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("{n}x{dim}"), |b| {
            b.iter(|| matcher::best_match(black_box(query.view()), &index).unwrap());
        });
    }
    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut rng = rand::rng();
    let dim = 512;
    let query = Array1::from_shape_fn(dim, |_| rng.random::<f32>());
    let index = random_index(256, dim);

    c.bench_function("rank_256x512", |b| {
        b.iter(|| matcher::rank(black_box(query.view()), &index).unwrap());
    });
}

criterion_group!(benches, bench_best_match, bench_rank);
criterion_main!(benches);
