use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use supercoil::search::{search, ParameterSpace, Pipeline, Strategy};

fn bench_search(c: &mut Criterion) {
    let space = ParameterSpace::default();
    let pipeline = Pipeline::new(0.01);
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    group.bench_function("grid_27", |b| {
        b.iter(|| black_box(search(&space, &Strategy::Grid, &pipeline, None).unwrap()))
    });
    let random = Strategy::Random {
        samples: 64,
        seed: 1,
    };
    group.bench_function("random_64", |b| {
        b.iter(|| black_box(search(&space, &random, &pipeline, None).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
