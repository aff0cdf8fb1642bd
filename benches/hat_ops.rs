use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hatvec::hat::{DoublingHat, FixedHat};

const COUNT: usize = 10_000;

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_10k");

    group.bench_function("vec", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for i in 0..COUNT {
                vec.push(black_box(i));
            }
            vec
        })
    });

    group.bench_function("hat_doubling", |b| {
        b.iter(|| {
            let mut hat: DoublingHat<usize> = DoublingHat::new();
            for i in 0..COUNT {
                hat.push(black_box(i));
            }
            hat
        })
    });

    group.bench_function("hat_fixed_6", |b| {
        b.iter(|| {
            let mut hat: FixedHat<usize, 6> = FixedHat::new();
            for i in 0..COUNT {
                hat.push(black_box(i));
            }
            hat
        })
    });

    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_sum_10k");

    let vec: Vec<usize> = (0..COUNT).collect();
    let doubling: DoublingHat<usize> = (0..COUNT).collect();
    let fixed: FixedHat<usize, 6> = (0..COUNT).collect();

    group.bench_function("vec", |b| {
        b.iter(|| {
            let mut total = 0;
            for i in 0..COUNT {
                total += vec[black_box(i)];
            }
            total
        })
    });

    group.bench_function("hat_doubling", |b| {
        b.iter(|| {
            let mut total = 0;
            for i in 0..COUNT {
                total += doubling[black_box(i)];
            }
            total
        })
    });

    group.bench_function("hat_fixed_6", |b| {
        b.iter(|| {
            let mut total = 0;
            for i in 0..COUNT {
                total += fixed[black_box(i)];
            }
            total
        })
    });

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate_10k");

    let vec: Vec<usize> = (0..COUNT).collect();
    let doubling: DoublingHat<usize> = (0..COUNT).collect();

    group.bench_function("vec", |b| b.iter(|| vec.iter().sum::<usize>()));

    group.bench_function("hat_doubling", |b| b.iter(|| doubling.iter().sum::<usize>()));

    group.finish();
}

fn bench_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");

    group.bench_function("hat_doubling", |b| {
        let mut rng = StdRng::seed_from_u64(42);

        b.iter(|| {
            let mut hat: DoublingHat<u64> = DoublingHat::new();

            for _ in 0..COUNT {
                if hat.is_empty() || rng.gen_bool(0.7) {
                    hat.push(rng.gen());
                } else {
                    black_box(hat.pop());
                }
            }

            hat
        })
    });

    group.finish();
}

criterion_group!(benches, bench_push, bench_index, bench_iterate, bench_mixed);
criterion_main!(benches);
