//! Criterion benchmarks for the tiling / threading / accumulation variants.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tiled_gemm::{Accumulation, Executor, GemmConfig, TileLevels, multiply};

fn variants() -> Vec<(&'static str, GemmConfig)> {
    let base = GemmConfig::default();
    vec![
        ("single_64", base.with_tiles(TileLevels::SINGLE)),
        ("three_level", base),
        ("three_level_bt_w8", base.with_transpose_b(true).with_reduction_width(8)),
        ("k_split_atomic", base.with_accumulation(Accumulation::Atomic)),
        ("rayon_rows", base.with_executor(Executor::Rayon)),
        (
            "rayon_tiles_atomic",
            base.with_executor(Executor::Rayon)
                .with_accumulation(Accumulation::Atomic),
        ),
    ]
}

fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm_f32");
    group.sample_size(10);

    for n in [128usize, 256, 512] {
        let a: Vec<f32> = (0..n * n).map(|i| ((i % 1000) as f32) * 0.01).collect();
        let b: Vec<f32> = (0..n * n).map(|i| (((i + 500) % 1000) as f32) * 0.01).collect();

        group.throughput(Throughput::Elements((2 * n * n * n) as u64));

        for (name, config) in variants() {
            group.bench_with_input(BenchmarkId::new(name, n), &n, |bench, &n| {
                let mut out = vec![0.0f32; n * n];
                bench.iter(|| {
                    out.fill(0.0);
                    multiply(black_box(&a), black_box(&b), &mut out, n, &config).unwrap();
                    black_box(&out);
                });
            });
        }
    }

    group.finish();
}

fn bench_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm_f64_workers");
    group.sample_size(10);

    let n = 512;
    let a = vec![1.0f64; n * n];
    let b = vec![2.0f64; n * n];

    for workers in [1usize, 2, 4, 8] {
        let config = GemmConfig::default().with_workers(workers);
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |bench, _| {
            let mut out = vec![0.0f64; n * n];
            bench.iter(|| {
                out.fill(0.0);
                multiply(&a, &b, &mut out, n, &config).unwrap();
                black_box(&out);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_variants, bench_workers);
criterion_main!(benches);
