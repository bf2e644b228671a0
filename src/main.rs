//! Benchmark runner for the tiled GEMM configurations.
//!
//! Usage: `tiled-gemm [size ...]` (default sizes: 256 512 1024)

use std::time::Instant;
use tiled_gemm::{
    Accumulation, Executor, GemmConfig, Result, TileLevels, matmul_naive_ijk, multiply,
};

const ITERATIONS: usize = 3;
const A_VALUE: f32 = 1.0;
const B_VALUE: f32 = 2.0;

fn main() {
    let sizes = parse_sizes();

    println!("=== Tiled GEMM Benchmark ===\n");

    let base = GemmConfig::default();
    println!(
        "Workers: {}, CPU Features: AVX2={}, FMA={}\n",
        base.workers,
        has_feature("avx2"),
        has_feature("fma")
    );

    let configs = [
        ("1-level T=64", base.with_tiles(TileLevels::SINGLE)),
        ("1-level T=128", base.with_tiles(TileLevels::OMP)),
        ("3-level 512/128/64", base),
        ("3-level + B^T", base.with_transpose_b(true)),
        (
            "3-level + B^T w8",
            base.with_transpose_b(true).with_reduction_width(8),
        ),
        (
            "k-split atomic",
            base.with_accumulation(Accumulation::Atomic),
        ),
        ("rayon rows", base.with_executor(Executor::Rayon)),
        (
            "rayon tiles atomic",
            base.with_executor(Executor::Rayon)
                .with_accumulation(Accumulation::Atomic),
        ),
    ];

    for &n in &sizes {
        println!("Matrix: {}×{}", n, n);
        println!("{}", "-".repeat(60));

        let a = vec![A_VALUE; n * n];
        let b = vec![B_VALUE; n * n];
        let expected = A_VALUE * B_VALUE * n as f32;

        let mut results = Vec::new();
        if n <= 1024 {
            results.push((
                "Naive (i-j-k)",
                bench_fn(n, |c| {
                    matmul_naive_ijk(&a, &b, c, n);
                    Ok(())
                }),
            ));
        }
        for (name, config) in &configs {
            results.push((*name, bench_checked(n, &a, &b, config, expected)));
        }

        let baseline = results.iter().find_map(|(_, r)| r.as_ref().ok().copied());
        for (i, (name, result)) in results.iter().enumerate() {
            match result {
                Ok((time_ms, gflops)) => {
                    let speedup = baseline.map_or(1.0, |(base_ms, _)| base_ms / time_ms);
                    println!(
                        "{}. {:20} {:9.2} ms  {:7.2} GFLOPS  ({:.1}×)",
                        i + 1,
                        name,
                        time_ms,
                        gflops,
                        speedup
                    );
                }
                Err(e) => println!("{}. {:20} failed: {}", i + 1, name, e),
            }
        }
        println!();
    }
}

fn parse_sizes() -> Vec<usize> {
    let sizes: Vec<usize> = std::env::args()
        .skip(1)
        .filter_map(|arg| match arg.parse() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                eprintln!("ignoring invalid size {arg:?}");
                None
            }
        })
        .collect();

    if sizes.is_empty() {
        vec![256, 512, 1024]
    } else {
        sizes
    }
}

/// Runs one configuration and checks every cell against the closed form.
fn bench_checked(
    n: usize,
    a: &[f32],
    b: &[f32],
    config: &GemmConfig,
    expected: f32,
) -> Result<(f64, f64)> {
    let timing = bench_fn(n, |c| multiply(a, b, c, n, config))?;

    let mut c = vec![0.0; n * n];
    multiply(a, b, &mut c, n, config)?;
    if let Some(bad) = c.iter().position(|&x| x != expected) {
        eprintln!(
            "  wrong result at ({}, {}): expected {}, got {}",
            bad / n,
            bad % n,
            expected,
            c[bad]
        );
    }

    Ok(timing)
}

/// Average wall time in ms and GFLOPS over `ITERATIONS` runs after one warmup.
fn bench_fn<F>(n: usize, f: F) -> Result<(f64, f64)>
where
    F: Fn(&mut [f32]) -> Result<()>,
{
    // Warmup
    let mut c = vec![0.0; n * n];
    f(&mut c)?;

    // Timed runs
    let mut total = 0.0;
    for _ in 0..ITERATIONS {
        let mut c = vec![0.0; n * n];
        let start = Instant::now();
        f(&mut c)?;
        total += start.elapsed().as_secs_f64();
    }

    let avg = total / ITERATIONS as f64;
    let gflops = 2.0 * (n * n * n) as f64 / avg / 1e9;
    Ok((avg * 1000.0, gflops))
}

fn has_feature(name: &str) -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        match name {
            "avx2" => is_x86_feature_detected!("avx2"),
            "fma" => is_x86_feature_detected!("fma"),
            _ => false,
        }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = name;
        false
    }
}
