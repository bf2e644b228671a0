//! Cache-blocked, thread-parallel dense matrix multiplication.
//!
//! Computes C += A·B for square row-major matrices. The O(n³) work is cut
//! into tiles sized for one to three cache levels, the tiles are spread
//! over worker threads, and each partial dot product is merged into C
//! under one of two disciplines: row-owned bands with plain adds, or a
//! shared C with atomic adds.
//!
//! ## Usage
//!
//! ```
//! use tiled_gemm::{GemmConfig, multiply};
//!
//! let n = 256;
//! let a = vec![1.0f32; n * n];
//! let b = vec![2.0f32; n * n];
//! let mut c = vec![0.0f32; n * n];
//!
//! multiply(&a, &b, &mut c, n, &GemmConfig::default()).unwrap();
//! assert!(c.iter().all(|&x| x == 2.0 * n as f32));
//! ```
//!
//! Tiling, threading and the inner reduction are all runtime knobs:
//!
//! ```
//! use tiled_gemm::{Accumulation, Executor, GemmConfig, Matrix, TileLevels, multiply_matrices};
//!
//! let config = GemmConfig::default()
//!     .with_workers(4)
//!     .with_tiles(TileLevels::new(&[128, 32, 8]).unwrap())
//!     .with_transpose_b(true)
//!     .with_reduction_width(8)
//!     .with_executor(Executor::Rayon)
//!     .with_accumulation(Accumulation::Atomic);
//!
//! let a = Matrix::<f64>::identity(100);
//! let b = Matrix::from_fn(100, |r, c| (r + c) as f64);
//! let mut c = Matrix::zeros(100);
//!
//! multiply_matrices(&a, &b, &mut c, &config).unwrap();
//! assert_eq!(c, b);
//! ```
//!
//! ## What's inside
//!
//! - One-, two- or three-level i/j/k tiling with clipped boundary tiles
//! - Static row-band partitioning on scoped threads, or rayon fan-out
//! - Row-owned or atomic accumulation
//! - Optional B pre-transpose and grouped (vectorizable) reductions,
//!   with an AVX2 + FMA path for `f32`/`f64`

pub mod blocked;
pub mod config;
pub mod error;
pub mod kernels;
pub mod matrix;
pub mod threaded;

pub use config::{Accumulation, Executor, GemmConfig, TileLevels};
pub use error::{GemmError, Result};
pub use matrix::naive_ijk::matmul_naive_ijk;
pub use matrix::{Element, Matrix};
pub use threaded::{GemmPlan, ParallelAxis};

/// Matrix multiply: C += A * B
///
/// All three buffers are n×n row-major. C is accumulated into, so pass a
/// zeroed C for a plain product. The call returns once every worker has
/// finished.
///
/// # Errors
///
/// Fails without touching C if `n` is zero, the configuration is invalid
/// or a buffer length is not n×n.
pub fn multiply<T: Element>(
    a: &[T],
    b: &[T],
    c: &mut [T],
    n: usize,
    config: &GemmConfig,
) -> Result<()> {
    GemmPlan::new(n, config)?.execute(a, b, c)
}

/// Same as [`multiply`] for [`Matrix`] values of equal dimension.
pub fn multiply_matrices<T: Element>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    c: &mut Matrix<T>,
    config: &GemmConfig,
) -> Result<()> {
    let n = a.n();
    for (name, other) in [("B", b.n()), ("C", c.n())] {
        if other != n {
            return Err(GemmError::BufferSize {
                name,
                n,
                expected: n * n,
                got: other * other,
            });
        }
    }
    multiply(a.as_slice(), b.as_slice(), c.as_mut_slice(), n, config)
}
