//! A validated, partitioned multiply ready to run.

use crate::blocked::worker::Operands;
use crate::config::{Accumulation, Executor, GemmConfig};
use crate::error::{GemmError, Result};
use crate::kernels::{BLayout, InnerKernel};
use crate::matrix::element::Element;
use crate::threaded::fanout::{build_pool, fan_out_row_bands, fan_out_tiles, fan_out_transpose};
use crate::threaded::partition::{WorkChunk, partition};
use crate::threaded::pool::{run_k_bands, run_row_bands, run_transpose};
use log::debug;

/// Which index axis is divided among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelAxis {
    /// Output rows: each worker owns a band of C.
    Rows,
    /// The reduction axis: workers share every cell of C.
    K,
    /// Outer (i, j, k) tiles scheduled dynamically.
    OuterTiles,
}

/// Configuration checked and work partitioned; nothing has run yet.
///
/// [`GemmPlan::execute`] launches every worker and returns only after all
/// of them have been joined. A plan can be executed any number of times.
#[derive(Debug, Clone)]
pub struct GemmPlan {
    n: usize,
    config: GemmConfig,
    axis: ParallelAxis,
    chunks: Vec<WorkChunk>,
}

impl GemmPlan {
    pub fn new(n: usize, config: &GemmConfig) -> Result<Self> {
        if n == 0 {
            return Err(GemmError::InvalidDimension(n));
        }
        config.validate()?;

        let axis = match (config.executor, config.accumulation) {
            (Executor::Threads, Accumulation::RowOwned) => ParallelAxis::Rows,
            (Executor::Threads, Accumulation::Atomic) => ParallelAxis::K,
            (Executor::Rayon, Accumulation::RowOwned) => ParallelAxis::Rows,
            (Executor::Rayon, Accumulation::Atomic) => ParallelAxis::OuterTiles,
        };

        // The rayon executor hands out tiles dynamically, so only the
        // thread pool gets a static partition.
        let chunks = match config.executor {
            Executor::Threads => partition(n, config.workers)?,
            Executor::Rayon => Vec::new(),
        };

        Ok(Self {
            n,
            config: *config,
            axis,
            chunks,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn config(&self) -> &GemmConfig {
        &self.config
    }

    pub fn axis(&self) -> ParallelAxis {
        self.axis
    }

    /// Static chunks, one per worker. Empty for the rayon executor.
    pub fn chunks(&self) -> &[WorkChunk] {
        &self.chunks
    }

    /// C += A·B.
    ///
    /// Buffers are checked before anything runs. On error after workers
    /// have started (spawn failure or a worker panic) the contents of C are
    /// unspecified.
    pub fn execute<T: Element>(&self, a: &[T], b: &[T], c: &mut [T]) -> Result<()> {
        let n = self.n;
        check_len("A", a.len(), n)?;
        check_len("B", b.len(), n)?;
        check_len("C", c.len(), n)?;

        let config = &self.config;
        let kernel = InnerKernel::new::<T>(config.reduction_width);

        debug!(
            "GEMM dispatch: n={}, workers={}, tiles={:?}, executor={:?}, accumulation={:?}, axis={:?}, transpose_b={}, width={}, simd={}",
            n,
            config.workers,
            config.tiles.as_slice(),
            config.executor,
            config.accumulation,
            self.axis,
            config.transpose_b,
            kernel.width(),
            kernel.uses_simd(),
        );

        let levels = &config.tiles;
        match config.executor {
            Executor::Threads => {
                let bt = if config.transpose_b {
                    Some(run_transpose(b, n, &self.chunks)?)
                } else {
                    None
                };
                let ops = operands(a, b, bt.as_deref(), n, kernel);
                match config.accumulation {
                    Accumulation::RowOwned => run_row_bands(ops, c, &self.chunks, levels),
                    Accumulation::Atomic => run_k_bands(ops, c, &self.chunks, levels),
                }
            }
            Executor::Rayon => {
                let pool = build_pool(config.workers)?;
                let bt = if config.transpose_b {
                    Some(fan_out_transpose(&pool, b, n)?)
                } else {
                    None
                };
                let ops = operands(a, b, bt.as_deref(), n, kernel);
                match config.accumulation {
                    Accumulation::RowOwned => fan_out_row_bands(&pool, ops, c, levels),
                    Accumulation::Atomic => fan_out_tiles(&pool, ops, c, levels),
                }
            }
        }
    }
}

/// Reads B through its transpose when one was built.
fn operands<'a, T: Element>(
    a: &'a [T],
    b: &'a [T],
    bt: Option<&'a [T]>,
    n: usize,
    kernel: InnerKernel,
) -> Operands<'a, T> {
    let b = match bt {
        Some(bt) => BLayout::Transposed(bt),
        None => BLayout::RowMajor(b),
    };
    Operands { a, b, n, kernel }
}

fn check_len(name: &'static str, got: usize, n: usize) -> Result<()> {
    let expected = n * n;
    if got != expected {
        return Err(GemmError::BufferSize {
            name,
            n,
            expected,
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TileLevels;

    #[test]
    fn test_plan_rejects_bad_input_before_running() {
        let config = GemmConfig::default().with_workers(2);
        assert_eq!(
            GemmPlan::new(0, &config).unwrap_err(),
            GemmError::InvalidDimension(0)
        );
        assert_eq!(
            GemmPlan::new(4, &config.with_workers(0)).unwrap_err(),
            GemmError::InvalidWorkers(0)
        );

        let plan = GemmPlan::new(2, &config).unwrap();
        let mut c = vec![7.0f64; 4];
        let err = plan.execute(&[1.0; 3], &[1.0; 4], &mut c).unwrap_err();
        assert_eq!(
            err,
            GemmError::BufferSize {
                name: "A",
                n: 2,
                expected: 4,
                got: 3
            }
        );
        // Nothing was written.
        assert_eq!(c, vec![7.0; 4]);
    }

    #[test]
    fn test_plan_axis_and_chunks() {
        let base = GemmConfig::default()
            .with_workers(3)
            .with_tiles(TileLevels::single(2).unwrap());

        let plan = GemmPlan::new(7, &base).unwrap();
        assert_eq!(plan.axis(), ParallelAxis::Rows);
        assert_eq!(plan.chunks().len(), 3);
        assert_eq!(plan.chunks()[2].range, 4..7);

        let plan = GemmPlan::new(7, &base.with_accumulation(Accumulation::Atomic)).unwrap();
        assert_eq!(plan.axis(), ParallelAxis::K);

        let plan = GemmPlan::new(
            7,
            &base
                .with_executor(Executor::Rayon)
                .with_accumulation(Accumulation::Atomic),
        )
        .unwrap();
        assert_eq!(plan.axis(), ParallelAxis::OuterTiles);
        assert!(plan.chunks().is_empty());
    }

    #[test]
    fn test_plan_reusable() {
        let n = 6;
        let plan = GemmPlan::new(n, &GemmConfig::default().with_workers(2)).unwrap();
        let a = vec![1u32; n * n];
        let b = vec![2u32; n * n];

        let mut c = vec![0u32; n * n];
        plan.execute(&a, &b, &mut c).unwrap();
        plan.execute(&a, &b, &mut c).unwrap();
        assert!(c.iter().all(|&x| x == 2 * 2 * n as u32));
    }
}
