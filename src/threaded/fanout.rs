//! Data-parallel fan-out of the outer tile loops over a rayon pool.
//!
//! Work is handed out dynamically, one row band or outer tile per task,
//! instead of one fixed chunk per worker.

use crate::blocked::accumulate::{AtomicCells, RowBand};
use crate::blocked::tiles::{Tile, TileIter};
use crate::blocked::worker::Operands;
use crate::config::TileLevels;
use crate::error::{GemmError, Result};
use crate::matrix::element::Element;
use crate::matrix::transpose::{transpose_rows, try_alloc_transposed};
use log::trace;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Dedicated pool so the configured worker count is honoured regardless of
/// the global rayon pool.
pub fn build_pool(workers: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("gemm-rayon-{i}"))
        .build()
        .map_err(|e| GemmError::ThreadPool(e.to_string()))
}

/// Height of one row-owned task: at most one outer tile, and small enough
/// that every worker gets at least one band.
pub fn band_rows(n: usize, levels: &TileLevels, workers: usize) -> usize {
    levels.outermost().min(n.div_ceil(workers.max(1))).max(1)
}

/// One task per band of rows. Each band is a disjoint slice of C, so merges
/// are plain adds.
pub fn fan_out_row_bands<T: Element>(
    pool: &ThreadPool,
    ops: Operands<'_, T>,
    c: &mut [T],
    levels: &TileLevels,
) -> Result<()> {
    let n = ops.n;
    let rows_per_band = band_rows(n, levels, pool.current_num_threads());
    trace!("fanning out {} row bands", n.div_ceil(rows_per_band));

    pool.install(|| {
        c.par_chunks_mut(rows_per_band * n)
            .enumerate()
            .for_each(|(band, cells)| {
                let mut sink = RowBand::new(band * rows_per_band, n, cells);
                let rows = sink.rows();
                let visited = ops.multiply_tiles(TileIter::new(Tile::rows(rows, n), levels), &mut sink);
                trace!("band {band} finished: {visited} tiles");
            });
    });

    Ok(())
}

/// One task per outer (i, j, k) tile, the k axis included. Tiles that share
/// (i, j) but differ in k hit the same cells concurrently, so every merge
/// is atomic.
pub fn fan_out_tiles<T: Element>(
    pool: &ThreadPool,
    ops: Operands<'_, T>,
    c: &mut [T],
    levels: &TileLevels,
) -> Result<()> {
    let n = ops.n;
    let cells = T::as_atomic_cells(c).ok_or(GemmError::MisalignedOutput)?;
    let sink = AtomicCells::<T>::new(n, cells);

    let outer: Vec<Tile> = TileIter::new(Tile::full(n), &levels.outer_only()).collect();
    trace!("fanning out {} outer tiles", outer.len());

    pool.install(|| {
        outer.into_par_iter().for_each(|tile| {
            let mut sink = sink;
            ops.multiply_tiles(TileIter::new(tile, levels), &mut sink);
        });
    });

    Ok(())
}

/// B^T built on the pool, one band of transposed rows per task.
pub fn fan_out_transpose<T: Element>(pool: &ThreadPool, b: &[T], n: usize) -> Result<Vec<T>> {
    let mut bt = try_alloc_transposed(n)?;
    let rows_per_band = n.div_ceil(pool.current_num_threads().max(1)).max(1);

    pool.install(|| {
        bt.par_chunks_mut(rows_per_band * n)
            .enumerate()
            .for_each(|(band, dst)| {
                let first = band * rows_per_band;
                transpose_rows(b, dst, n, first..first + dst.len() / n);
            });
    });

    Ok(bt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{BLayout, InnerKernel};
    use crate::matrix::naive_ijk::matmul_naive_ijk;
    use crate::matrix::transpose::try_transposed;

    #[test]
    fn test_every_worker_gets_a_band() {
        // Default tiles are taller than the whole matrix here.
        let levels = TileLevels::THREE_LEVEL;
        assert_eq!(band_rows(64, &levels, 8), 8);
        assert_eq!(64usize.div_ceil(band_rows(64, &levels, 8)), 8);
        assert_eq!(band_rows(10, &levels, 4), 3);
        assert_eq!(band_rows(3, &levels, 8), 1);

        // Large matrices stay capped at one outer tile per band.
        assert_eq!(band_rows(4096, &levels, 2), 512);
        assert_eq!(band_rows(4, &TileLevels::single(usize::MAX).unwrap(), 1), 4);
    }

    #[test]
    fn test_row_bands_match_reference() {
        let n = 37;
        let a: Vec<i64> = (0..n * n).map(|x| (x % 11) as i64 - 5).collect();
        let b: Vec<i64> = (0..n * n).map(|x| (x % 7) as i64 - 3).collect();
        let mut expected = vec![0; n * n];
        matmul_naive_ijk(&a, &b, &mut expected, n);

        let pool = build_pool(6).unwrap();
        let ops = Operands {
            a: &a,
            b: BLayout::RowMajor(&b),
            n,
            kernel: InnerKernel::new::<i64>(1),
        };
        let mut c = vec![0; n * n];
        fan_out_row_bands(&pool, ops, &mut c, &TileLevels::THREE_LEVEL).unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_fan_out_transpose_matches_serial() {
        let n = 9;
        let b: Vec<u32> = (0..81).collect();
        let pool = build_pool(4).unwrap();
        assert_eq!(
            fan_out_transpose(&pool, &b, n).unwrap(),
            try_transposed(&b, n).unwrap()
        );
    }
}
