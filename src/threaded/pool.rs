//! Fixed pool of scoped OS threads, one per work chunk.
//!
//! Every worker is spawned inside `std::thread::scope` and explicitly
//! joined before the call returns, so C is never observable mid-flight and
//! no thread outlives the borrowed matrices.

use crate::blocked::accumulate::{AtomicCells, split_row_bands, split_rows};
use crate::blocked::tiles::{Tile, TileIter};
use crate::blocked::worker::Operands;
use crate::config::TileLevels;
use crate::error::{GemmError, Result};
use crate::matrix::element::Element;
use crate::matrix::transpose::{transpose_rows, try_alloc_transposed};
use crate::threaded::partition::WorkChunk;
use log::trace;
use std::thread;

/// Row-owned parallelism: chunk `w` covers rows `chunks[w].range` and
/// receives exactly that band of C.
pub fn run_row_bands<T: Element>(
    ops: Operands<'_, T>,
    c: &mut [T],
    chunks: &[WorkChunk],
    levels: &TileLevels,
) -> Result<()> {
    let n = ops.n;
    let bands = split_row_bands(c, n, chunks.iter().map(|chunk| chunk.range.clone()));

    let jobs = chunks.iter().zip(bands).map(|(chunk, mut band)| {
        let worker = chunk.worker;
        let tiles = TileIter::new(Tile::rows(chunk.range.clone(), n), levels);
        let job = move || {
            trace!("worker {worker} started: rows {:?}", band.rows());
            let visited = ops.multiply_tiles(tiles, &mut band);
            trace!("worker {worker} finished: {visited} tiles");
        };
        (worker, job)
    });

    run_scoped(jobs)
}

/// k-split parallelism: chunk `w` covers all rows and columns for the k
/// indices in `chunks[w].range`. Every cell receives partial sums from
/// every worker, so merges go through atomic cells.
pub fn run_k_bands<T: Element>(
    ops: Operands<'_, T>,
    c: &mut [T],
    chunks: &[WorkChunk],
    levels: &TileLevels,
) -> Result<()> {
    let n = ops.n;
    let cells = T::as_atomic_cells(c).ok_or(GemmError::MisalignedOutput)?;
    let sink = AtomicCells::<T>::new(n, cells);

    let jobs = chunks.iter().map(|chunk| {
        let worker = chunk.worker;
        let k_range = chunk.range.clone();
        let tiles = TileIter::new(Tile::new(0..n, 0..n, k_range.clone()), levels);
        let mut sink = sink;
        let job = move || {
            trace!("worker {worker} started: k {k_range:?}");
            let visited = ops.multiply_tiles(tiles, &mut sink);
            trace!("worker {worker} finished: {visited} tiles");
        };
        (worker, job)
    });

    run_scoped(jobs)
}

/// B^T built on the same workers: chunk `w` writes rows `chunks[w].range`
/// of the transpose.
pub fn run_transpose<T: Element>(b: &[T], n: usize, chunks: &[WorkChunk]) -> Result<Vec<T>> {
    let mut bt = try_alloc_transposed(n)?;
    let bands = split_rows(&mut bt, n, chunks.iter().map(|chunk| chunk.range.clone()));

    let jobs = chunks.iter().zip(bands).map(|(chunk, (rows, dst))| {
        let job = move || transpose_rows(b, dst, n, rows);
        (chunk.worker, job)
    });
    run_scoped(jobs)?;

    Ok(bt)
}

/// Spawns every job on its own scoped thread and joins them all.
///
/// If a spawn fails, the threads already started are still joined before
/// the error is returned. A panicking worker fails the whole call.
fn run_scoped<F>(jobs: impl Iterator<Item = (usize, F)>) -> Result<()>
where
    F: FnOnce() + Send,
{
    thread::scope(|s| {
        let mut handles = Vec::new();
        let mut failure = None;

        for (worker, job) in jobs {
            let spawned = thread::Builder::new()
                .name(format!("gemm-worker-{worker}"))
                .spawn_scoped(s, job);
            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(e) => {
                    failure = Some(GemmError::WorkerSpawn {
                        worker,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        for (worker, handle) in handles {
            if handle.join().is_err() && failure.is_none() {
                failure = Some(GemmError::WorkerPanicked(worker));
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    })
}
