//! Static work partitioning.

use crate::error::{GemmError, Result};
use std::ops::Range;

/// A contiguous index range owned by one worker for a whole multiply call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkChunk {
    pub worker: usize,
    pub range: Range<usize>,
}

impl WorkChunk {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Splits `[0, extent)` into `workers` consecutive ranges.
///
/// The first `workers - 1` ranges get `extent / workers` indices each and
/// the last one absorbs the remainder. With more workers than indices the
/// leading ranges are empty. There is no rebalancing afterwards.
pub fn partition(extent: usize, workers: usize) -> Result<Vec<WorkChunk>> {
    if workers == 0 {
        return Err(GemmError::InvalidWorkers(workers));
    }

    let per_worker = extent / workers;
    let chunks = (0..workers)
        .map(|worker| {
            let start = worker * per_worker;
            let end = if worker == workers - 1 {
                extent
            } else {
                start + per_worker
            };
            WorkChunk {
                worker,
                range: start..end,
            }
        })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(chunks: &[WorkChunk], extent: usize) {
        let mut next = 0;
        for chunk in chunks {
            assert_eq!(chunk.range.start, next);
            next = chunk.range.end;
        }
        assert_eq!(next, extent);
    }

    #[test]
    fn test_even_split() {
        let chunks = partition(8, 4).unwrap();
        assert_exact_cover(&chunks, 8);
        assert!(chunks.iter().all(|c| c.len() == 2));
    }

    #[test]
    fn test_last_chunk_absorbs_remainder() {
        let chunks = partition(10, 4).unwrap();
        assert_exact_cover(&chunks, 10);
        let lens: Vec<_> = chunks.iter().map(WorkChunk::len).collect();
        assert_eq!(lens, vec![2, 2, 2, 4]);
    }

    #[test]
    fn test_more_workers_than_rows() {
        let chunks = partition(3, 8).unwrap();
        assert_eq!(chunks.len(), 8);
        assert_exact_cover(&chunks, 3);
        assert!(chunks[..7].iter().all(WorkChunk::is_empty));
        assert_eq!(chunks[7].range, 0..3);
    }

    #[test]
    fn test_single_worker() {
        assert_eq!(
            partition(5, 1).unwrap(),
            vec![WorkChunk {
                worker: 0,
                range: 0..5
            }]
        );
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_eq!(partition(5, 0), Err(GemmError::InvalidWorkers(0)));
    }
}
