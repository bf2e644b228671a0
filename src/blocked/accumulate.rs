//! Accumulation sinks: how a partial sum is merged into C[i, j].
//!
//! Exactly one discipline is used per configuration:
//! - [`RowBand`] owns a disjoint slice of rows of C. No other worker can
//!   reach those cells, so a plain `+=` is enough.
//! - [`AtomicCells`] is a shared view of all of C. Any worker may hit any
//!   cell, so every merge is an atomic add.

use crate::matrix::element::Element;
use std::ops::Range;

/// Destination for partial sums produced by the inner kernel.
pub trait OutputSink<T: Element> {
    /// C[i, j] += partial
    fn merge(&mut self, i: usize, j: usize, partial: T);
}

/// Exclusively borrowed rows `[first_row, first_row + len)` of C.
#[derive(Debug)]
pub struct RowBand<'a, T> {
    first_row: usize,
    n: usize,
    cells: &'a mut [T],
}

impl<'a, T: Element> RowBand<'a, T> {
    /// `cells` must hold whole rows of length `n`, starting at `first_row`.
    pub fn new(first_row: usize, n: usize, cells: &'a mut [T]) -> Self {
        debug_assert!(n > 0 && cells.len() % n == 0);
        Self {
            first_row,
            n,
            cells,
        }
    }

    /// Rows of C this band owns.
    pub fn rows(&self) -> Range<usize> {
        self.first_row..self.first_row + self.cells.len() / self.n
    }
}

impl<T: Element> OutputSink<T> for RowBand<'_, T> {
    #[inline]
    fn merge(&mut self, i: usize, j: usize, partial: T) {
        self.cells[(i - self.first_row) * self.n + j] += partial;
    }
}

/// Shared atomic view of all of C.
pub struct AtomicCells<'a, T: Element> {
    n: usize,
    cells: &'a [T::Atomic],
}

// Manual impls: a derive would also require `T::Atomic: Clone`.
impl<T: Element> Clone for AtomicCells<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for AtomicCells<'_, T> {}

impl<'a, T: Element> AtomicCells<'a, T> {
    pub fn new(n: usize, cells: &'a [T::Atomic]) -> Self {
        debug_assert_eq!(cells.len(), n * n);
        Self { n, cells }
    }
}

impl<T: Element> OutputSink<T> for AtomicCells<'_, T> {
    #[inline]
    fn merge(&mut self, i: usize, j: usize, partial: T) {
        T::atomic_add(&self.cells[i * self.n + j], partial);
    }
}

/// Splits C into consecutive row bands of `rows_per_band[w]` rows each.
///
/// The bands are disjoint `&mut` slices, so each one can be moved into its
/// own worker.
pub fn split_row_bands<'a, T: Element>(
    c: &'a mut [T],
    n: usize,
    bands: impl IntoIterator<Item = Range<usize>>,
) -> Vec<RowBand<'a, T>> {
    split_rows(c, n, bands)
        .into_iter()
        .map(|(rows, cells)| RowBand::new(rows.start, n, cells))
        .collect()
}

/// Splits an n-column row-major buffer into the consecutive row ranges
/// `bands`, pairing each range with its slice.
pub fn split_rows<'a, T>(
    mut cells: &'a mut [T],
    n: usize,
    bands: impl IntoIterator<Item = Range<usize>>,
) -> Vec<(Range<usize>, &'a mut [T])> {
    let mut out = Vec::new();
    let mut next_row = 0;
    for rows in bands {
        debug_assert_eq!(rows.start, next_row, "row bands must be consecutive");
        let (head, tail) = std::mem::take(&mut cells).split_at_mut(rows.len() * n);
        next_row = rows.end;
        out.push((rows, head));
        cells = tail;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_band_merge_offsets_by_first_row() {
        let mut c = vec![0i32; 3 * 4];
        {
            let mut bands = split_row_bands(&mut c, 4, [0..1, 1..3]);
            assert_eq!(bands[0].rows(), 0..1);
            assert_eq!(bands[1].rows(), 1..3);
            bands[1].merge(2, 3, 7);
            bands[1].merge(2, 3, 1);
            bands[0].merge(0, 0, 5);
        }
        assert_eq!(c[2 * 4 + 3], 8);
        assert_eq!(c[0], 5);
    }

    #[test]
    fn test_split_row_bands_with_empty_band() {
        let mut c = vec![0u64; 2 * 2];
        let bands = split_row_bands(&mut c, 2, [0..0, 0..0, 0..2]);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].rows(), 0..0);
        assert_eq!(bands[2].rows(), 0..2);
    }

    #[test]
    fn test_atomic_cells_merge() {
        let mut c = vec![1.0f64; 4];
        {
            let view = f64::as_atomic_cells(&mut c).unwrap();
            let mut sink = AtomicCells::<f64>::new(2, view);
            sink.merge(1, 0, 2.5);
            let mut copy = sink;
            copy.merge(1, 0, 0.5);
        }
        assert_eq!(c, vec![1.0, 1.0, 4.0, 1.0]);
    }
}
