//! The per-worker tile walk: kernel + sink over a sequence of tiles.

use crate::blocked::accumulate::OutputSink;
use crate::blocked::tiles::Tile;
use crate::kernels::{BLayout, InnerKernel};
use crate::matrix::element::Element;

/// Read-only inputs shared by every worker of one multiply call.
#[derive(Debug, Clone, Copy)]
pub struct Operands<'a, T> {
    pub a: &'a [T],
    pub b: BLayout<'a, T>,
    pub n: usize,
    pub kernel: InnerKernel,
}

impl<T: Element> Operands<'_, T> {
    /// Runs every tile through the inner kernel and merges each partial sum
    /// into `sink`. Returns the number of tiles processed.
    ///
    /// All k-tiles of a cell that reach the same sink are merged by the
    /// calling thread, in traversal order.
    pub fn multiply_tiles<S: OutputSink<T>>(
        &self,
        tiles: impl IntoIterator<Item = Tile>,
        sink: &mut S,
    ) -> usize {
        let mut visited = 0;
        for tile in tiles {
            for i in tile.i.clone() {
                for j in tile.j.clone() {
                    // Fresh accumulator per (i, j, k-tile).
                    let partial = self
                        .kernel
                        .partial(self.a, self.b, self.n, i, j, tile.k.clone());
                    sink.merge(i, j, partial);
                }
            }
            visited += 1;
        }
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocked::accumulate::split_row_bands;
    use crate::blocked::tiles::TileIter;
    use crate::config::TileLevels;
    use crate::matrix::naive_ijk::matmul_naive_ijk;

    #[test]
    fn test_tiled_walk_matches_reference() {
        let n = 10;
        let a: Vec<i64> = (0..n * n).map(|x| (x % 7) as i64).collect();
        let b: Vec<i64> = (0..n * n).map(|x| (x % 5) as i64 - 2).collect();

        let mut expected = vec![0i64; n * n];
        matmul_naive_ijk(&a, &b, &mut expected, n);

        let ops = Operands {
            a: &a,
            b: BLayout::RowMajor(&b),
            n,
            kernel: InnerKernel::new::<i64>(1),
        };

        for sizes in [&[3][..], &[6, 4][..], &[8, 4, 3][..]] {
            let levels = TileLevels::new(sizes).unwrap();
            let mut c = vec![0i64; n * n];
            let mut bands = split_row_bands(&mut c, n, [0..n]);
            let visited = ops.multiply_tiles(TileIter::new(Tile::full(n), &levels), &mut bands[0]);
            assert!(visited > 0);
            drop(bands);
            assert_eq!(c, expected, "tiles {sizes:?}");
        }
    }
}
