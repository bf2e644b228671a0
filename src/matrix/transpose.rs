use crate::error::{GemmError, Result};
use crate::matrix::element::Element;
use std::ops::Range;

/// Transpose a matrix: dst = src^T
///
/// Converts from row-major (rows × cols) to row-major (cols × rows).
/// After transpose, what was column j of src becomes row j of dst.
///
/// # Arguments
///
/// * `src` - Source matrix (rows × cols), row-major
/// * `dst` - Destination matrix (cols × rows), row-major
/// * `rows` - Number of rows in src
/// * `cols` - Number of columns in src
///
/// # Example
///
/// ```
/// use tiled_gemm::matrix::transpose::transpose;
///
/// let src = vec![1.0, 2.0, 3.0,   // 2×3 matrix
///                4.0, 5.0, 6.0];
/// let mut dst = vec![0.0; 6];      // will be 3×2
///
/// transpose(&src, &mut dst, 2, 3);
///
/// assert_eq!(dst, vec![1.0, 4.0,   // 3×2 matrix
///                      2.0, 5.0,
///                      3.0, 6.0]);
/// ```
pub fn transpose<T: Copy>(src: &[T], dst: &mut [T], rows: usize, cols: usize) {
    for i in 0..rows {
        for j in 0..cols {
            dst[j * rows + i] = src[i * cols + j];
        }
    }
}

/// Writes rows `rows` of src^T into `dst`, where src is n×n.
///
/// `dst` holds exactly those rows, so disjoint row ranges of one output
/// buffer can be filled by different workers.
pub fn transpose_rows<T: Copy>(src: &[T], dst: &mut [T], n: usize, rows: Range<usize>) {
    debug_assert_eq!(dst.len(), rows.len() * n);
    for (out, r) in dst.chunks_exact_mut(n).zip(rows) {
        for (c, cell) in out.iter_mut().enumerate() {
            *cell = src[c * n + r];
        }
    }
}

/// Zeroed n×n buffer for B^T. Allocation failure is reported, not aborted on.
pub fn try_alloc_transposed<T: Element>(n: usize) -> Result<Vec<T>> {
    let len = n.checked_mul(n).ok_or(GemmError::Allocation {
        what: "transposed B",
        elements: usize::MAX,
    })?;
    let mut dst = Vec::new();
    dst.try_reserve_exact(len)
        .map_err(|_| GemmError::Allocation {
            what: "transposed B",
            elements: len,
        })?;
    dst.resize(len, T::zero());
    Ok(dst)
}

/// Allocates and returns the transpose of the n×n matrix `src` on the
/// calling thread.
pub fn try_transposed<T: Element>(src: &[T], n: usize) -> Result<Vec<T>> {
    let mut dst = try_alloc_transposed(n)?;
    transpose_rows(src, &mut dst, n, 0..n);
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_transposed_square() {
        let src = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        let dst = try_transposed(&src, 3).unwrap();
        assert_eq!(dst, vec![1, 4, 7, 2, 5, 8, 3, 6, 9]);
    }

    #[test]
    fn test_transpose_rows_band() {
        let src = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut band = [0; 6];
        transpose_rows(&src, &mut band, 3, 1..3);
        assert_eq!(band, [2, 5, 8, 3, 6, 9]);
    }
}
