//! Inner kernels: the partial dot product for one output cell over one k-tile.
//!
//! A kernel never writes C. It returns the partial sum and the caller's
//! accumulation sink decides how that sum is merged.
//!
//! Available reductions:
//! - `lanes`: portable sums with 1, 2, 4, 8 or 16 independent accumulators
//! - `avx2`: AVX2 + FMA dot products for `f32`/`f64` when B is pre-transposed

#[cfg(target_arch = "x86_64")]
pub mod avx2;
pub mod lanes;

use crate::matrix::element::Element;
use std::ops::Range;

/// How B is laid out in memory for the inner kernel.
#[derive(Debug, Clone, Copy)]
pub enum BLayout<'a, T> {
    /// B as given, row-major: B[k, j] at `k * n + j`.
    RowMajor(&'a [T]),
    /// B^T, row-major: B[k, j] at `j * n + k`, so a column of B is contiguous.
    Transposed(&'a [T]),
}

/// Resolved inner-kernel choice for one multiply call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerKernel {
    width: usize,
    simd: bool,
}

impl InnerKernel {
    /// Picks the kernel for element type `T` and reduction width `width`.
    ///
    /// The AVX2 path is only taken for a width of at least 4, since it
    /// groups the sum into vector lanes, and only when the CPU reports
    /// AVX2 and FMA.
    pub fn new<T: Element>(width: usize) -> Self {
        Self {
            width,
            simd: width >= 4 && T::HAS_AVX2_DOT && avx2_fma_available(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// True if contiguous dot products go through the AVX2 path.
    pub fn uses_simd(&self) -> bool {
        self.simd
    }

    /// Partial sum Σ A[i, p] · B[p, j] for p in `k`.
    #[inline]
    pub fn partial<T: Element>(
        &self,
        a: &[T],
        b: BLayout<'_, T>,
        n: usize,
        i: usize,
        j: usize,
        k: Range<usize>,
    ) -> T {
        let a_row = &a[i * n + k.start..i * n + k.end];
        match b {
            BLayout::RowMajor(b) => {
                let k0 = k.start;
                lanes::grouped_sum(self.width, a_row.len(), |p| a_row[p] * b[(k0 + p) * n + j])
            }
            BLayout::Transposed(bt) => self.dot(a_row, &bt[j * n + k.start..j * n + k.end]),
        }
    }

    /// Contiguous dot product with this kernel's reduction.
    #[inline]
    pub fn dot<T: Element>(&self, a: &[T], b: &[T]) -> T {
        #[cfg(target_arch = "x86_64")]
        {
            if self.simd {
                // SAFETY: `simd` is only set after runtime detection of AVX2 and FMA.
                if let Some(sum) = unsafe { T::dot_avx2(a, b) } {
                    return sum;
                }
            }
        }

        lanes::grouped_dot(self.width, a, b)
    }
}

fn avx2_fma_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::transpose::try_transposed;

    #[test]
    fn test_partial_row_major_and_transposed_agree() {
        let n = 7;
        let a: Vec<i64> = (0..n * n).map(|x| (x % 10) as i64).collect();
        let b: Vec<i64> = (0..n * n).map(|x| (x % 13) as i64 - 6).collect();
        let bt = try_transposed(&b, n).unwrap();

        for width in [1, 4, 16] {
            let kernel = InnerKernel::new::<i64>(width);
            assert!(!kernel.uses_simd());

            for (i, j) in [(0, 0), (3, 5), (6, 6)] {
                let expected: i64 = (2..6).map(|p| a[i * n + p] * b[p * n + j]).sum();
                assert_eq!(kernel.partial(&a, BLayout::RowMajor(&b), n, i, j, 2..6), expected);
                assert_eq!(
                    kernel.partial(&a, BLayout::Transposed(&bt), n, i, j, 2..6),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_partial_empty_range_is_zero() {
        let a = [1.0f64; 4];
        let b = [1.0f64; 4];
        let kernel = InnerKernel::new::<f64>(1);
        assert_eq!(kernel.partial(&a, BLayout::RowMajor(&b), 2, 1, 1, 2..2), 0.0);
    }

    #[test]
    fn test_simd_only_for_wide_float_reductions() {
        assert!(!InnerKernel::new::<f64>(1).uses_simd());
        assert!(!InnerKernel::new::<f64>(2).uses_simd());
        assert!(!InnerKernel::new::<u32>(8).uses_simd());
        assert_eq!(InnerKernel::new::<f32>(8).uses_simd(), avx2_fma_available());
    }
}
