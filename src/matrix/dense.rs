//! Owned square row-major matrix.

use crate::error::{GemmError, Result};
use crate::matrix::element::Element;

/// An n×n matrix stored row-major in one contiguous buffer.
///
/// Element (r, c) lives at offset `r * n + c`. The dimension is fixed for
/// the lifetime of the value. Every constructor accepts n = 0 and yields an
/// empty matrix; multiplying one is rejected with `InvalidDimension`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    n: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Zero-filled n×n matrix.
    pub fn zeros(n: usize) -> Self {
        Self::filled(n, T::zero())
    }

    /// Zero-filled n×n matrix, reporting allocation failure instead of aborting.
    pub fn try_zeros(n: usize) -> Result<Self> {
        let len = n.checked_mul(n).ok_or(GemmError::Allocation {
            what: "matrix",
            elements: usize::MAX,
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| GemmError::Allocation {
                what: "matrix",
                elements: len,
            })?;
        data.resize(len, T::zero());

        Ok(Self { n, data })
    }

    /// n×n matrix with every element set to `value`.
    pub fn filled(n: usize, value: T) -> Self {
        Self {
            n,
            data: vec![value; n * n],
        }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, |r, c| if r == c { T::one() } else { T::zero() })
    }

    /// Builds a matrix by evaluating `f(row, col)` for every element.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(n * n);
        for r in 0..n {
            for c in 0..n {
                data.push(f(r, c));
            }
        }
        Self { n, data }
    }

    /// Wraps an existing row-major buffer. Fails unless it holds exactly n×n elements.
    pub fn from_vec(n: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != n * n {
            return Err(GemmError::BufferSize {
                name: "matrix",
                n,
                expected: n * n,
                got: data.len(),
            });
        }
        Ok(Self { n, data })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.n + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.n + col] = value;
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.n..(row + 1) * self.n]
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}
