//! Portable reductions with a configurable number of independent partial sums.
//!
//! Splitting a sum across W accumulators breaks the loop-carried dependency
//! on a single register and lets the compiler vectorize the loop. For
//! floats this changes the rounding order; for integers the result is
//! identical.

use crate::matrix::element::Element;

/// Left-to-right sum of `term(0) .. term(len - 1)`.
#[inline]
pub fn sequential_sum<T: Element>(len: usize, term: impl Fn(usize) -> T) -> T {
    let mut acc = T::zero();
    for p in 0..len {
        acc += term(p);
    }
    acc
}

/// Sum of `len` terms, term `p` going into accumulator `p % W`.
#[inline]
pub fn lane_sum<T: Element, const W: usize>(len: usize, term: impl Fn(usize) -> T) -> T {
    let mut lanes = [T::zero(); W];
    let main = len - len % W;

    let mut p = 0;
    while p < main {
        for (l, lane) in lanes.iter_mut().enumerate() {
            *lane += term(p + l);
        }
        p += W;
    }

    let mut acc = T::zero();
    for lane in lanes {
        acc += lane;
    }
    for q in main..len {
        acc += term(q);
    }
    acc
}

/// Contiguous dot product with `W` accumulators.
#[inline]
pub fn lane_dot<T: Element, const W: usize>(a: &[T], b: &[T]) -> T {
    debug_assert_eq!(a.len(), b.len());

    let mut lanes = [T::zero(); W];
    let a_chunks = a.chunks_exact(W);
    let b_chunks = b.chunks_exact(W);
    let a_tail = a_chunks.remainder();
    let b_tail = b_chunks.remainder();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        for l in 0..W {
            lanes[l] += ca[l] * cb[l];
        }
    }

    let mut acc = T::zero();
    for lane in lanes {
        acc += lane;
    }
    for (&x, &y) in a_tail.iter().zip(b_tail) {
        acc += x * y;
    }
    acc
}

/// Dispatches [`lane_sum`] on a runtime width. Width 1 (or anything
/// unrecognised) falls back to the sequential sum.
#[inline]
pub fn grouped_sum<T: Element>(width: usize, len: usize, term: impl Fn(usize) -> T) -> T {
    match width {
        2 => lane_sum::<T, 2>(len, term),
        4 => lane_sum::<T, 4>(len, term),
        8 => lane_sum::<T, 8>(len, term),
        16 => lane_sum::<T, 16>(len, term),
        _ => sequential_sum(len, term),
    }
}

/// Dispatches [`lane_dot`] on a runtime width.
#[inline]
pub fn grouped_dot<T: Element>(width: usize, a: &[T], b: &[T]) -> T {
    match width {
        2 => lane_dot::<T, 2>(a, b),
        4 => lane_dot::<T, 4>(a, b),
        8 => lane_dot::<T, 8>(a, b),
        16 => lane_dot::<T, 16>(a, b),
        _ => sequential_sum(a.len().min(b.len()), |p| a[p] * b[p]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_sum_matches_sequential_for_integers() {
        let values: Vec<i64> = (0..37).map(|i| i * 3 - 20).collect();
        let expected = sequential_sum(values.len(), |p| values[p]);

        for width in [1, 2, 4, 8, 16] {
            assert_eq!(grouped_sum(width, values.len(), |p| values[p]), expected);
        }
    }

    #[test]
    fn test_lane_dot_handles_tails() {
        for len in [0, 1, 3, 4, 5, 15, 16, 17, 33] {
            let a: Vec<u32> = (0..len as u32).collect();
            let b: Vec<u32> = (0..len as u32).map(|x| x % 5).collect();
            let expected: u32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();

            for width in [1, 2, 4, 8, 16] {
                assert_eq!(grouped_dot(width, &a, &b), expected, "len={len} width={width}");
            }
        }
    }

    #[test]
    fn test_lane_sum_float_close() {
        let values: Vec<f64> = (0..100).map(|i| 1.0 / (i as f64 + 1.0)).collect();
        let expected = sequential_sum(values.len(), |p| values[p]);
        let grouped = grouped_sum(8, values.len(), |p| values[p]);
        approx::assert_relative_eq!(grouped, expected, max_relative = 1e-12);
    }
}
