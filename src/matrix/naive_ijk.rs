use crate::matrix::element::Element;

/// Untiled matrix multiplication using i-j-k loop order.
///
/// This is the textbook triple loop: no blocking, no threads, and a plain
/// left-to-right sum over k. Slow because the innermost loop walks B with
/// stride `n`, but it is the reference the tiled kernels must reproduce.
///
/// # Arguments
///
/// * `a` - Matrix A (n × n), row-major
/// * `b` - Matrix B (n × n), row-major
/// * `c` - Matrix C (n × n), row-major, accumulated into (C += A * B)
/// * `n` - Matrix dimension
pub fn matmul_naive_ijk<T: Element>(a: &[T], b: &[T], c: &mut [T], n: usize) {
    for i in 0..n {
        for j in 0..n {
            let mut sum = T::zero();
            for p in 0..n {
                sum += a[i * n + p] * b[p * n + j];
            }
            c[i * n + j] += sum;
        }
    }
}
