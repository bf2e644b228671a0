//! AVX2 + FMA dot products for the pre-transposed inner kernel.
//!
//! With B transposed, a row of A and a row of B^T are both contiguous, so
//! the partial sum for one output cell is a plain dot product. Four vector
//! accumulators keep the FMA pipes busy; they are folded together once at
//! the end.

use std::arch::x86_64::*;

/// Computes Σ a[p] * b[p] over the common length of `a` and `b`.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2 and FMA.
#[target_feature(enable = "avx2,fma")]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn dot_f64_avx2(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    let main = (len / 16) * 16;
    let pa = a.as_ptr();
    let pb = b.as_ptr();

    let mut acc0 = _mm256_setzero_pd();
    let mut acc1 = _mm256_setzero_pd();
    let mut acc2 = _mm256_setzero_pd();
    let mut acc3 = _mm256_setzero_pd();

    let mut p = 0;
    while p < main {
        acc0 = _mm256_fmadd_pd(_mm256_loadu_pd(pa.add(p)), _mm256_loadu_pd(pb.add(p)), acc0);
        acc1 = _mm256_fmadd_pd(
            _mm256_loadu_pd(pa.add(p + 4)),
            _mm256_loadu_pd(pb.add(p + 4)),
            acc1,
        );
        acc2 = _mm256_fmadd_pd(
            _mm256_loadu_pd(pa.add(p + 8)),
            _mm256_loadu_pd(pb.add(p + 8)),
            acc2,
        );
        acc3 = _mm256_fmadd_pd(
            _mm256_loadu_pd(pa.add(p + 12)),
            _mm256_loadu_pd(pb.add(p + 12)),
            acc3,
        );
        p += 16;
    }

    // Leftover full vectors
    while p + 4 <= len {
        acc0 = _mm256_fmadd_pd(_mm256_loadu_pd(pa.add(p)), _mm256_loadu_pd(pb.add(p)), acc0);
        p += 4;
    }

    let sum = _mm256_add_pd(_mm256_add_pd(acc0, acc1), _mm256_add_pd(acc2, acc3));
    let mut lanes = [0.0f64; 4];
    _mm256_storeu_pd(lanes.as_mut_ptr(), sum);

    let mut total = lanes[0] + lanes[1] + lanes[2] + lanes[3];
    for q in p..len {
        total += a[q] * b[q];
    }
    total
}

/// Single-precision version of [`dot_f64_avx2`], 8 lanes per vector.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2 and FMA.
#[target_feature(enable = "avx2,fma")]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn dot_f32_avx2(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let main = (len / 32) * 32;
    let pa = a.as_ptr();
    let pb = b.as_ptr();

    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut acc2 = _mm256_setzero_ps();
    let mut acc3 = _mm256_setzero_ps();

    let mut p = 0;
    while p < main {
        acc0 = _mm256_fmadd_ps(_mm256_loadu_ps(pa.add(p)), _mm256_loadu_ps(pb.add(p)), acc0);
        acc1 = _mm256_fmadd_ps(
            _mm256_loadu_ps(pa.add(p + 8)),
            _mm256_loadu_ps(pb.add(p + 8)),
            acc1,
        );
        acc2 = _mm256_fmadd_ps(
            _mm256_loadu_ps(pa.add(p + 16)),
            _mm256_loadu_ps(pb.add(p + 16)),
            acc2,
        );
        acc3 = _mm256_fmadd_ps(
            _mm256_loadu_ps(pa.add(p + 24)),
            _mm256_loadu_ps(pb.add(p + 24)),
            acc3,
        );
        p += 32;
    }

    while p + 8 <= len {
        acc0 = _mm256_fmadd_ps(_mm256_loadu_ps(pa.add(p)), _mm256_loadu_ps(pb.add(p)), acc0);
        p += 8;
    }

    let sum = _mm256_add_ps(_mm256_add_ps(acc0, acc1), _mm256_add_ps(acc2, acc3));
    let mut lanes = [0.0f32; 8];
    _mm256_storeu_ps(lanes.as_mut_ptr(), sum);

    let mut total = lanes.iter().sum::<f32>();
    for q in p..len {
        total += a[q] * b[q];
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn has_avx2_fma() -> bool {
        is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
    }

    #[test]
    fn test_dot_f64_matches_scalar() {
        if !has_avx2_fma() {
            println!("Skipping - AVX2 not available");
            return;
        }

        for len in [0, 1, 3, 4, 7, 16, 17, 31, 64, 100] {
            let a: Vec<f64> = (0..len).map(|i| (i % 10) as f64).collect();
            let b: Vec<f64> = (0..len).map(|i| (i % 7) as f64 * 0.5).collect();
            let expected: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();

            let got = unsafe { dot_f64_avx2(&a, &b) };
            assert_relative_eq!(got, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_dot_f32_matches_scalar() {
        if !has_avx2_fma() {
            println!("Skipping - AVX2 not available");
            return;
        }

        for len in [0, 5, 8, 9, 32, 33, 70] {
            let a: Vec<f32> = (0..len).map(|i| (i % 10) as f32).collect();
            let b: Vec<f32> = (0..len).map(|i| (i % 3) as f32).collect();
            let expected: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();

            let got = unsafe { dot_f32_avx2(&a, &b) };
            assert_eq!(got, expected, "len={len}");
        }
    }
}
