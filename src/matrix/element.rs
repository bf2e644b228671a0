//! Numeric element types the kernels operate on.

use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul};
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU32, AtomicU64, Ordering};

/// A matrix element: integer or floating-point, plus the atomic cell type
/// used when several workers may add into the same output cell.
///
/// Integer additions follow the normal overflow rules of the type on the
/// row-owned path; the atomic path wraps on overflow.
pub trait Element:
    Copy
    + Send
    + Sync
    + Debug
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + 'static
{
    /// Atomic cell with the same size as `Self`.
    type Atomic: Send + Sync;

    /// True when [`Element::dot_avx2`] has a real implementation.
    const HAS_AVX2_DOT: bool = false;

    /// Reinterprets an exclusively borrowed buffer as atomic cells.
    ///
    /// Returns `None` when the buffer is not aligned for `Self::Atomic`
    /// (only possible for 64-bit types on 32-bit targets).
    fn as_atomic_cells(cells: &mut [Self]) -> Option<&[Self::Atomic]>;

    /// Indivisible `*cell += value`.
    fn atomic_add(cell: &Self::Atomic, value: Self);

    /// Contiguous dot product using AVX2 + FMA.
    ///
    /// # Safety
    ///
    /// Caller must ensure the CPU supports AVX2 and FMA.
    unsafe fn dot_avx2(_a: &[Self], _b: &[Self]) -> Option<Self> {
        None
    }
}

macro_rules! atomic_cells {
    ($atomic:ty) => {
        fn as_atomic_cells(cells: &mut [Self]) -> Option<&[Self::Atomic]> {
            let ptr = cells.as_mut_ptr();
            if ptr.align_offset(std::mem::align_of::<$atomic>()) != 0 {
                return None;
            }
            // SAFETY: the atomic type has the same size as the element, the
            // alignment was checked above, and the exclusive borrow rules out
            // any non-atomic access while the view is alive.
            Some(unsafe { std::slice::from_raw_parts(ptr as *const $atomic, cells.len()) })
        }
    };
}

macro_rules! impl_int_element {
    ($($t:ty => $atomic:ty),* $(,)?) => {$(
        impl Element for $t {
            type Atomic = $atomic;

            atomic_cells!($atomic);

            #[inline]
            fn atomic_add(cell: &$atomic, value: $t) {
                cell.fetch_add(value, Ordering::Relaxed);
            }
        }
    )*};
}

impl_int_element! {
    i32 => AtomicI32,
    i64 => AtomicI64,
    u32 => AtomicU32,
    u64 => AtomicU64,
}

impl Element for f32 {
    type Atomic = AtomicU32;

    #[cfg(target_arch = "x86_64")]
    const HAS_AVX2_DOT: bool = true;

    atomic_cells!(AtomicU32);

    #[inline]
    fn atomic_add(cell: &AtomicU32, value: f32) {
        // The closure never returns None, so the update always succeeds.
        let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f32::from_bits(bits) + value).to_bits())
        });
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn dot_avx2(a: &[f32], b: &[f32]) -> Option<f32> {
        Some(unsafe { crate::kernels::avx2::dot_f32_avx2(a, b) })
    }
}

impl Element for f64 {
    type Atomic = AtomicU64;

    #[cfg(target_arch = "x86_64")]
    const HAS_AVX2_DOT: bool = true;

    atomic_cells!(AtomicU64);

    #[inline]
    fn atomic_add(cell: &AtomicU64, value: f64) {
        let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f64::from_bits(bits) + value).to_bits())
        });
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn dot_avx2(a: &[f64], b: &[f64]) -> Option<f64> {
        Some(unsafe { crate::kernels::avx2::dot_f64_avx2(a, b) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_atomic_add_float() {
        let mut cells = vec![1.5f64, 2.0];
        let view = f64::as_atomic_cells(&mut cells).unwrap();
        f64::atomic_add(&view[1], 0.25);
        f64::atomic_add(&view[1], 0.25);
        assert_eq!(cells, vec![1.5, 2.5]);
    }

    #[test]
    fn test_atomic_add_contended() {
        let mut cells = vec![0u64; 1];
        let view = u64::as_atomic_cells(&mut cells).unwrap();

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        u64::atomic_add(&view[0], 1);
                    }
                });
            }
        });

        assert_eq!(cells[0], 4000);
    }

    #[test]
    fn test_atomic_add_f32_contended() {
        let mut cells = vec![0.0f32; 1];
        let view = f32::as_atomic_cells(&mut cells).unwrap();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..500 {
                        f32::atomic_add(&view[0], 2.0);
                    }
                });
            }
        });

        // Small integers are exact in f32, so no update may be lost.
        assert_eq!(cells[0], 8000.0);
    }
}
