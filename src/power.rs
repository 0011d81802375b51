//! Power-iteration kernels shared by every backend
//!
//! One iteration is a strict two-phase cycle: y = A*x through the active
//! backend, then x = y / ||y||2. The norm is always reduced over the whole
//! of y in index order so that all backends produce identical scalars, and
//! the division is written per row range so backends can parallelize it.

use num_traits::Float;

/// Euclidean norm of v, accumulated in index order.
///
/// The fixed order matters: this scalar feeds the normalize phase of every
/// backend and must be identical across them.
pub fn norm2<T: Float>(v: &[T]) -> T {
    let mut sum = T::zero();
    for &vi in v {
        sum = sum + vi * vi;
    }
    sum.sqrt()
}

/// Normalize phase for one row range: y = y / norm, then x = y.
///
/// `x` and `y` are the same row range of the iterate and scratch vectors.
pub fn normalize_segment<T: Float>(x: &mut [T], y: &mut [T], norm: T) {
    debug_assert_eq!(x.len(), y.len());

    for (xi, yi) in x.iter_mut().zip(y.iter_mut()) {
        *yi = *yi / norm;
        *xi = *yi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm2_of_unit_axes() {
        assert_eq!(norm2(&[3.0, 4.0]), 5.0);
        assert_eq!(norm2::<f64>(&[]), 0.0);
    }

    #[test]
    fn normalize_writes_both_vectors() {
        let mut x = vec![0.0, 0.0];
        let mut y = vec![3.0, 4.0];
        normalize_segment(&mut x, &mut y, 5.0);

        assert_eq!(y, vec![0.6, 0.8]);
        assert_eq!(x, y);
    }
}
