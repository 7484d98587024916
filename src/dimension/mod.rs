//! Coordinate and index arithmetic over N-dimensional extents.
//!
//! Extents are listed slowest-varying first (C order), so the last dimension
//! is contiguous in memory. All functions here are pure.

mod collapse;
mod neighbors;

pub use collapse::{collapse, Collapse};
pub use neighbors::{Neighbors, MAX_DIMS};

use crate::util::{GalError, GalResult};

/// Total number of elements, rejecting zero extents and overflow.
pub fn total_size(dsize: &[usize]) -> GalResult<usize> {
    if dsize.is_empty() {
        return Err(GalError::InvalidShape {
            reason: "at least one dimension is required",
        });
    }
    let mut size = 1usize;
    for (dim, &n) in dsize.iter().enumerate() {
        if n == 0 {
            return Err(GalError::ZeroDimension { dim });
        }
        size = size.checked_mul(n).ok_or_else(|| GalError::SizeOverflow {
            dsize: dsize.to_vec(),
        })?;
    }
    Ok(size)
}

/// Per-dimension flat-index increments: the last is 1, and each earlier one
/// is the product of all faster extents.
pub fn increments(dsize: &[usize]) -> Vec<usize> {
    let ndim = dsize.len();
    let mut inc = vec![1; ndim];
    for d in (0..ndim.saturating_sub(1)).rev() {
        inc[d] = inc[d + 1] * dsize[d + 1];
    }
    inc
}

/// Row-major flat index of `coord`.
#[inline]
pub fn coord_to_index(dsize: &[usize], coord: &[usize]) -> usize {
    match dsize.len() {
        1 => coord[0],
        2 => coord[0] * dsize[1] + coord[1],
        _ => {
            let mut index = 0usize;
            for (d, &c) in coord.iter().enumerate() {
                index = index * dsize[d] + c;
            }
            index
        }
    }
}

/// Writes the coordinate of flat `index` into `coord`.
///
/// Loops converting many indices of one shape should precompute
/// [`increments`] once and call [`index_to_coord_inc`].
#[inline]
pub fn index_to_coord(index: usize, dsize: &[usize], coord: &mut [usize]) {
    match dsize.len() {
        1 => coord[0] = index,
        2 => {
            coord[0] = index / dsize[1];
            coord[1] = index % dsize[1];
        }
        _ => {
            let mut rest = index;
            for (c, &n) in coord.iter_mut().zip(dsize).skip(1).rev() {
                *c = rest % n;
                rest /= n;
            }
            coord[0] = rest;
        }
    }
}

/// Like [`index_to_coord`], with increments precomputed by [`increments`].
#[inline]
pub fn index_to_coord_inc(index: usize, inc: &[usize], coord: &mut [usize]) {
    let mut rest = index;
    for (c, &step) in coord.iter_mut().zip(inc) {
        *c = rest / step;
        rest %= step;
    }
}

/// Number of neighbours with full connectivity: `3^ndim - 1`.
pub fn num_neighbors(ndim: usize) -> usize {
    3usize.pow(ndim as u32) - 1
}

/// Manhattan distance between two coordinates.
pub fn distance_manhattan(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).map(|(&x, &y)| x.abs_diff(y)).sum()
}

/// Euclidean distance between two coordinates.
pub fn distance_radial(a: &[usize], b: &[usize]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_are_products_of_faster_extents() {
        assert_eq!(increments(&[4, 3, 2]), vec![6, 2, 1]);
        assert_eq!(increments(&[7]), vec![1]);
    }

    #[test]
    fn total_size_rejects_zero_and_overflow() {
        assert_eq!(total_size(&[3, 0]), Err(GalError::ZeroDimension { dim: 1 }));
        assert!(matches!(
            total_size(&[usize::MAX, 2]),
            Err(GalError::SizeOverflow { .. })
        ));
        assert_eq!(total_size(&[2, 3, 4]), Ok(24));
    }

    #[test]
    fn neighbor_counts_follow_powers_of_three() {
        assert_eq!(num_neighbors(1), 2);
        assert_eq!(num_neighbors(2), 8);
        assert_eq!(num_neighbors(3), 26);
    }

    #[test]
    fn distances_are_symmetric() {
        assert_eq!(distance_manhattan(&[1, 5], &[4, 1]), 7);
        assert_eq!(distance_manhattan(&[4, 1], &[1, 5]), 7);
        assert!((distance_radial(&[0, 0], &[3, 4]) - 5.0).abs() < 1e-12);
    }
}
