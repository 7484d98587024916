//! Bounds-clipped neighbour enumeration.
//!
//! Every flood fill in the crate (morphology, labeling, watershed, growth)
//! walks neighbours through [`Neighbors`]. The offset table is built once per
//! shape and connectivity; per index only the bounds test is evaluated, so
//! neighbours beyond an edge or corner are skipped rather than wrapped.

use crate::dimension::{increments, index_to_coord_inc};
use crate::util::{GalError, GalResult};

/// Largest dimensionality handled by the neighbour walker.
pub const MAX_DIMS: usize = 10;

/// One neighbour offset: the flat delta plus per-dimension steps.
#[derive(Clone, Debug)]
struct Offset {
    flat: isize,
    steps: Vec<(usize, i8)>,
}

/// Precomputed neighbour offsets for one shape and connectivity.
#[derive(Clone, Debug)]
pub struct Neighbors {
    dsize: Vec<usize>,
    inc: Vec<usize>,
    connectivity: usize,
    offsets: Vec<Offset>,
}

impl Neighbors {
    /// Builds the walker. `connectivity` counts how many dimensions may change
    /// at once: 1 is face-only, `ndim` is the full `3^ndim - 1` ball.
    pub fn new(dsize: &[usize], connectivity: usize) -> GalResult<Self> {
        let ndim = dsize.len();
        if ndim == 0 || ndim > MAX_DIMS {
            return Err(GalError::InvalidShape {
                reason: "neighbour walk needs between 1 and 10 dimensions",
            });
        }
        if connectivity == 0 || connectivity > ndim {
            return Err(GalError::InvalidInput("connectivity must be in 1..=ndim"));
        }
        let inc = increments(dsize);
        let mut offsets = Vec::new();
        let total = 3usize.pow(ndim as u32);
        for code in 0..total {
            let mut rest = code;
            let mut steps = Vec::new();
            let mut flat = 0isize;
            for d in (0..ndim).rev() {
                let step = (rest % 3) as i8 - 1;
                rest /= 3;
                if step != 0 {
                    steps.push((d, step));
                    flat += step as isize * inc[d] as isize;
                }
            }
            if steps.is_empty() || steps.len() > connectivity {
                continue;
            }
            steps.reverse();
            offsets.push(Offset { flat, steps });
        }
        Ok(Self {
            dsize: dsize.to_vec(),
            inc,
            connectivity,
            offsets,
        })
    }

    pub fn dsize(&self) -> &[usize] {
        &self.dsize
    }

    pub fn connectivity(&self) -> usize {
        self.connectivity
    }

    /// Maximum number of neighbours any element can have.
    pub fn max_count(&self) -> usize {
        self.offsets.len()
    }

    /// Calls `f` with the flat index of every in-bounds neighbour of `index`.
    #[inline]
    pub fn for_each(&self, index: usize, mut f: impl FnMut(usize)) {
        let ndim = self.dsize.len();
        let mut coord = [0usize; MAX_DIMS];
        index_to_coord_inc(index, &self.inc, &mut coord[..ndim]);
        'offsets: for off in &self.offsets {
            for &(d, step) in &off.steps {
                let inside = if step < 0 {
                    coord[d] > 0
                } else {
                    coord[d] + 1 < self.dsize[d]
                };
                if !inside {
                    continue 'offsets;
                }
            }
            f((index as isize + off.flat) as usize);
        }
    }

    /// Collects the neighbours of `index` into `out` (cleared first).
    pub fn collect_into(&self, index: usize, out: &mut Vec<usize>) {
        out.clear();
        self.for_each(index, |n| out.push(n));
    }

    /// Returns true if `pred` holds for any neighbour of `index`.
    #[inline]
    pub fn any(&self, index: usize, mut pred: impl FnMut(usize) -> bool) -> bool {
        let mut found = false;
        self.for_each(index, |n| {
            if !found && pred(n) {
                found = true;
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::Neighbors;

    fn sorted(n: &Neighbors, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        n.collect_into(index, &mut out);
        out.sort_unstable();
        out
    }

    #[test]
    fn interior_pixel_2d() {
        let four = Neighbors::new(&[3, 3], 1).unwrap();
        assert_eq!(sorted(&four, 4), vec![1, 3, 5, 7]);
        let eight = Neighbors::new(&[3, 3], 2).unwrap();
        assert_eq!(sorted(&eight, 4), vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn corner_pixel_is_clipped() {
        let eight = Neighbors::new(&[3, 4], 2).unwrap();
        assert_eq!(sorted(&eight, 0), vec![1, 4, 5]);
        // last column must not wrap to the next row
        assert_eq!(sorted(&eight, 3), vec![2, 6, 7]);
    }

    #[test]
    fn three_dimensional_counts() {
        let n6 = Neighbors::new(&[3, 3, 3], 1).unwrap();
        let n18 = Neighbors::new(&[3, 3, 3], 2).unwrap();
        let n26 = Neighbors::new(&[3, 3, 3], 3).unwrap();
        assert_eq!(sorted(&n6, 13).len(), 6);
        assert_eq!(sorted(&n18, 13).len(), 18);
        assert_eq!(sorted(&n26, 13).len(), 26);
    }

    #[test]
    fn rejects_bad_connectivity() {
        assert!(Neighbors::new(&[4, 4], 0).is_err());
        assert!(Neighbors::new(&[4, 4], 3).is_err());
    }
}
