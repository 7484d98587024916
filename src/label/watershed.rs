//! Immersion-style over-segmentation into clumps separated by rivers.

use super::{require_labels, BLANK_LABEL, INIT_LABEL, RIVER_LABEL, TMPCHECK_LABEL};
use crate::data::{Data, DataType};
use crate::dimension::Neighbors;
use crate::trace::{trace_event, trace_span};
use crate::util::{GalError, GalResult};
use std::cmp::Ordering;

/// Which local extrema seed the clumps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Extremum {
    /// Clumps grow upwards from local minima.
    Min,
    /// Clumps grow downwards from local maxima.
    #[default]
    Max,
}

impl Extremum {
    /// Processing order of two values; NaN always sorts last.
    fn order(self, a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => match self {
                Extremum::Min => a.total_cmp(&b),
                Extremum::Max => b.total_cmp(&a),
            },
        }
    }

    /// Whether `a` is further towards this extremum than `b`.
    pub(crate) fn beyond(self, a: f32, b: f32) -> bool {
        match self {
            Extremum::Min => a < b,
            Extremum::Max => a > b,
        }
    }
}

/// Result of [`watershed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatershedOutput {
    /// Number of clumps (rivers and background excluded).
    pub num_clumps: usize,
    /// Flat index of the seeding extremum of each clump; element `l - 1`
    /// belongs to clump `l`.
    pub top_indexes: Vec<usize>,
}

/// Outcome of inspecting the labeled neighbours of a pixel or plateau.
enum Verdict {
    NewClump,
    Join(i32),
    River,
}

struct Inspector {
    found: Option<i32>,
    river: bool,
}

impl Inspector {
    fn new() -> Self {
        Self {
            found: None,
            river: false,
        }
    }

    fn see(&mut self, label: i32) {
        match label {
            l if l > 0 => match self.found {
                None => self.found = Some(l),
                Some(f) if f != l => self.river = true,
                Some(_) => {}
            },
            0 | BLANK_LABEL => self.river = true,
            _ => {}
        }
    }

    fn verdict(self) -> Verdict {
        match (self.river, self.found) {
            (true, _) => Verdict::River,
            (false, Some(l)) => Verdict::Join(l),
            (false, None) => Verdict::NewClump,
        }
    }
}

/// Segments the elements listed in `indexes` into clumps.
///
/// `values` must be `Float32` and `labels` `Int32` with the same extents.
/// Every listed element is first reset to [`INIT_LABEL`]; elements outside
/// the list keep their labels, and touching one labeled `0` or blank turns
/// an element into a river. Unless `presorted` is set, `indexes` is sorted
/// in place by value (ascending for [`Extremum::Min`], descending for
/// [`Extremum::Max`], NaN last). Elements with a NaN value get
/// [`BLANK_LABEL`].
///
/// Elements are visited in that order. A run of equal values that are
/// connected forms a plateau that is decided as a whole: with no labeled
/// neighbour it starts a new clump, with exactly one neighbouring clump it
/// joins it, and otherwise every member becomes a river.
pub fn watershed(
    values: &Data,
    indexes: &mut [usize],
    labels: &mut Data,
    extremum: Extremum,
    presorted: bool,
) -> GalResult<WatershedOutput> {
    values.require_type(DataType::Float32, "watershed values")?;
    require_labels(labels, "watershed labels")?;
    if values.dsize() != labels.dsize() {
        return Err(GalError::SizeMismatch {
            expected: values.size(),
            got: labels.size(),
            context: "watershed labels",
        });
    }
    let size = values.size();
    if let Some(&bad) = indexes.iter().find(|&&i| i >= size) {
        return Err(GalError::IndexOutOfBounds {
            index: bad,
            len: size,
            context: "watershed index",
        });
    }
    let _span = trace_span!("watershed", indexes = indexes.len()).entered();
    let neighbors = Neighbors::new(values.dsize(), values.ndim())?;
    let arr = values.as_slice::<f32>()?;
    if !presorted {
        indexes.sort_by(|&a, &b| extremum.order(arr[a], arr[b]));
    }
    let lab = labels.as_mut_slice::<i32>()?;
    for &i in indexes.iter() {
        lab[i] = if arr[i].is_nan() { BLANK_LABEL } else { INIT_LABEL };
    }

    let mut top_indexes = Vec::new();
    let mut plateau = Vec::new();
    for (pos, &idx) in indexes.iter().enumerate() {
        if lab[idx] != INIT_LABEL {
            continue;
        }
        let value = arr[idx];
        let tie = indexes
            .get(pos + 1)
            .is_some_and(|&next| arr[next] == value);

        plateau.clear();
        plateau.push(idx);
        if tie {
            lab[idx] = TMPCHECK_LABEL;
            let mut cursor = 0;
            while cursor < plateau.len() {
                let p = plateau[cursor];
                cursor += 1;
                neighbors.for_each(p, |n| {
                    if lab[n] == INIT_LABEL && arr[n] == value {
                        lab[n] = TMPCHECK_LABEL;
                        plateau.push(n);
                    }
                });
            }
        }

        let mut inspector = Inspector::new();
        for &p in &plateau {
            neighbors.for_each(p, |n| {
                if lab[n] != TMPCHECK_LABEL {
                    inspector.see(lab[n]);
                }
            });
        }
        let label = match inspector.verdict() {
            Verdict::NewClump => {
                top_indexes.push(idx);
                top_indexes.len() as i32
            }
            Verdict::Join(l) => l,
            Verdict::River => RIVER_LABEL,
        };
        for &p in &plateau {
            lab[p] = label;
        }
    }

    trace_event!("watershed_done", clumps = top_indexes.len());
    Ok(WatershedOutput {
        num_clumps: top_indexes.len(),
        top_indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_peak_becomes_one_clump() {
        let values = Data::from_vec(vec![1.0f32, 3.0, 3.0, 3.0, 1.0], &[5]).unwrap();
        let mut labels = Data::from_vec(vec![0i32; 5], &[5]).unwrap();
        let mut indexes: Vec<usize> = (0..5).collect();
        let out = watershed(&values, &mut indexes, &mut labels, Extremum::Max, false).unwrap();
        assert_eq!(out.num_clumps, 1);
        assert_eq!(labels.as_slice::<i32>().unwrap(), &[1, 1, 1, 1, 1]);
        assert_eq!(out.top_indexes, vec![1]);
    }

    #[test]
    fn touching_background_makes_river() {
        let values = Data::from_vec(vec![0.0f32, 5.0, 4.0, 6.0], &[4]).unwrap();
        let mut labels = Data::from_vec(vec![0i32; 4], &[4]).unwrap();
        let mut indexes = vec![1, 2, 3];
        let out = watershed(&values, &mut indexes, &mut labels, Extremum::Max, false).unwrap();
        assert_eq!(indexes, vec![3, 1, 2]);
        assert_eq!(out.num_clumps, 1);
        assert_eq!(labels.as_slice::<i32>().unwrap(), &[0, RIVER_LABEL, 1, 1]);
    }
}
