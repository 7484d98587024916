//! Label arrays: per-label index lists, watershed clumps, clump significance
//! and label growth.
//!
//! Labels are `Int32`: `0` is background, positive values are component or
//! clump ids and negative values are reserved markers.

mod grow;
mod significance;
mod watershed;

pub use grow::grow_labels;
pub use significance::{clump_significance, Noise, SignificanceConfig};
pub use watershed::{watershed, Extremum, WatershedOutput};

use crate::data::{Data, DataType};
use crate::util::{GalError, GalResult};

/// Label of elements that are blank in the source.
pub const BLANK_LABEL: i32 = i32::MIN;
/// Element waiting to be labeled.
pub const INIT_LABEL: i32 = -1;
/// Boundary element between two or more clumps.
pub const RIVER_LABEL: i32 = -2;
/// Transient marker for plateau members during watershed.
pub(crate) const TMPCHECK_LABEL: i32 = -3;

pub(crate) fn require_labels(labels: &Data, context: &'static str) -> GalResult<()> {
    labels.require_type(DataType::Int32, context)
}

/// Flat indices of every positive label.
///
/// Element `l - 1` of the output lists the indices carrying label `l`, in
/// increasing order. `max_label` sizes the output; pass `0` to use the
/// largest label present.
pub fn indexes_per_label(labels: &Data, max_label: usize) -> GalResult<Vec<Vec<usize>>> {
    require_labels(labels, "indexes per label")?;
    let lab = labels.as_slice::<i32>()?;
    let max = if max_label == 0 {
        lab.iter().copied().max().unwrap_or(0).max(0) as usize
    } else {
        max_label
    };

    let mut counts = vec![0usize; max];
    for &l in lab.iter().filter(|&&l| l > 0) {
        let slot = counts.get_mut(l as usize - 1).ok_or(GalError::IndexOutOfBounds {
            index: l as usize,
            len: max + 1,
            context: "label above maximum",
        })?;
        *slot += 1;
    }
    let mut out: Vec<Vec<usize>> = counts.into_iter().map(Vec::with_capacity).collect();
    for (i, &l) in lab.iter().enumerate() {
        if l > 0 {
            out[l as usize - 1].push(i);
        }
    }
    Ok(out)
}
