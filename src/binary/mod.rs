//! Operations on binary (`UInt8`, values 0/1) arrays.
//!
//! Blank elements (`u8::MAX`) are neither foreground nor background: they
//! never flip during morphology and never join a connected component.

mod components;
mod holes;
mod morph;

pub use components::{connected_adjacency_matrix, connected_components, connected_indexes};
pub use holes::holes_fill;
pub use morph::{close, dilate, dilate_inplace, erode, erode_inplace, open, open_inplace};

use crate::data::{Data, DataType};
use crate::util::GalResult;

/// Transient marker for pixels flipped during the current pass.
pub(crate) const TMP_VALUE: u8 = u8::MAX - 1;

/// Blank value of binary arrays.
pub const BINARY_BLANK: u8 = u8::MAX;

pub(crate) fn require_binary(input: &Data, context: &'static str) -> GalResult<()> {
    input.require_type(DataType::UInt8, context)
}
