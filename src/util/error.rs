//! Error types for galdata.

use crate::data::DataType;
use thiserror::Error;

/// Result alias for galdata operations.
pub type GalResult<T> = std::result::Result<T, GalError>;

/// Errors that can occur when allocating, tiling, labeling or matching arrays.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GalError {
    /// A dimension was requested with zero length.
    #[error("dimension {dim} has zero length")]
    ZeroDimension { dim: usize },
    /// Two arrays that must share a dimensionality do not.
    #[error("dimensionality mismatch: expected {expected}, got {got}")]
    NdimMismatch { expected: usize, got: usize },
    /// A channel (or other partition) does not evenly divide its parent.
    #[error("size {size} along dimension {dim} does not evenly divide {parent}")]
    NotDivisible {
        dim: usize,
        size: usize,
        parent: usize,
    },
    /// Any other shape violation.
    #[error("invalid shape: {reason}")]
    InvalidShape { reason: &'static str },
    /// The total element count does not fit in `usize`.
    #[error("element count of {dsize:?} overflows")]
    SizeOverflow { dsize: Vec<usize> },
    /// Two operands (or an operand and its metadata) disagree in size.
    #[error("{context}: expected {expected} elements, got {got}")]
    SizeMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// The array element type is not the one an algorithm requires.
    #[error("{context}: expected {expected} data, got {got}")]
    TypeMismatch {
        expected: DataType,
        got: DataType,
        context: &'static str,
    },
    /// RAM or disk-backed allocation failed.
    #[error("allocation failed: {reason}")]
    Allocation { reason: String },
    /// The input parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// An index (tile, label, dimension) is outside its valid range.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// Reading or writing an external file failed.
    #[error("i/o error: {reason}")]
    Io { reason: String },
}
