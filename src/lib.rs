//! galdata is an N-dimensional typed-array engine for astronomical images.
//!
//! It provides runtime-typed arrays with blank values and optional
//! disk-backed storage, element-wise arithmetic, binary morphology and
//! connected components, tessellation into channels and tiles, watershed
//! segmentation with clump significance, and aperture-based coordinate
//! matching. Parallelism is available through the `rayon` feature and
//! structured logging through the `tracing` feature.

pub mod arith;
pub mod binary;
pub mod data;
pub mod dimension;
pub mod io;
pub mod label;
pub mod matching;
pub mod tile;
mod trace;
pub mod util;

pub use arith::{binary, multioperand, unary, BinaryOp, MultiOperand, UnaryOp};
pub use data::{AllocOptions, Buffer, Data, DataType, DataView, Element, Init, Tile, Wcs};
pub use dimension::{collapse, Collapse, Neighbors};
pub use label::{watershed, Extremum, Noise};
pub use matching::{match_coordinates, Aperture, MatchConfig, MatchOutput};
pub use tile::{Tessellation, TessellationConfig};
pub use util::{GalError, GalResult};
