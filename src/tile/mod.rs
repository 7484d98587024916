//! Tiling of arrays into channels and tiles.
//!
//! A [`Tessellation`] covers a block with non-overlapping tiles. Tiles are
//! offsets into the block, not copies; per-tile measurements are kept as
//! one value per tile in the tessellation's storage order (channel by
//! channel) and can be permuted into raster order over the whole block.

pub mod interpolate;
mod permute;
mod tessellation;
pub mod values;

pub use interpolate::fill_blank_neighbors;
pub use tessellation::{Tessellation, TessellationConfig};
pub use values::smooth;
