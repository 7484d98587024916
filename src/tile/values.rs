//! Per-tile values: writing them back over a block and smoothing them.

use super::Tessellation;
use crate::data::types::with_buffer;
use crate::data::{Data, DataType, Element, Init, Tile};
use crate::dimension;
use crate::util::{GalError, GalResult};

/// Fills every element covered by `tiles[i]` with `values[i]`.
///
/// The output has extents `block_dsize` and the type of `values`. Elements
/// not covered by any tile are blank when `blank_pad` is set and zero
/// otherwise.
pub fn write_constant_per_tile(
    values: &Data,
    tiles: &[Tile],
    block_dsize: &[usize],
    blank_pad: bool,
) -> GalResult<Data> {
    if values.size() != tiles.len() {
        return Err(GalError::SizeMismatch {
            expected: tiles.len(),
            got: values.size(),
            context: "per-tile values",
        });
    }
    let init = if blank_pad { Init::Blank } else { Init::Zeros };
    let mut out = Data::alloc(values.dtype(), block_dsize, &values.alloc_options(init))?;
    let size = values.size();
    with_buffer!(values.buffer(),
        src => fill(&src[..size], tiles, block_dsize, &mut out)?,
        string(_strs) => return Err(GalError::TypeMismatch {
            expected: DataType::Float64,
            got: DataType::String,
            context: "per-tile values",
        })
    );
    out.name = values.name.clone();
    out.unit = values.unit.clone();
    Ok(out)
}

fn fill<T: Element>(src: &[T], tiles: &[Tile], block_dsize: &[usize], out: &mut Data) -> GalResult<()> {
    let dst = out.as_mut_slice::<T>()?;
    let len = dst.len();
    for (tile, &v) in tiles.iter().zip(src) {
        for i in tile.indices(block_dsize) {
            let slot = dst.get_mut(i).ok_or(GalError::IndexOutOfBounds {
                index: i,
                len,
                context: "tile outside block",
            })?;
            *slot = v;
        }
    }
    Ok(())
}

impl Tessellation {
    /// Expands storage-order per-tile values into a full block.
    pub fn values_to_block(&self, values: &Data) -> GalResult<Data> {
        self.check_values(values.size())?;
        write_constant_per_tile(values, self.tiles(), self.block_dsize(), false)
    }
}

/// Blank-aware mean over a `width`-wide window of neighbouring tiles.
///
/// `values` holds one numeric value per tile in storage order; the window
/// runs over the raster grid of the whole block, so it crosses channel
/// borders. Blank tiles are ignored; a tile whose whole window is blank
/// stays blank. Returns `Float64` values in storage order.
pub fn smooth(tess: &Tessellation, values: &Data, width: usize) -> GalResult<Data> {
    if width == 0 || width % 2 == 0 {
        return Err(GalError::InvalidInput("smoothing width must be odd"));
    }
    tess.check_values(values.size())?;
    let raster = tess.to_raster(&values.to_f64_vec()?)?;
    let grid = tess.grid_dsize();
    let half = width / 2;
    let mut coord = vec![0usize; grid.len()];
    let mut start = vec![0usize; grid.len()];
    let mut extent = vec![0usize; grid.len()];
    let mut smoothed = Vec::with_capacity(raster.len());
    for i in 0..raster.len() {
        dimension::index_to_coord(i, &grid, &mut coord);
        for d in 0..grid.len() {
            start[d] = coord[d].saturating_sub(half);
            extent[d] = (coord[d] + half + 1).min(grid[d]) - start[d];
        }
        let window = Tile::new(&grid, &start, &extent)?;
        let (sum, n) = window
            .indices(&grid)
            .map(|j| raster[j])
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        smoothed.push(if n == 0 { f64::NAN } else { sum / n as f64 });
    }
    let out = tess.from_raster(&smoothed)?;
    let len = out.len();
    let mut data = Data::from_vec(out, &[len])?;
    data.name = values.name.clone();
    Ok(data)
}
