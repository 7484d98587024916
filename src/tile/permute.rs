//! Conversion between storage order and raster order of per-tile values.

use super::Tessellation;
use crate::dimension;
use crate::util::GalResult;

impl Tessellation {
    /// Raster-order tile index of every storage-order tile.
    ///
    /// `permutation()[i]` is the position, in raster order over the whole
    /// block, of the `i`-th stored tile. Computed once and cached.
    pub fn permutation(&self) -> &[usize] {
        self.permutation.get_or_init(|| {
            let ndim = self.block_dsize().len();
            let grid = self.grid_dsize();
            let local_grid = self.channel_tile_grid();
            let per_channel = self.tiles_per_channel();
            let mut ch = vec![0usize; ndim];
            let mut local = vec![0usize; ndim];
            let mut global = vec![0usize; ndim];
            (0..self.len())
                .map(|id| {
                    dimension::index_to_coord(id / per_channel, self.channel_grid(), &mut ch);
                    dimension::index_to_coord(id % per_channel, &local_grid, &mut local);
                    for d in 0..ndim {
                        global[d] = ch[d] * local_grid[d] + local[d];
                    }
                    dimension::coord_to_index(&grid, &global)
                })
                .collect()
        })
    }

    /// Reorders storage-order per-tile values into raster order.
    pub fn to_raster<T: Clone>(&self, values: &[T]) -> GalResult<Vec<T>> {
        self.check_values(values.len())?;
        let perm = self.permutation();
        let mut out = values.to_vec();
        for (i, v) in values.iter().enumerate() {
            out[perm[i]] = v.clone();
        }
        Ok(out)
    }

    /// Reorders raster-order per-tile values back into storage order.
    pub fn from_raster<T: Clone>(&self, values: &[T]) -> GalResult<Vec<T>> {
        self.check_values(values.len())?;
        Ok(self.permutation().iter().map(|&r| values[r].clone()).collect())
    }
}
