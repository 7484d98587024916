use crate::data::{Data, DataView, Tile};
use crate::dimension;
use crate::trace::{trace_event, trace_span};
use crate::util::{GalError, GalResult};
use std::sync::OnceLock;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Configuration of a tessellation.
#[derive(Clone, Debug)]
pub struct TessellationConfig {
    /// Regular tile extents along every dimension.
    pub tile_size: Vec<usize>,
    /// Channel extents; `None` treats the whole block as one channel.
    pub channel_size: Option<Vec<usize>>,
    /// Remainders larger than this fraction of a regular tile are split
    /// between the first and last tile; smaller ones are merged into the
    /// first tile.
    pub remainder_frac: f64,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            tile_size: vec![50, 50],
            channel_size: None,
            remainder_frac: 0.1,
        }
    }
}

/// Tile layout along one dimension of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Axis {
    regular: usize,
    first: usize,
    last: usize,
    count: usize,
}

impl Axis {
    fn new(extent: usize, regular: usize, remainder_frac: f64) -> Self {
        let regular = regular.min(extent);
        let rem = extent % regular;
        if rem == 0 {
            Self {
                regular,
                first: regular,
                last: regular,
                count: extent / regular,
            }
        } else if rem as f64 > remainder_frac * regular as f64 {
            let first = (rem + regular) / 2;
            Self {
                regular,
                first,
                last: rem + regular - first,
                count: extent / regular + 1,
            }
        } else {
            Self {
                regular,
                first: rem + regular,
                last: regular,
                count: extent / regular,
            }
        }
    }

    fn start(&self, i: usize) -> usize {
        if i == 0 {
            0
        } else {
            self.first + (i - 1) * self.regular
        }
    }

    fn extent(&self, i: usize) -> usize {
        if i == 0 {
            self.first
        } else if i + 1 == self.count {
            self.last
        } else {
            self.regular
        }
    }

    /// Tile containing position `c`; the first tile may be wider than the rest.
    fn id_of(&self, c: usize) -> usize {
        if c < self.first {
            0
        } else {
            (1 + (c - self.first) / self.regular).min(self.count - 1)
        }
    }
}

/// Non-overlapping cover of a block by tiles, grouped into channels.
///
/// Tiles are stored channel by channel; inside a channel they follow raster
/// order. Iterating [`Tessellation::tiles`] visits every element of the
/// block exactly once.
#[derive(Clone, Debug)]
pub struct Tessellation {
    block_dsize: Vec<usize>,
    block_inc: Vec<usize>,
    channel_dsize: Vec<usize>,
    channel_grid: Vec<usize>,
    axes: Vec<Axis>,
    tiles_per_channel: usize,
    tiles: Vec<Tile>,
    pub(super) permutation: OnceLock<Vec<usize>>,
}

fn check_sizes(block_dsize: &[usize], sizes: &[usize]) -> GalResult<()> {
    if sizes.len() != block_dsize.len() {
        return Err(GalError::NdimMismatch {
            expected: block_dsize.len(),
            got: sizes.len(),
        });
    }
    if let Some(dim) = sizes.iter().position(|&s| s == 0) {
        return Err(GalError::ZeroDimension { dim });
    }
    Ok(())
}

impl Tessellation {
    /// Covers the whole block with tiles of `tile_size`.
    pub fn full(block_dsize: &[usize], tile_size: &[usize], remainder_frac: f64) -> GalResult<Self> {
        Self::two_layer(block_dsize, block_dsize, tile_size, remainder_frac)
    }

    /// Splits the block into channels of `channel_size`, then covers every
    /// channel with tiles of `tile_size`.
    ///
    /// Channel extents larger than the block are clamped to it; after
    /// clamping they must divide the block exactly.
    pub fn two_layer(
        block_dsize: &[usize],
        channel_size: &[usize],
        tile_size: &[usize],
        remainder_frac: f64,
    ) -> GalResult<Self> {
        dimension::total_size(block_dsize)?;
        check_sizes(block_dsize, channel_size)?;
        check_sizes(block_dsize, tile_size)?;
        let ndim = block_dsize.len();

        let channel_dsize: Vec<usize> = channel_size
            .iter()
            .zip(block_dsize)
            .map(|(&c, &b)| c.min(b))
            .collect();
        for dim in 0..ndim {
            if block_dsize[dim] % channel_dsize[dim] != 0 {
                return Err(GalError::NotDivisible {
                    dim,
                    size: channel_dsize[dim],
                    parent: block_dsize[dim],
                });
            }
        }
        let channel_grid: Vec<usize> = block_dsize
            .iter()
            .zip(&channel_dsize)
            .map(|(b, c)| b / c)
            .collect();
        let axes: Vec<Axis> = channel_dsize
            .iter()
            .zip(tile_size)
            .map(|(&c, &t)| Axis::new(c, t, remainder_frac))
            .collect();

        let _span = trace_span!("tessellation", ndim = ndim).entered();
        let tiles_per_channel: usize = axes.iter().map(|a| a.count).product();
        let num_channels: usize = channel_grid.iter().product();
        let local_grid: Vec<usize> = axes.iter().map(|a| a.count).collect();

        let mut tiles = Vec::with_capacity(num_channels * tiles_per_channel);
        let mut ch_coord = vec![0usize; ndim];
        let mut local = vec![0usize; ndim];
        let mut start = vec![0usize; ndim];
        for ch in 0..num_channels {
            dimension::index_to_coord(ch, &channel_grid, &mut ch_coord);
            for t in 0..tiles_per_channel {
                dimension::index_to_coord(t, &local_grid, &mut local);
                let mut tile_dsize = Vec::with_capacity(ndim);
                for d in 0..ndim {
                    start[d] = ch_coord[d] * channel_dsize[d] + axes[d].start(local[d]);
                    tile_dsize.push(axes[d].extent(local[d]));
                }
                tiles.push(Tile::from_raw(
                    dimension::coord_to_index(block_dsize, &start),
                    tile_dsize,
                ));
            }
        }
        trace_event!(
            "tessellation_built",
            channels = num_channels,
            tiles = tiles.len()
        );

        Ok(Self {
            block_dsize: block_dsize.to_vec(),
            block_inc: dimension::increments(block_dsize),
            channel_dsize,
            channel_grid,
            axes,
            tiles_per_channel,
            tiles,
            permutation: OnceLock::new(),
        })
    }

    /// Builds a tessellation from a configuration.
    pub fn from_config(block_dsize: &[usize], cfg: &TessellationConfig) -> GalResult<Self> {
        match &cfg.channel_size {
            Some(channel) => Self::two_layer(block_dsize, channel, &cfg.tile_size, cfg.remainder_frac),
            None => Self::full(block_dsize, &cfg.tile_size, cfg.remainder_frac),
        }
    }

    pub fn block_dsize(&self) -> &[usize] {
        &self.block_dsize
    }

    pub fn channel_dsize(&self) -> &[usize] {
        &self.channel_dsize
    }

    /// Number of channels along every dimension.
    pub fn channel_grid(&self) -> &[usize] {
        &self.channel_grid
    }

    pub fn num_channels(&self) -> usize {
        self.channel_grid.iter().product()
    }

    pub fn tiles_per_channel(&self) -> usize {
        self.tiles_per_channel
    }

    /// Number of tiles of one channel along every dimension.
    pub fn channel_tile_grid(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.count).collect()
    }

    /// Number of tiles over the whole block along every dimension.
    pub fn grid_dsize(&self) -> Vec<usize> {
        self.axes
            .iter()
            .zip(&self.channel_grid)
            .map(|(a, c)| a.count * c)
            .collect()
    }

    /// Tiles in storage order (channel by channel).
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Borrowed view of tile `id` over `block`.
    pub fn view<'a>(&self, block: &'a Data, id: usize) -> GalResult<DataView<'a>> {
        self.check_block(block)?;
        let tile = self.tiles.get(id).ok_or(GalError::IndexOutOfBounds {
            index: id,
            len: self.tiles.len(),
            context: "tile id",
        })?;
        DataView::new(block, tile.clone())
    }

    /// Storage-order id of the tile containing `coord`.
    pub fn tile_id_of_coord(&self, coord: &[usize]) -> GalResult<usize> {
        if coord.len() != self.block_dsize.len() {
            return Err(GalError::NdimMismatch {
                expected: self.block_dsize.len(),
                got: coord.len(),
            });
        }
        let ndim = coord.len();
        let mut ch = vec![0usize; ndim];
        let mut local = vec![0usize; ndim];
        for d in 0..ndim {
            if coord[d] >= self.block_dsize[d] {
                return Err(GalError::IndexOutOfBounds {
                    index: coord[d],
                    len: self.block_dsize[d],
                    context: "tile coordinate",
                });
            }
            ch[d] = coord[d] / self.channel_dsize[d];
            local[d] = self.axes[d].id_of(coord[d] % self.channel_dsize[d]);
        }
        let ch_id = dimension::coord_to_index(&self.channel_grid, &ch);
        let local_id = dimension::coord_to_index(&self.channel_tile_grid(), &local);
        Ok(ch_id * self.tiles_per_channel + local_id)
    }

    /// Storage-order id of the tile containing flat block index `index`.
    pub fn tile_id_of_index(&self, index: usize) -> GalResult<usize> {
        let mut coord = vec![0usize; self.block_dsize.len()];
        dimension::index_to_coord_inc(index, &self.block_inc, &mut coord);
        self.tile_id_of_coord(&coord)
    }

    /// Evaluates `f` on every tile, returning the results in storage order.
    ///
    /// With the `rayon` feature and `parallel` set, tiles are distributed
    /// over the rayon pool; the output order does not change.
    pub fn map_tiles<R, F>(&self, parallel: bool, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize, &Tile) -> R + Sync + Send,
    {
        #[cfg(feature = "rayon")]
        if parallel {
            return self
                .tiles
                .par_iter()
                .enumerate()
                .map(|(i, t)| f(i, t))
                .collect();
        }
        #[cfg(not(feature = "rayon"))]
        let _ = parallel;
        self.tiles.iter().enumerate().map(|(i, t)| f(i, t)).collect()
    }

    pub(super) fn check_block(&self, block: &Data) -> GalResult<()> {
        if block.dsize() != self.block_dsize.as_slice() {
            return Err(GalError::SizeMismatch {
                expected: dimension::total_size(&self.block_dsize)?,
                got: block.size(),
                context: "tessellation block",
            });
        }
        Ok(())
    }

    pub(super) fn check_values(&self, len: usize) -> GalResult<()> {
        if len != self.tiles.len() {
            return Err(GalError::SizeMismatch {
                expected: self.tiles.len(),
                got: len,
                context: "per-tile values",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Axis;

    #[test]
    fn large_remainder_is_split() {
        let a = Axis::new(10, 3, 0.1);
        assert_eq!(a.count, 4);
        assert_eq!((0..4).map(|i| a.extent(i)).collect::<Vec<_>>(), vec![2, 3, 3, 2]);
    }

    #[test]
    fn small_remainder_is_merged_into_first() {
        let a = Axis::new(10, 3, 0.5);
        assert_eq!(a.count, 3);
        assert_eq!((0..3).map(|i| a.extent(i)).collect::<Vec<_>>(), vec![4, 3, 3]);
        assert_eq!(a.id_of(3), 0);
        assert_eq!(a.id_of(4), 1);
        assert_eq!(a.id_of(9), 2);
    }

    #[test]
    fn oversized_tile_is_clamped() {
        let a = Axis::new(7, 100, 0.1);
        assert_eq!((a.count, a.first), (1, 7));
    }
}
