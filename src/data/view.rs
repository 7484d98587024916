//! Zero-copy tiles into a block.
//!
//! A [`Tile`] is an offset-based description (flat start index plus extents)
//! of a rectangular region of some block; it holds no reference to the block
//! itself. A [`DataView`] pairs a tile with a borrowed block, which lets the
//! borrow checker enforce that the block outlives every view into it.

use crate::data::{Data, DataType, Element};
use crate::dimension;
use crate::util::{GalError, GalResult};

/// Rectangular region of a block, described by offset and extents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    start: usize,
    dsize: Vec<usize>,
    size: usize,
}

impl Tile {
    /// Creates a tile at `start` (coordinates) with extents `dsize` inside a
    /// block of extents `block_dsize`.
    pub fn new(block_dsize: &[usize], start: &[usize], dsize: &[usize]) -> GalResult<Self> {
        let ndim = block_dsize.len();
        if start.len() != ndim {
            return Err(GalError::NdimMismatch {
                expected: ndim,
                got: start.len(),
            });
        }
        if dsize.len() != ndim {
            return Err(GalError::NdimMismatch {
                expected: ndim,
                got: dsize.len(),
            });
        }
        let size = dimension::total_size(dsize)?;
        for d in 0..ndim {
            let end = start[d]
                .checked_add(dsize[d])
                .ok_or(GalError::InvalidShape {
                    reason: "tile end overflows",
                })?;
            if end > block_dsize[d] {
                return Err(GalError::IndexOutOfBounds {
                    index: end - 1,
                    len: block_dsize[d],
                    context: "tile end",
                });
            }
        }
        Ok(Self {
            start: dimension::coord_to_index(block_dsize, start),
            dsize: dsize.to_vec(),
            size,
        })
    }

    pub(crate) fn from_raw(start: usize, dsize: Vec<usize>) -> Self {
        let size = dsize.iter().product();
        Self { start, dsize, size }
    }

    /// Flat index of the first element inside the block.
    pub fn start_index(&self) -> usize {
        self.start
    }

    pub fn dsize(&self) -> &[usize] {
        &self.dsize
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Starting coordinate and exclusive end coordinate within the block.
    pub fn start_end(&self, block_dsize: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let mut start = vec![0; block_dsize.len()];
        dimension::index_to_coord(self.start, block_dsize, &mut start);
        let end = start
            .iter()
            .zip(&self.dsize)
            .map(|(s, n)| s + n)
            .collect();
        (start, end)
    }

    /// Flat indices of the first and last (inclusive) elements in the block.
    pub fn start_end_index(&self, block_dsize: &[usize]) -> (usize, usize) {
        let (start, end) = self.start_end(block_dsize);
        let last: Vec<usize> = end.iter().map(|e| e - 1).collect();
        (
            dimension::coord_to_index(block_dsize, &start),
            dimension::coord_to_index(block_dsize, &last),
        )
    }

    /// Iterates over the block indices covered by this tile in row-major order.
    pub fn indices<'a>(&'a self, block_dsize: &'a [usize]) -> TileIndices<'a> {
        TileIndices::new(self, block_dsize)
    }
}

/// Iterator over the block indices of a tile.
pub struct TileIndices<'a> {
    tile_dsize: &'a [usize],
    block_inc: Vec<usize>,
    coord: Vec<usize>,
    row_start: usize,
    col: usize,
    remaining: usize,
}

impl<'a> TileIndices<'a> {
    fn new(tile: &'a Tile, block_dsize: &'a [usize]) -> Self {
        Self {
            tile_dsize: &tile.dsize,
            block_inc: dimension::increments(block_dsize),
            coord: vec![0; tile.dsize.len()],
            row_start: tile.start,
            col: 0,
            remaining: tile.size,
        }
    }
}

impl Iterator for TileIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let ndim = self.tile_dsize.len();
        let out = self.row_start + self.col;
        self.col += 1;
        if self.col == self.tile_dsize[ndim - 1] && self.remaining > 0 {
            // Move to the next row of the tile, carrying into slower dimensions.
            self.col = 0;
            let mut d = ndim - 1;
            loop {
                if d == 0 {
                    break;
                }
                d -= 1;
                self.coord[d] += 1;
                self.row_start += self.block_inc[d];
                if self.coord[d] < self.tile_dsize[d] {
                    break;
                }
                self.row_start -= self.coord[d] * self.block_inc[d];
                self.coord[d] = 0;
            }
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TileIndices<'_> {}

/// Borrowed tile of a block array.
#[derive(Clone)]
pub struct DataView<'a> {
    block: &'a Data,
    tile: Tile,
}

impl<'a> DataView<'a> {
    pub fn new(block: &'a Data, tile: Tile) -> GalResult<Self> {
        if tile.dsize.len() != block.ndim() {
            return Err(GalError::NdimMismatch {
                expected: block.ndim(),
                got: tile.dsize.len(),
            });
        }
        if tile.start >= block.size() {
            return Err(GalError::IndexOutOfBounds {
                index: tile.start,
                len: block.size(),
                context: "tile start",
            });
        }
        let (_, end) = tile.start_end(block.dsize());
        if end.iter().zip(block.dsize()).any(|(e, n)| e > n) {
            return Err(GalError::InvalidShape {
                reason: "tile exceeds its block",
            });
        }
        Ok(Self { block, tile })
    }

    /// The owning block.
    pub fn block(&self) -> &'a Data {
        self.block
    }

    pub fn tile(&self) -> &Tile {
        &self.tile
    }

    pub fn dtype(&self) -> DataType {
        self.block.dtype()
    }

    pub fn dsize(&self) -> &[usize] {
        &self.tile.dsize
    }

    pub fn size(&self) -> usize {
        self.tile.size
    }

    pub fn start_end(&self) -> (Vec<usize>, Vec<usize>) {
        self.tile.start_end(self.block.dsize())
    }

    pub fn start_end_index(&self) -> (usize, usize) {
        self.tile.start_end_index(self.block.dsize())
    }

    pub fn indices(&self) -> TileIndices<'_> {
        self.tile.indices(self.block.dsize())
    }

    /// Iterates over the viewed values of type `T`.
    pub fn values<T: Element>(&self) -> GalResult<impl Iterator<Item = T> + '_> {
        let data = self.block.as_slice::<T>()?;
        Ok(self.indices().map(move |i| data[i]))
    }

    /// Contiguous copy of the viewed region, keeping the block's type.
    pub fn to_data(&self) -> GalResult<Data> {
        self.to_data_as(self.dtype())
    }

    /// Contiguous copy of the viewed region converted to `dtype`.
    pub fn to_data_as(&self, dtype: DataType) -> GalResult<Data> {
        let indices: Vec<usize> = self.indices().collect();
        let mut out = crate::data::convert::gather(self.block, &indices, dtype)?;
        out.reshape(&self.tile.dsize)?;
        out.copy_meta_from(self.block);
        if let Some(wcs) = out.wcs.as_mut() {
            let (start, _) = self.start_end();
            wcs.shift_reference(&start);
        }
        Ok(out)
    }
}

impl Data {
    /// Zero-copy view of the region starting at `start` with extents `dsize`.
    pub fn tile(&self, start: &[usize], dsize: &[usize]) -> GalResult<DataView<'_>> {
        let tile = Tile::new(self.dsize(), start, dsize)?;
        DataView::new(self, tile)
    }

    /// View covering the whole array.
    pub fn whole(&self) -> DataView<'_> {
        DataView {
            block: self,
            tile: Tile::from_raw(0, self.dsize().to_vec()),
        }
    }
}
