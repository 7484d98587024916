//! Filling blank per-tile values from their nearest non-blank neighbours.

use super::Tessellation;
use crate::data::Data;
use crate::dimension::Neighbors;
use crate::trace::{trace_event, trace_span};
use crate::util::{GalError, GalResult};
use std::collections::VecDeque;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Per-worker breadth-first search state, sized to the tile grid.
struct Scratch {
    visited: Vec<bool>,
    touched: Vec<usize>,
    queue: VecDeque<usize>,
    found: Vec<f64>,
}

impl Scratch {
    fn new(len: usize) -> Self {
        Self {
            visited: vec![false; len],
            touched: Vec::new(),
            queue: VecDeque::new(),
            found: Vec::new(),
        }
    }

    fn reset(&mut self) {
        for &i in &self.touched {
            self.visited[i] = false;
        }
        self.touched.clear();
        self.queue.clear();
        self.found.clear();
    }

    fn visit(&mut self, i: usize) {
        if !self.visited[i] {
            self.visited[i] = true;
            self.touched.push(i);
            self.queue.push_back(i);
        }
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Median of the `count` nearest non-blank tiles around raster tile `start`.
fn interpolate_one(
    raster: &[f64],
    neighbors: &Neighbors,
    start: usize,
    count: usize,
    scratch: &mut Scratch,
) -> f64 {
    scratch.reset();
    scratch.visit(start);
    while let Some(i) = scratch.queue.pop_front() {
        if !raster[i].is_nan() {
            scratch.found.push(raster[i]);
            if scratch.found.len() == count {
                break;
            }
        }
        neighbors.for_each(i, |n| scratch.visit(n));
    }
    if scratch.found.is_empty() {
        f64::NAN
    } else {
        median(&mut scratch.found)
    }
}

/// Replaces blank per-tile values with the median of their `count` nearest
/// non-blank tiles on the raster grid of the whole block.
///
/// `values` holds one numeric value per tile in storage order. Returns
/// `Float64` values in the same order. Non-blank tiles are copied unchanged;
/// when every tile is blank the output stays blank.
pub fn fill_blank_neighbors(
    tess: &Tessellation,
    values: &Data,
    count: usize,
    parallel: bool,
) -> GalResult<Data> {
    if count == 0 {
        return Err(GalError::InvalidInput("interpolation needs at least one neighbour"));
    }
    let _span = trace_span!("interpolate", tiles = tess.len(), count = count).entered();
    let raster = tess.to_raster(&values.to_f64_vec()?)?;
    let grid = tess.grid_dsize();
    let neighbors = Neighbors::new(&grid, 1)?;
    let blanks: Vec<usize> = (0..raster.len()).filter(|&i| raster[i].is_nan()).collect();

    #[cfg(feature = "rayon")]
    let filled: Vec<f64> = if parallel {
        blanks
            .par_iter()
            .map_init(
                || Scratch::new(raster.len()),
                |scratch, &i| interpolate_one(&raster, &neighbors, i, count, scratch),
            )
            .collect()
    } else {
        let mut scratch = Scratch::new(raster.len());
        blanks
            .iter()
            .map(|&i| interpolate_one(&raster, &neighbors, i, count, &mut scratch))
            .collect()
    };
    #[cfg(not(feature = "rayon"))]
    let filled: Vec<f64> = {
        let _ = parallel;
        let mut scratch = Scratch::new(raster.len());
        blanks
            .iter()
            .map(|&i| interpolate_one(&raster, &neighbors, i, count, &mut scratch))
            .collect()
    };

    let mut out = raster;
    for (&i, v) in blanks.iter().zip(filled) {
        out[i] = v;
    }
    trace_event!("interpolated", blank_tiles = blanks.len());
    let stored = tess.from_raster(&out)?;
    let len = stored.len();
    let mut data = Data::from_vec(stored, &[len])?;
    data.name = values.name.clone();
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::median;

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&mut [5.0, 1.0, 3.0]), 3.0);
    }
}
