//! Erosion, dilation, opening and closing.
//!
//! Each pass marks flipping pixels with a temporary value and only commits
//! them after the whole array has been scanned, so a pass behaves as if it
//! were applied to a snapshot taken before it started.

use crate::binary::{require_binary, TMP_VALUE};
use crate::data::Data;
use crate::dimension::Neighbors;
use crate::trace::trace_span;
use crate::util::GalResult;

/// Which value grows into the other.
#[derive(Clone, Copy)]
enum Direction {
    /// Foreground next to background turns into background.
    Erode,
    /// Background next to foreground turns into foreground.
    Dilate,
}

impl Direction {
    /// `(value that may flip, value that triggers the flip)`.
    fn values(self) -> (u8, u8) {
        match self {
            Direction::Erode => (1, 0),
            Direction::Dilate => (0, 1),
        }
    }
}

fn mark_2d_4(arr: &mut [u8], nr: usize, nc: usize, from: u8, to: u8) {
    for r in 0..nr {
        for c in 0..nc {
            let i = r * nc + c;
            if arr[i] != from {
                continue;
            }
            let hit = (c > 0 && arr[i - 1] == to)
                || (c + 1 < nc && arr[i + 1] == to)
                || (r > 0 && arr[i - nc] == to)
                || (r + 1 < nr && arr[i + nc] == to);
            if hit {
                arr[i] = TMP_VALUE;
            }
        }
    }
}

fn mark_2d_8(arr: &mut [u8], nr: usize, nc: usize, from: u8, to: u8) {
    for r in 0..nr {
        for c in 0..nc {
            let i = r * nc + c;
            if arr[i] != from {
                continue;
            }
            let (left, right) = (c > 0, c + 1 < nc);
            let (up, down) = (r > 0, r + 1 < nr);
            let hit = (left && arr[i - 1] == to)
                || (right && arr[i + 1] == to)
                || (up && arr[i - nc] == to)
                || (down && arr[i + nc] == to)
                || (up && left && arr[i - nc - 1] == to)
                || (up && right && arr[i - nc + 1] == to)
                || (down && left && arr[i + nc - 1] == to)
                || (down && right && arr[i + nc + 1] == to);
            if hit {
                arr[i] = TMP_VALUE;
            }
        }
    }
}

fn mark_generic(arr: &mut [u8], neighbors: &Neighbors, from: u8, to: u8) {
    for i in 0..arr.len() {
        if arr[i] == from && neighbors.any(i, |n| arr[n] == to) {
            arr[i] = TMP_VALUE;
        }
    }
}

fn erode_dilate(
    input: &mut Data,
    iterations: usize,
    connectivity: usize,
    direction: Direction,
) -> GalResult<()> {
    require_binary(input, "binary morphology")?;
    let dsize = input.dsize().to_vec();
    let neighbors = Neighbors::new(&dsize, connectivity)?;
    let (from, to) = direction.values();
    let arr = input.as_mut_slice::<u8>()?;
    for _ in 0..iterations {
        match (dsize.len(), connectivity) {
            (2, 1) => mark_2d_4(arr, dsize[0], dsize[1], from, to),
            (2, 2) => mark_2d_8(arr, dsize[0], dsize[1], from, to),
            _ => mark_generic(arr, &neighbors, from, to),
        }
        for v in arr.iter_mut() {
            if *v == TMP_VALUE {
                *v = to;
            }
        }
    }
    Ok(())
}

/// Erodes `input` in place `iterations` times.
pub fn erode_inplace(input: &mut Data, iterations: usize, connectivity: usize) -> GalResult<()> {
    let _span = trace_span!("erode", iterations = iterations).entered();
    erode_dilate(input, iterations, connectivity, Direction::Erode)
}

/// Dilates `input` in place `iterations` times.
pub fn dilate_inplace(input: &mut Data, iterations: usize, connectivity: usize) -> GalResult<()> {
    let _span = trace_span!("dilate", iterations = iterations).entered();
    erode_dilate(input, iterations, connectivity, Direction::Dilate)
}

/// Returns an eroded copy of `input`.
pub fn erode(input: &Data, iterations: usize, connectivity: usize) -> GalResult<Data> {
    let mut out = input.copy()?;
    erode_inplace(&mut out, iterations, connectivity)?;
    Ok(out)
}

/// Returns a dilated copy of `input`.
pub fn dilate(input: &Data, iterations: usize, connectivity: usize) -> GalResult<Data> {
    let mut out = input.copy()?;
    dilate_inplace(&mut out, iterations, connectivity)?;
    Ok(out)
}

/// Opening in place: erosion followed by dilation of the same buffer.
pub fn open_inplace(input: &mut Data, iterations: usize, connectivity: usize) -> GalResult<()> {
    erode_inplace(input, iterations, connectivity)?;
    dilate_inplace(input, iterations, connectivity)
}

/// Returns the opening of `input`.
pub fn open(input: &Data, iterations: usize, connectivity: usize) -> GalResult<Data> {
    let mut out = input.copy()?;
    open_inplace(&mut out, iterations, connectivity)?;
    Ok(out)
}

/// Returns the closing of `input`: dilation followed by erosion.
pub fn close(input: &Data, iterations: usize, connectivity: usize) -> GalResult<Data> {
    let mut out = input.copy()?;
    dilate_inplace(&mut out, iterations, connectivity)?;
    erode_inplace(&mut out, iterations, connectivity)?;
    Ok(out)
}
