//! Reduction of an N-D array along one dimension.

use crate::data::types::with_buffer;
use crate::data::{AllocOptions, Data, DataType, Element, Init, Storage};
use crate::dimension::increments;
use crate::util::{GalError, GalResult};

/// Reduction applied along the collapsed dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collapse {
    /// Weighted sum (`Float64`); blank when every contributor is blank.
    Sum,
    /// Weighted mean (`Float64`); blank when every contributor is blank.
    Mean,
    /// Number of non-blank contributors (`UInt32`).
    Number,
    /// Minimum, in the input type.
    Min,
    /// Maximum, in the input type.
    Max,
}

/// Collapses `input` along dimension `dim` (slowest-first numbering).
///
/// Blank elements contribute neither to sums nor counts. `weight`, when
/// given, must have one entry per element of dimension `dim` and applies to
/// `Sum` and `Mean` only. The output loses dimension `dim` (a 1-D input
/// collapses to a single element) and its WCS loses the matching axis.
pub fn collapse(input: &Data, dim: usize, op: Collapse, weight: Option<&[f64]>) -> GalResult<Data> {
    let ndim = input.ndim();
    if dim >= ndim {
        return Err(GalError::IndexOutOfBounds {
            index: dim,
            len: ndim,
            context: "collapse dimension",
        });
    }
    let dsize = input.dsize();
    if let Some(w) = weight {
        if w.len() != dsize[dim] {
            return Err(GalError::SizeMismatch {
                expected: dsize[dim],
                got: w.len(),
                context: "collapse weight",
            });
        }
    }
    let mut out_dsize: Vec<usize> = dsize
        .iter()
        .enumerate()
        .filter(|&(d, _)| d != dim)
        .map(|(_, &n)| n)
        .collect();
    if out_dsize.is_empty() {
        out_dsize.push(1);
    }
    let inc = increments(dsize);
    let line = Line {
        inc: inc[dim],
        len: dsize[dim],
    };
    let opts = input.alloc_options(Init::Zeros);

    let mut out = match op {
        Collapse::Sum | Collapse::Mean => {
            let values = input.to_f64_vec()?;
            let reduced = sum_mean(&values, &line, weight, op == Collapse::Mean);
            build(reduced, &out_dsize, &opts)?
        }
        Collapse::Number => {
            let values = input.to_f64_vec()?;
            let mut counts = vec![0u32; values.len() / line.len];
            for (i, v) in values.iter().enumerate() {
                if !v.is_nan() {
                    counts[line.output_index(i)] += 1;
                }
            }
            build(counts, &out_dsize, &opts)?
        }
        Collapse::Min | Collapse::Max => {
            let want_max = op == Collapse::Max;
            with_buffer!(input.buffer(),
                s => build(extremum(&s[..input.size()], &line, want_max), &out_dsize, &opts)?,
                string(_v) => return Err(GalError::TypeMismatch {
                    expected: DataType::Float64,
                    got: DataType::String,
                    context: "collapse",
                }))
        }
    };
    out.name = input.name.clone();
    out.unit = input.unit.clone();
    if let Some(mut wcs) = input.wcs.clone() {
        if ndim > 1 {
            wcs.remove_axis(dim);
        }
        out.wcs = Some(wcs);
    }
    Ok(out)
}

/// Geometry of one reduction line.
struct Line {
    inc: usize,
    len: usize,
}

impl Line {
    #[inline]
    fn output_index(&self, i: usize) -> usize {
        (i / (self.inc * self.len)) * self.inc + i % self.inc
    }

    #[inline]
    fn position(&self, i: usize) -> usize {
        (i / self.inc) % self.len
    }
}

fn sum_mean(values: &[f64], line: &Line, weight: Option<&[f64]>, mean: bool) -> Vec<f64> {
    let n = values.len() / line.len;
    let mut sum = vec![0.0f64; n];
    let mut norm = vec![0.0f64; n];
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        let o = line.output_index(i);
        let w = weight.map_or(1.0, |w| w[line.position(i)]);
        sum[o] += v * w;
        norm[o] += w;
    }
    sum.iter()
        .zip(&norm)
        .map(|(&s, &c)| {
            if c == 0.0 {
                f64::NAN
            } else if mean {
                s / c
            } else {
                s
            }
        })
        .collect()
}

fn extremum<T: Element>(values: &[T], line: &Line, want_max: bool) -> Vec<T> {
    let n = values.len() / line.len;
    let mut out = vec![T::BLANK; n];
    for (i, &v) in values.iter().enumerate() {
        if v.is_blank() {
            continue;
        }
        let o = line.output_index(i);
        let cur = out[o];
        let better = cur.is_blank() || if want_max { v > cur } else { v < cur };
        if better {
            out[o] = v;
        }
    }
    out
}

fn build<T: Element>(values: Vec<T>, dsize: &[usize], opts: &AllocOptions) -> GalResult<Data> {
    let size = values.len();
    let storage = Storage::from_vec(values, opts.minmapsize, opts.quietmmap)?;
    Ok(Data::from_parts(T::into_buffer(storage), dsize.to_vec(), size, opts))
}
