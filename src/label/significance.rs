//! Significance of watershed clumps against their surrounding rivers.

use super::{require_labels, Extremum, RIVER_LABEL};
use crate::data::{Data, DataType};
use crate::dimension::Neighbors;
use crate::tile::Tessellation;
use crate::trace::{trace_event, trace_span};
use crate::util::{GalError, GalResult};

/// Noise level used to scale clump significance.
#[derive(Clone, Copy, Debug)]
pub enum Noise<'a> {
    /// One value for the whole array.
    Constant(f64),
    /// One value per element, same extents as the values.
    PerPixel(&'a Data),
    /// One value per tile of a tessellation of the values, in storage order.
    PerTile {
        tessellation: &'a Tessellation,
        values: &'a Data,
    },
}

/// Noise values resolved for fast lookup.
enum NoiseLookup<'a> {
    Constant(f64),
    PerPixel(Vec<f64>),
    PerTile(&'a Tessellation, Vec<f64>),
}

impl<'a> Noise<'a> {
    fn resolve(&self, size: usize) -> GalResult<NoiseLookup<'a>> {
        match *self {
            Noise::Constant(v) => Ok(NoiseLookup::Constant(v)),
            Noise::PerPixel(data) => {
                if data.size() != size {
                    return Err(GalError::SizeMismatch {
                        expected: size,
                        got: data.size(),
                        context: "per-pixel noise",
                    });
                }
                Ok(NoiseLookup::PerPixel(data.to_f64_vec()?))
            }
            Noise::PerTile {
                tessellation,
                values,
            } => {
                if values.size() != tessellation.len() {
                    return Err(GalError::SizeMismatch {
                        expected: tessellation.len(),
                        got: values.size(),
                        context: "per-tile noise",
                    });
                }
                Ok(NoiseLookup::PerTile(tessellation, values.to_f64_vec()?))
            }
        }
    }
}

impl NoiseLookup<'_> {
    fn at(&self, index: usize) -> GalResult<f64> {
        match self {
            NoiseLookup::Constant(v) => Ok(*v),
            NoiseLookup::PerPixel(v) => Ok(v[index]),
            NoiseLookup::PerTile(tess, v) => Ok(v[tess.tile_id_of_index(index)?]),
        }
    }
}

/// Options of [`clump_significance`].
#[derive(Clone, Debug)]
pub struct SignificanceConfig {
    /// Clumps with fewer elements are rejected.
    pub min_area: usize,
    /// The noise values are variances rather than standard deviations.
    pub variance: bool,
    /// Keep rejected clumps (with NaN significance) instead of removing them.
    pub keep_small: bool,
    /// Extremum the clumps were seeded from.
    pub extremum: Extremum,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            min_area: 1,
            variance: false,
            keep_small: false,
            extremum: Extremum::Max,
        }
    }
}

#[derive(Clone, Copy)]
struct ClumpStats {
    area: usize,
    peak: Option<(usize, f32)>,
    river_area: usize,
    river: f32,
}

/// Significance of every clump in `labels`.
///
/// `indexes` must be the element list already sorted by the watershed that
/// produced `labels`, so the first element seen of each clump is its
/// extremum. The river value of a clump is the most extreme river element
/// touching it; significance is `(peak - river) / noise` for maxima-seeded
/// clumps and `(river - peak) / noise` for minima-seeded ones.
///
/// Clumps smaller than `min_area`, or with no river around them, are
/// rejected. Rejected clumps keep a NaN significance when `keep_small` is
/// set. Otherwise they are removed: their elements are set to 0 and the
/// surviving clumps are renumbered from 1 in their original order. Element
/// `l - 1` of the output is the significance of clump `l`.
pub fn clump_significance(
    values: &Data,
    noise: &Noise<'_>,
    labels: &mut Data,
    indexes: &[usize],
    cfg: &SignificanceConfig,
) -> GalResult<Vec<f64>> {
    values.require_type(DataType::Float32, "clump significance values")?;
    require_labels(labels, "clump significance labels")?;
    if values.dsize() != labels.dsize() {
        return Err(GalError::SizeMismatch {
            expected: values.size(),
            got: labels.size(),
            context: "clump significance labels",
        });
    }
    let _span = trace_span!("clump_significance", indexes = indexes.len()).entered();
    let noise = noise.resolve(values.size())?;
    let neighbors = Neighbors::new(values.dsize(), values.ndim())?;
    let arr = values.as_slice::<f32>()?;
    let lab = labels.as_mut_slice::<i32>()?;
    let num_clumps = lab.iter().copied().max().unwrap_or(0).max(0) as usize;

    let empty = ClumpStats {
        area: 0,
        peak: None,
        river_area: 0,
        river: f32::NAN,
    };
    let mut stats = vec![empty; num_clumps + 1];
    let mut touching = Vec::with_capacity(neighbors.max_count());
    for &i in indexes {
        let l = *lab.get(i).ok_or(GalError::IndexOutOfBounds {
            index: i,
            len: arr.len(),
            context: "clump significance index",
        })?;
        if l > 0 {
            let s = &mut stats[l as usize];
            s.area += 1;
            if s.peak.is_none() {
                s.peak = Some((i, arr[i]));
            }
        } else if l == RIVER_LABEL {
            touching.clear();
            neighbors.for_each(i, |n| {
                if lab[n] > 0 && !touching.contains(&lab[n]) {
                    touching.push(lab[n]);
                }
            });
            for &t in &touching {
                let s = &mut stats[t as usize];
                s.river_area += 1;
                if s.river.is_nan() || cfg.extremum.beyond(arr[i], s.river) {
                    s.river = arr[i];
                }
            }
        }
    }

    let mut significance = Vec::with_capacity(num_clumps);
    let mut relabel = vec![0i32; num_clumps + 1];
    for (l, s) in stats.iter().enumerate().skip(1) {
        let keep = s.area >= cfg.min_area && s.river_area > 0;
        let sig = match (keep, s.peak) {
            (true, Some((index, peak))) => {
                let raw = noise.at(index)?;
                let std = if cfg.variance { raw.sqrt() } else { raw };
                let diff = match cfg.extremum {
                    Extremum::Max => peak as f64 - s.river as f64,
                    Extremum::Min => s.river as f64 - peak as f64,
                };
                diff / std
            }
            _ => f64::NAN,
        };
        if keep || cfg.keep_small {
            significance.push(sig);
            relabel[l] = significance.len() as i32;
        }
    }
    if !cfg.keep_small {
        for v in lab.iter_mut().filter(|v| **v > 0) {
            *v = relabel[*v as usize];
        }
    }
    trace_event!(
        "clump_significance_done",
        clumps = num_clumps,
        kept = significance.len()
    );
    Ok(significance)
}
