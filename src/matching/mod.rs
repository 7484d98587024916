//! One-to-one matching of two coordinate catalogues within an aperture.
//!
//! Catalogues are column lists: `coords[d][i]` is coordinate `d` of point
//! `i`. Both catalogues are ordered by their first coordinate so the
//! candidates of each point come from a binary-searched window; the true
//! aperture test runs only inside that window.

mod aperture;

pub use aperture::Aperture;

use crate::data::Data;
use crate::trace::{trace_event, trace_span};
use crate::util::{GalError, GalResult};
use aperture::Prepared;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Configuration of [`match_coordinates`].
#[derive(Clone, Debug)]
pub struct MatchConfig {
    pub aperture: Aperture,
    /// Both catalogues are already sorted by their first coordinate.
    pub presorted: bool,
    /// Build candidate lists on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            aperture: Aperture::Radius(1.0),
            presorted: false,
            parallel: false,
        }
    }
}

/// Matched and unmatched points of two catalogues.
///
/// For `i < num_matched`, `first[i]` in the first catalogue is matched to
/// `second[i]` in the second at aperture distance `distance[i]`; matches are
/// ordered by their index in the first catalogue. The remaining entries of
/// `first` and `second` list each catalogue's unmatched points in
/// increasing order.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutput {
    pub first: Vec<usize>,
    pub second: Vec<usize>,
    pub distance: Vec<f64>,
    pub num_matched: usize,
}

impl MatchOutput {
    /// Matched `(first, second, distance)` triples.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.num_matched).map(|i| (self.first[i], self.second[i], self.distance[i]))
    }
}

fn check_catalogue(coords: &[&[f64]], ndim: usize, which: &'static str) -> GalResult<usize> {
    if coords.len() != ndim {
        return Err(GalError::NdimMismatch {
            expected: ndim,
            got: coords.len(),
        });
    }
    let len = coords[0].len();
    for col in coords {
        if col.len() != len {
            return Err(GalError::SizeMismatch {
                expected: len,
                got: col.len(),
                context: which,
            });
        }
    }
    Ok(len)
}

/// Permutation ordering `col` increasingly; NaN sorts last.
fn sort_order(col: &[f64], presorted: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..col.len()).collect();
    if !presorted {
        order.sort_by(|&a, &b| col[a].total_cmp(&col[b]));
    }
    order
}

/// Candidates of one point of the first catalogue, nearest first.
fn candidates(
    a: usize,
    first: &[&[f64]],
    second: &[&[f64]],
    second_sorted_x: &[f64],
    second_order: &[usize],
    aperture: &Prepared,
    major: f64,
) -> Vec<(usize, f64)> {
    let x = first[0][a];
    if x.is_nan() {
        return Vec::new();
    }
    let lo = second_sorted_x.partition_point(|&v| v < x - major);
    let hi = second_sorted_x.partition_point(|&v| v <= x + major);
    let mut delta = [0.0f64; 3];
    let mut out: Vec<(usize, f64)> = second_order[lo..hi]
        .iter()
        .filter_map(|&b| {
            for (d, slot) in delta.iter_mut().enumerate().take(first.len()) {
                *slot = second[d][b] - first[d][a];
            }
            aperture.distance(&delta[..first.len()]).map(|r| (b, r))
        })
        .collect();
    out.sort_by(|p, q| p.1.total_cmp(&q.1).then(p.0.cmp(&q.0)));
    out
}

/// Matches every point of `first` to at most one point of `second`.
///
/// Each point of `first` proposes every `second` point inside the aperture
/// centred on it. Each `second` point then accepts only its nearest proposer
/// (ties go to the lower index), and each `first` point keeps the nearest of
/// the `second` points that accepted it. Points on either side may remain
/// unmatched.
pub fn match_coordinates(
    first: &[&[f64]],
    second: &[&[f64]],
    cfg: &MatchConfig,
) -> GalResult<MatchOutput> {
    let ndim = first.len();
    if !(1..=3).contains(&ndim) {
        return Err(GalError::InvalidInput("matching needs 1 to 3 coordinate columns"));
    }
    if !cfg.aperture.supports(ndim) {
        return Err(GalError::InvalidInput("aperture does not fit the number of dimensions"));
    }
    let na = check_catalogue(first, ndim, "first catalogue")?;
    let nb = check_catalogue(second, ndim, "second catalogue")?;
    let aperture = cfg.aperture.prepare()?;
    let major = cfg.aperture.major();
    let _span = trace_span!("match", first = na, second = nb, ndim = ndim).entered();

    let second_order = sort_order(second[0], cfg.presorted);
    let second_sorted_x: Vec<f64> = second_order.iter().map(|&b| second[0][b]).collect();
    let find = |a: usize| {
        candidates(
            a,
            first,
            second,
            &second_sorted_x,
            &second_order,
            &aperture,
            major,
        )
    };

    #[cfg(feature = "rayon")]
    let proposals: Vec<Vec<(usize, f64)>> = if cfg.parallel {
        (0..na).into_par_iter().map(find).collect()
    } else {
        (0..na).map(find).collect()
    };
    #[cfg(not(feature = "rayon"))]
    let proposals: Vec<Vec<(usize, f64)>> = (0..na).map(find).collect();

    // Nearest proposer of every second-catalogue point.
    let mut best: Vec<Option<(usize, f64)>> = vec![None; nb];
    for (a, list) in proposals.iter().enumerate() {
        for &(b, r) in list {
            match best[b] {
                Some((_, current)) if current <= r => {}
                _ => best[b] = Some((a, r)),
            }
        }
    }

    let mut out = MatchOutput {
        first: Vec::with_capacity(na),
        second: Vec::with_capacity(nb),
        distance: Vec::new(),
        num_matched: 0,
    };
    let mut a_matched = vec![false; na];
    let mut b_matched = vec![false; nb];
    for (a, list) in proposals.iter().enumerate() {
        let accepted = list
            .iter()
            .find(|&&(b, _)| matches!(best[b], Some((owner, _)) if owner == a));
        if let Some(&(b, r)) = accepted {
            out.first.push(a);
            out.second.push(b);
            out.distance.push(r);
            a_matched[a] = true;
            b_matched[b] = true;
        }
    }
    out.num_matched = out.first.len();
    out.first.extend((0..na).filter(|&a| !a_matched[a]));
    out.second.extend((0..nb).filter(|&b| !b_matched[b]));
    trace_event!("matched", pairs = out.num_matched);
    Ok(out)
}

/// [`match_coordinates`] over numeric column arrays.
pub fn match_columns(first: &[Data], second: &[Data], cfg: &MatchConfig) -> GalResult<MatchOutput> {
    let a: Vec<Vec<f64>> = first.iter().map(Data::to_f64_vec).collect::<GalResult<_>>()?;
    let b: Vec<Vec<f64>> = second.iter().map(Data::to_f64_vec).collect::<GalResult<_>>()?;
    let a_refs: Vec<&[f64]> = a.iter().map(Vec::as_slice).collect();
    let b_refs: Vec<&[f64]> = b.iter().map(Vec::as_slice).collect();
    match_coordinates(&a_refs, &b_refs, cfg)
}
