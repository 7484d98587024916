//! Growing existing labels into unlabeled elements.

use super::{require_labels, RIVER_LABEL};
use crate::data::Data;
use crate::dimension::Neighbors;
use crate::trace::{trace_event, trace_span};
use crate::util::{GalError, GalResult};

/// Expands positive labels into the elements listed in `frontier`.
///
/// Each round inspects every frontier element against the labels as they
/// were at the start of the round. An element touching exactly one distinct
/// positive label takes it; one touching two or more becomes a river when
/// `with_rivers` is set. Labeled elements leave the frontier; the rest are
/// retried next round. Growth stops once a round labels nothing, and
/// `frontier` is left holding the elements that were never labeled.
///
/// Without rivers an element touching two labels is never decided: it
/// keeps its label, stays in `frontier`, and blocks growth through it.
pub fn grow_labels(
    labels: &mut Data,
    frontier: &mut Vec<usize>,
    with_rivers: bool,
    connectivity: usize,
) -> GalResult<()> {
    require_labels(labels, "grow labels")?;
    let size = labels.size();
    if let Some(&bad) = frontier.iter().find(|&&i| i >= size) {
        return Err(GalError::IndexOutOfBounds {
            index: bad,
            len: size,
            context: "grow frontier",
        });
    }
    let _span = trace_span!("grow_labels", frontier = frontier.len()).entered();
    let neighbors = Neighbors::new(labels.dsize(), connectivity)?;
    let lab = labels.as_mut_slice::<i32>()?;

    let mut decided: Vec<(usize, i32)> = Vec::new();
    let mut rounds = 0usize;
    loop {
        decided.clear();
        for &i in frontier.iter() {
            if lab[i] > 0 {
                continue;
            }
            let mut first = 0i32;
            let mut multiple = false;
            neighbors.for_each(i, |n| {
                let l = lab[n];
                if l > 0 {
                    if first == 0 {
                        first = l;
                    } else if l != first {
                        multiple = true;
                    }
                }
            });
            if multiple {
                if with_rivers {
                    decided.push((i, RIVER_LABEL));
                }
            } else if first > 0 {
                decided.push((i, first));
            }
        }
        let before = frontier.len();
        for &(i, l) in &decided {
            lab[i] = l;
        }
        frontier.retain(|&i| lab[i] <= 0 && lab[i] != RIVER_LABEL);
        rounds += 1;
        if frontier.len() == before {
            break;
        }
    }
    trace_event!("grow_done", rounds = rounds, remaining = frontier.len());
    Ok(())
}
