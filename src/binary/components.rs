//! Connected-component labeling by breadth-first flood fill.
//!
//! Labels are handed out in raster-scan discovery order starting at 1.

use crate::binary::{require_binary, BINARY_BLANK};
use crate::data::{Data, DataType, Init};
use crate::dimension::Neighbors;
use crate::label::BLANK_LABEL;
use crate::trace::{trace_event, trace_span};
use crate::util::{GalError, GalResult};
use std::collections::VecDeque;

/// Labels the foreground components of a binary array.
///
/// Returns an `Int32` label array of the same shape (0 for background, blank
/// where the input is blank) and the number of components.
pub fn connected_components(binary: &Data, connectivity: usize) -> GalResult<(Data, usize)> {
    require_binary(binary, "connected components")?;
    let _span = trace_span!("connected_components", size = binary.size()).entered();
    let neighbors = Neighbors::new(binary.dsize(), connectivity)?;
    let mut labels = Data::alloc(
        DataType::Int32,
        binary.dsize(),
        &binary.alloc_options(Init::Zeros),
    )?;
    labels.wcs = binary.wcs.clone();
    let arr = binary.as_slice::<u8>()?;
    let lab = labels.as_mut_slice::<i32>()?;

    let mut queue = VecDeque::new();
    let mut count = 0usize;
    for i in 0..arr.len() {
        match arr[i] {
            BINARY_BLANK => lab[i] = BLANK_LABEL,
            0 => {}
            _ if lab[i] == 0 => {
                count += 1;
                let current = count as i32;
                lab[i] = current;
                queue.push_back(i);
                while let Some(p) = queue.pop_front() {
                    neighbors.for_each(p, |n| {
                        let v = arr[n];
                        if v != 0 && v != BINARY_BLANK && lab[n] == 0 {
                            lab[n] = current;
                            queue.push_back(n);
                        }
                    });
                }
            }
            _ => {}
        }
    }
    trace_event!("components", count = count);
    Ok((labels, count))
}

/// Flat indices of every foreground component, in discovery order.
pub fn connected_indexes(binary: &Data, connectivity: usize) -> GalResult<Vec<Vec<usize>>> {
    require_binary(binary, "connected indexes")?;
    let neighbors = Neighbors::new(binary.dsize(), connectivity)?;
    let arr = binary.as_slice::<u8>()?;
    let mut seen = vec![false; arr.len()];
    let mut out = Vec::new();
    let mut queue = VecDeque::new();
    for i in 0..arr.len() {
        if arr[i] == 0 || arr[i] == BINARY_BLANK || seen[i] {
            continue;
        }
        let mut members = vec![i];
        seen[i] = true;
        queue.push_back(i);
        while let Some(p) = queue.pop_front() {
            neighbors.for_each(p, |n| {
                let v = arr[n];
                if v != 0 && v != BINARY_BLANK && !seen[n] {
                    seen[n] = true;
                    members.push(n);
                    queue.push_back(n);
                }
            });
        }
        out.push(members);
    }
    Ok(out)
}

/// Compacts labels that touch each other into shared new labels.
///
/// `adjacency` is a square `UInt8` matrix where a non-zero `(i, j)` means old
/// label `i` touches old label `j`. Returns the new label of every old label
/// (index 0 stays 0) and the number of new labels.
pub fn connected_adjacency_matrix(adjacency: &Data) -> GalResult<(Vec<i32>, usize)> {
    require_binary(adjacency, "adjacency matrix")?;
    let dsize = adjacency.dsize();
    if dsize.len() != 2 || dsize[0] != dsize[1] {
        return Err(GalError::InvalidShape {
            reason: "adjacency matrix must be square",
        });
    }
    let n = dsize[0];
    let adj = adjacency.as_slice::<u8>()?;
    let mut newlabs = vec![0i32; n];
    let mut count = 0usize;
    let mut queue = VecDeque::new();
    for start in 1..n {
        if newlabs[start] != 0 {
            continue;
        }
        count += 1;
        let current = count as i32;
        newlabs[start] = current;
        queue.push_back(start);
        while let Some(p) = queue.pop_front() {
            for j in 1..n {
                let linked = adj[p * n + j] != 0 || adj[j * n + p] != 0;
                if linked && newlabs[j] == 0 {
                    newlabs[j] = current;
                    queue.push_back(j);
                }
            }
        }
    }
    Ok((newlabs, count))
}
