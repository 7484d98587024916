//! Filling of enclosed background regions.

use crate::binary::{connected_components, require_binary};
use crate::data::Data;
use crate::dimension;
use crate::trace::{trace_event, trace_span};
use crate::util::GalResult;

/// Padding added on each side so exterior background always reaches the frame.
const PAD: usize = 2;

/// Turns background regions fully enclosed by foreground into foreground.
///
/// A hole is a background component (under `connectivity`) that is not
/// connected to the region outside the array. When `max_size` is given, only
/// holes with at most that many elements are filled. Blank elements are
/// never filled and never count as background.
pub fn holes_fill(input: &mut Data, connectivity: usize, max_size: Option<usize>) -> GalResult<()> {
    require_binary(input, "holes fill")?;
    let _span = trace_span!("holes_fill", size = input.size()).entered();
    let dsize = input.dsize().to_vec();
    let padded_dsize: Vec<usize> = dsize.iter().map(|&d| d + 2 * PAD).collect();
    let inc = dimension::increments(&dsize);
    let padded_inc = dimension::increments(&padded_dsize);
    let ndim = dsize.len();

    // Padded position of every input element.
    let mut coord = vec![0usize; ndim];
    let padded_index = |index: usize, coord: &mut [usize]| -> usize {
        dimension::index_to_coord_inc(index, &inc, coord);
        coord
            .iter()
            .zip(&padded_inc)
            .map(|(&c, &inc)| (c + PAD) * inc)
            .sum()
    };

    let mut inverse = Data::from_vec(
        vec![1u8; dimension::total_size(&padded_dsize)?],
        &padded_dsize,
    )?;
    {
        let src = input.as_slice::<u8>()?;
        let inv = inverse.as_mut_slice::<u8>()?;
        for (i, &v) in src.iter().enumerate() {
            if v != 0 {
                inv[padded_index(i, &mut coord)] = 0;
            }
        }
    }

    let (labels, count) = connected_components(&inverse, connectivity)?;
    let lab = labels.as_slice::<i32>()?;
    let exterior = lab[0];
    let mut sizes = vec![0usize; count + 1];
    for &l in lab.iter().filter(|&&l| l > 0) {
        sizes[l as usize] += 1;
    }

    let mut filled = 0usize;
    let arr = input.as_mut_slice::<u8>()?;
    for (i, v) in arr.iter_mut().enumerate() {
        if *v != 0 {
            continue;
        }
        let l = lab[padded_index(i, &mut coord)];
        if l > 0 && l != exterior && max_size.map_or(true, |m| sizes[l as usize] <= m) {
            *v = 1;
            filled += 1;
        }
    }
    trace_event!("holes_filled", pixels = filled);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BINARY_BLANK;

    #[test]
    fn blank_pixels_stay_blank() {
        let mut values = vec![1u8; 25];
        values[12] = BINARY_BLANK;
        let mut data = Data::from_vec(values, &[5, 5]).unwrap();
        holes_fill(&mut data, 1, None).unwrap();
        assert_eq!(data.as_slice::<u8>().unwrap()[12], BINARY_BLANK);
    }

    #[test]
    fn size_cap_keeps_large_holes() {
        let mut values = vec![1u8; 49];
        for r in 2..5 {
            for c in 2..5 {
                values[r * 7 + c] = 0;
            }
        }
        let mut data = Data::from_vec(values.clone(), &[7, 7]).unwrap();
        holes_fill(&mut data, 1, Some(8)).unwrap();
        assert_eq!(data.as_slice::<u8>().unwrap(), &values[..]);
        holes_fill(&mut data, 1, Some(9)).unwrap();
        assert!(data.as_slice::<u8>().unwrap().iter().all(|&v| v == 1));
    }
}
