use galdata::tile::{fill_blank_neighbors, smooth, values::write_constant_per_tile};
use galdata::{Data, DataType, GalError, Tessellation, TessellationConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sizes(tess: &Tessellation) -> Vec<usize> {
    tess.tiles().iter().map(|t| t.size()).collect()
}

#[test]
fn small_remainder_merges_into_first_tile() {
    let tess = Tessellation::full(&[10], &[3], 0.5).unwrap();
    assert_eq!(sizes(&tess), vec![4, 3, 3]);
    let starts: Vec<usize> = tess.tiles().iter().map(|t| t.start_index()).collect();
    assert_eq!(starts, vec![0, 4, 7]);
}

#[test]
fn large_remainder_is_split_between_edges() {
    let tess = Tessellation::full(&[11], &[4], 0.5).unwrap();
    assert_eq!(sizes(&tess), vec![3, 4, 4]);
    let tess = Tessellation::full(&[13], &[4], 0.1).unwrap();
    assert_eq!(sizes(&tess), vec![2, 4, 4, 3]);
}

#[test]
fn every_element_is_covered_exactly_once() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..30 {
        let ndim = rng.random_range(1..=3);
        let dsize: Vec<usize> = (0..ndim).map(|_| rng.random_range(1..=23)).collect();
        let tile: Vec<usize> = (0..ndim).map(|_| rng.random_range(1..=9)).collect();
        let frac = rng.random_range(0.0..1.0);
        let tess = Tessellation::full(&dsize, &tile, frac).unwrap();
        let size: usize = dsize.iter().product();
        let mut hits = vec![0u32; size];
        for t in tess.tiles() {
            for i in t.indices(&dsize) {
                hits[i] += 1;
            }
        }
        assert!(hits.iter().all(|&h| h == 1));
        assert_eq!(sizes(&tess).iter().sum::<usize>(), size);
        for (id, t) in tess.tiles().iter().enumerate() {
            let (start, _) = t.start_end(&dsize);
            assert_eq!(tess.tile_id_of_coord(&start).unwrap(), id);
        }
    }
}

#[test]
fn tile_of_each_index_in_a_cube() {
    let dsize = [6, 8, 10];
    let tess = Tessellation::two_layer(&dsize, &[3, 8, 5], &[3, 3, 4], 0.3).unwrap();
    let mut owner = vec![usize::MAX; dsize.iter().product()];
    for (id, t) in tess.tiles().iter().enumerate() {
        for i in t.indices(&dsize) {
            owner[i] = id;
        }
    }
    for (index, &id) in owner.iter().enumerate() {
        assert_eq!(tess.tile_id_of_index(index).unwrap(), id);
    }
    assert!(matches!(
        tess.tile_id_of_index(owner.len()),
        Err(GalError::IndexOutOfBounds { .. })
    ));
}

#[test]
fn channel_size_must_divide_block() {
    let err = Tessellation::two_layer(&[10, 9], &[5, 4], &[2, 2], 0.1).unwrap_err();
    assert_eq!(
        err,
        GalError::NotDivisible {
            dim: 1,
            size: 4,
            parent: 9
        }
    );
    // Oversized channels are clamped to the block.
    let tess = Tessellation::two_layer(&[10, 9], &[5, 100], &[5, 3], 0.1).unwrap();
    assert_eq!(tess.channel_grid(), &[2, 1]);
}

#[test]
fn two_layer_tiles_are_stored_channel_by_channel() {
    let tess = Tessellation::two_layer(&[4, 4], &[4, 2], &[2, 1], 0.1).unwrap();
    assert_eq!(tess.num_channels(), 2);
    assert_eq!(tess.tiles_per_channel(), 4);
    assert_eq!(tess.grid_dsize(), vec![2, 4]);
    // Channel 0 covers columns 0-1, channel 1 columns 2-3.
    let starts: Vec<usize> = tess.tiles().iter().map(|t| t.start_index()).collect();
    assert_eq!(starts, vec![0, 1, 8, 9, 2, 3, 10, 11]);
    assert_eq!(tess.permutation(), &[0, 1, 4, 5, 2, 3, 6, 7]);
    assert_eq!(tess.tile_id_of_coord(&[3, 2]).unwrap(), 6);
}

#[test]
fn permutation_is_a_bijection() {
    let tess = Tessellation::two_layer(&[12, 18], &[6, 9], &[4, 4], 0.3).unwrap();
    let perm = tess.permutation();
    let mut seen = vec![false; tess.len()];
    for &p in perm {
        assert!(!seen[p]);
        seen[p] = true;
    }
    let ids: Vec<usize> = (0..tess.len()).collect();
    let raster = tess.to_raster(&ids).unwrap();
    assert_eq!(tess.from_raster(&raster).unwrap(), ids);
    // The cached permutation is reused.
    assert!(std::ptr::eq(perm, tess.permutation()));
}

#[test]
fn per_tile_values_fill_their_tiles() {
    let tess = Tessellation::from_config(
        &[4, 6],
        &TessellationConfig {
            tile_size: vec![2, 3],
            channel_size: None,
            remainder_frac: 0.1,
        },
    )
    .unwrap();
    let values = Data::from_vec(vec![1i32, 2, 3, 4], &[4]).unwrap();
    let block = tess.values_to_block(&values).unwrap();
    assert_eq!(block.dsize(), &[4, 6]);
    let b = block.as_slice::<i32>().unwrap();
    assert_eq!(&b[0..6], &[1, 1, 1, 2, 2, 2]);
    assert_eq!(&b[18..24], &[3, 3, 3, 4, 4, 4]);

    let short = Data::from_vec(vec![1i32, 2], &[2]).unwrap();
    assert!(matches!(
        tess.values_to_block(&short),
        Err(GalError::SizeMismatch { .. })
    ));
}

#[test]
fn uncovered_cells_are_blank_when_padding() {
    let tess = Tessellation::full(&[4, 4], &[2, 2], 0.1).unwrap();
    let values = Data::from_vec(vec![7.0f32], &[1]).unwrap();
    let out = write_constant_per_tile(&values, &tess.tiles()[..1], &[4, 4], true).unwrap();
    let o = out.as_slice::<f32>().unwrap();
    assert_eq!(o[0], 7.0);
    assert_eq!(o[5], 7.0);
    assert!(o[2].is_nan());
    assert_eq!(out.count_blank(), 12);
}

#[test]
fn blank_tiles_are_interpolated_from_neighbours() {
    let tess = Tessellation::full(&[3, 3], &[1, 1], 0.1).unwrap();
    let nan = f64::NAN;
    let values = Data::from_vec(vec![1.0, 2.0, 3.0, 4.0, nan, 6.0, 7.0, 8.0, 9.0], &[9]).unwrap();
    let filled = fill_blank_neighbors(&tess, &values, 4, false).unwrap();
    let f = filled.as_slice::<f64>().unwrap();
    assert_eq!(f[4], 5.0);
    assert_eq!(f[0], 1.0);

    let all_blank = Data::alloc(DataType::Float32, &[9], &galdata::AllocOptions::blank()).unwrap();
    let out = fill_blank_neighbors(&tess, &all_blank, 4, false).unwrap();
    assert_eq!(out.count_blank(), 9);
}

#[test]
fn smoothing_averages_window_and_ignores_blanks() {
    let tess = Tessellation::full(&[1, 5], &[1, 1], 0.1).unwrap();
    let values = Data::from_vec(vec![0.0f64, 3.0, f64::NAN, 9.0, 12.0], &[5]).unwrap();
    let out = smooth(&tess, &values, 3).unwrap();
    let s = out.as_slice::<f64>().unwrap();
    assert_eq!(s, &[1.5, 1.5, 6.0, 10.5, 10.5]);
    assert!(smooth(&tess, &values, 2).is_err());
}

#[test]
fn views_borrow_the_block() {
    let tess = Tessellation::full(&[4, 4], &[2, 2], 0.1).unwrap();
    let block = Data::from_vec((0..16).map(|v| v as f32).collect(), &[4, 4]).unwrap();
    let view = tess.view(&block, 3).unwrap();
    let v: Vec<f32> = view.values::<f32>().unwrap().collect();
    assert_eq!(v, vec![10.0, 11.0, 14.0, 15.0]);
    assert!(tess.view(&block, 4).is_err());
    let wrong = Data::from_vec(vec![0u8; 8], &[2, 4]).unwrap();
    assert!(tess.view(&wrong, 0).is_err());
}
