use galdata::dimension::{
    coord_to_index, increments, index_to_coord, index_to_coord_inc, total_size,
};
use galdata::{collapse, Collapse, Data, DataType, Element, GalError, Neighbors, Wcs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn index_coordinate_round_trip_random_shapes() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let ndim = rng.random_range(1..=5);
        let dsize: Vec<usize> = (0..ndim).map(|_| rng.random_range(1..=7)).collect();
        let size = total_size(&dsize).unwrap();
        let index = rng.random_range(0..size);
        let mut coord = vec![0; ndim];
        index_to_coord(index, &dsize, &mut coord);
        assert!(coord.iter().zip(&dsize).all(|(c, d)| c < d));
        assert_eq!(coord_to_index(&dsize, &coord), index);
    }
}

#[test]
fn precomputed_increments_match_direct_conversion() {
    for dsize in [vec![3, 4, 5], vec![2, 1, 3, 4], vec![5, 2, 2, 3, 2]] {
        let inc = increments(&dsize);
        let mut direct = vec![0; dsize.len()];
        let mut cached = vec![0; dsize.len()];
        for index in 0..total_size(&dsize).unwrap() {
            index_to_coord(index, &dsize, &mut direct);
            index_to_coord_inc(index, &inc, &mut cached);
            assert_eq!(direct, cached);
        }
    }
    let mut coord = [0; 3];
    index_to_coord(59, &[3, 4, 5], &mut coord);
    assert_eq!(coord, [2, 3, 4]);
    index_to_coord(27, &[3, 4, 5], &mut coord);
    assert_eq!(coord, [1, 1, 2]);
}

#[test]
fn neighbors_reject_bad_connectivity() {
    assert!(Neighbors::new(&[4, 4], 0).is_err());
    assert!(Neighbors::new(&[4, 4], 3).is_err());
    assert!(Neighbors::new(&[2; 11], 1).is_err());
}

#[test]
fn neighbors_stay_inside_and_are_symmetric() {
    let dsize = [4, 5, 3];
    let ngb = Neighbors::new(&dsize, 2).unwrap();
    let size = total_size(&dsize).unwrap();
    for i in 0..size {
        let mut found = Vec::new();
        ngb.collect_into(i, &mut found);
        for &n in &found {
            assert!(n < size);
            assert_ne!(n, i);
            let mut back = Vec::new();
            ngb.collect_into(n, &mut back);
            assert!(back.contains(&i));
        }
    }
}

#[test]
fn collapse_sum_of_rows() {
    let data = Data::from_vec(vec![1i32, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
    let out = collapse(&data, 0, Collapse::Sum, None).unwrap();
    assert_eq!(out.dsize(), &[3]);
    assert_eq!(out.dtype(), DataType::Float64);
    assert_eq!(out.as_slice::<f64>().unwrap(), &[5.0, 7.0, 9.0]);
}

#[test]
fn collapse_ignores_blanks_and_drops_wcs_axis() {
    let data = Data::from_vec(vec![1.0f32, f32::NAN, 3.0, f32::NAN, f32::NAN, 6.0], &[2, 3])
        .unwrap()
        .with_wcs(Wcs::identity(2));
    let mean = collapse(&data, 0, Collapse::Mean, None).unwrap();
    let m = mean.as_slice::<f64>().unwrap();
    assert_eq!(m[0], 1.0);
    assert!(m[1].is_nan());
    assert_eq!(m[2], 4.5);
    assert_eq!(mean.wcs.as_ref().map(Wcs::naxis), Some(1));

    let number = collapse(&data, 1, Collapse::Number, None).unwrap();
    assert_eq!(number.as_slice::<u32>().unwrap(), &[2, 1]);

    let max = collapse(&data, 1, Collapse::Max, None).unwrap();
    assert_eq!(max.dtype(), DataType::Float32);
    assert_eq!(max.as_slice::<f32>().unwrap(), &[3.0, 6.0]);
}

#[test]
fn weighted_collapse_along_middle_dimension() {
    // Extents [2, 3, 2]; the line through output (1, 1) is entirely blank.
    let mut values: Vec<f32> = (0..12).map(|i| i as f32).collect();
    for i in [7, 9, 11] {
        values[i] = f32::NAN;
    }
    let data = Data::from_vec(values, &[2, 3, 2]).unwrap();
    let weight = [1.0, 2.0, 3.0];

    let sum = collapse(&data, 1, Collapse::Sum, Some(&weight)).unwrap();
    assert_eq!(sum.dsize(), &[2, 2]);
    let s = sum.as_slice::<f64>().unwrap();
    assert_eq!(&s[..3], &[16.0, 22.0, 52.0]);
    assert!(s[3].is_nan());

    let mean = collapse(&data, 1, Collapse::Mean, Some(&weight)).unwrap();
    let m = mean.as_slice::<f64>().unwrap();
    for (got, want) in m.iter().zip([16.0 / 6.0, 22.0 / 6.0, 52.0 / 6.0]) {
        assert!((got - want).abs() < 1e-12);
    }
    assert!(m[3].is_nan());

    let number = collapse(&data, 1, Collapse::Number, Some(&weight)).unwrap();
    assert_eq!(number.as_slice::<u32>().unwrap(), &[3, 3, 3, 0]);

    let min = collapse(&data, 1, Collapse::Min, None).unwrap();
    assert_eq!(min.dtype(), DataType::Float32);
    let lo = min.as_slice::<f32>().unwrap();
    assert_eq!(&lo[..3], &[0.0, 1.0, 6.0]);
    assert!(lo[3].is_nan());
}

#[test]
fn integer_min_keeps_type_and_blanks() {
    let blank = <i16 as Element>::BLANK;
    let data = Data::from_vec(vec![5i16, -2, blank, blank, blank, blank], &[2, 3]).unwrap();
    let min = collapse(&data, 1, Collapse::Min, None).unwrap();
    assert_eq!(min.dtype(), DataType::Int16);
    assert_eq!(min.as_slice::<i16>().unwrap(), &[-2, blank]);
    let number = collapse(&data, 1, Collapse::Number, None).unwrap();
    assert_eq!(number.as_slice::<u32>().unwrap(), &[2, 0]);
}

#[test]
fn collapse_rejects_bad_dimension_and_weights() {
    let data = Data::from_vec(vec![1u8; 6], &[2, 3]).unwrap();
    assert!(matches!(
        collapse(&data, 2, Collapse::Sum, None),
        Err(GalError::IndexOutOfBounds { .. })
    ));
    assert!(matches!(
        collapse(&data, 0, Collapse::Mean, Some(&[1.0])),
        Err(GalError::SizeMismatch { .. })
    ));
}
