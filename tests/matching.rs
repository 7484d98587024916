use galdata::matching::match_columns;
use galdata::{match_coordinates, Aperture, Data, GalError, MatchConfig, MatchOutput};

fn radius(r: f64) -> MatchConfig {
    MatchConfig {
        aperture: Aperture::Radius(r),
        ..MatchConfig::default()
    }
}

fn run(a: &[&[f64]], b: &[&[f64]], cfg: &MatchConfig) -> MatchOutput {
    match_coordinates(a, b, cfg).unwrap()
}

#[test]
fn nearest_point_inside_radius_is_matched() {
    let ax = [0.0];
    let ay = [0.0];
    let bx = [0.1, 5.0];
    let by = [0.1, 5.0];
    let out = run(&[&ax, &ay], &[&bx, &by], &radius(1.0));
    assert_eq!(out.num_matched, 1);
    assert_eq!(out.first, vec![0]);
    assert_eq!(out.second, vec![0, 1]);
    assert!((out.distance[0] - 0.02f64.sqrt()).abs() < 1e-12);
    let pairs: Vec<_> = out.pairs().map(|(a, b, _)| (a, b)).collect();
    assert_eq!(pairs, vec![(0, 0)]);
}

#[test]
fn swapping_catalogues_keeps_the_mutual_pair() {
    let ax = [0.0, 3.0, 7.0];
    let ay = [0.0, 3.0, 1.0];
    let bx = [3.2, 0.1, 9.0];
    let by = [2.9, -0.1, 9.0];
    let cfg = radius(0.5);
    let ab = run(&[&ax, &ay], &[&bx, &by], &cfg);
    let ba = run(&[&bx, &by], &[&ax, &ay], &cfg);
    assert_eq!(ab.num_matched, 2);
    assert_eq!(ba.num_matched, 2);

    let mut forward: Vec<(usize, usize, f64)> = ab.pairs().collect();
    let mut backward: Vec<(usize, usize, f64)> = ba.pairs().map(|(b, a, r)| (a, b, r)).collect();
    forward.sort_by_key(|p| p.0);
    backward.sort_by_key(|p| p.0);
    for (f, b) in forward.iter().zip(&backward) {
        assert_eq!((f.0, f.1), (b.0, b.1));
        assert!((f.2 - b.2).abs() < 1e-12);
    }
    assert_eq!(ab.first[2..], [2]);
    assert_eq!(ab.second[2..], [2]);
}

#[test]
fn contested_point_goes_to_its_nearest_proposer() {
    let ax = [0.0, 0.5];
    let ay = [0.0, 0.0];
    let bx = [0.4];
    let by = [0.0];
    let out = run(&[&ax, &ay], &[&bx, &by], &radius(1.0));
    assert_eq!(out.num_matched, 1);
    assert_eq!(out.first, vec![1, 0]);
    assert_eq!(out.second, vec![0]);
    assert!((out.distance[0] - 0.1).abs() < 1e-12);
}

#[test]
fn losing_proposer_is_left_unmatched() {
    // Point 1 of the first catalogue owns both second-catalogue points but
    // keeps only the nearer one; point 0 lost its only candidate.
    let ax = [0.0, 1.0];
    let bx = [0.6, 2.0];
    let out = run(&[&ax], &[&bx], &radius(1.5));
    assert_eq!(out.num_matched, 1);
    assert_eq!(out.first, vec![1, 0]);
    assert_eq!(out.second, vec![0, 1]);
    assert!((out.distance[0] - 0.4).abs() < 1e-12);
}

#[test]
fn nearest_of_several_candidates_wins() {
    let ax = [0.0];
    let ay = [0.0];
    let bx = [0.5, 0.2];
    let by = [0.0, 0.0];
    let out = run(&[&ax, &ay], &[&bx, &by], &radius(1.0));
    assert_eq!(out.num_matched, 1);
    assert_eq!(out.second, vec![1, 0]);
    assert!((out.distance[0] - 0.2).abs() < 1e-12);
}

#[test]
fn ellipse_orientation_selects_the_candidate() {
    let ax = [0.0];
    let ay = [0.0];
    let bx = [1.5, 0.0];
    let by = [0.0, 1.5];
    let along = |pa: f64| MatchConfig {
        aperture: Aperture::Ellipse {
            major: 2.0,
            axis_ratio: 0.5,
            position_angle_deg: pa,
        },
        ..MatchConfig::default()
    };

    let out = run(&[&ax, &ay], &[&bx, &by], &along(0.0));
    assert_eq!(out.num_matched, 1);
    assert_eq!(out.second, vec![0, 1]);
    assert!((out.distance[0] - 1.5).abs() < 1e-12);

    let out = run(&[&ax, &ay], &[&bx, &by], &along(90.0));
    assert_eq!(out.num_matched, 1);
    assert_eq!(out.second, vec![1, 0]);
    assert!((out.distance[0] - 1.5).abs() < 1e-9);
}

#[test]
fn ellipsoid_rotated_about_the_third_axis() {
    let ax = [0.0];
    let ay = [0.0];
    let az = [0.0];
    let bx = [0.9, 0.0];
    let by = [0.0, 0.9];
    let bz = [0.0, 0.0];
    let cfg = MatchConfig {
        aperture: Aperture::Ellipsoid {
            major: 1.0,
            axis_ratios: [0.3, 0.3],
            euler_deg: [90.0, 0.0, 0.0],
        },
        ..MatchConfig::default()
    };
    let out = run(&[&ax, &ay, &az], &[&bx, &by, &bz], &cfg);
    assert_eq!(out.num_matched, 1);
    assert_eq!(out.second, vec![1, 0]);
    assert!((out.distance[0] - 0.9).abs() < 1e-9);
}

#[test]
fn one_dimensional_matching_and_nan_coordinates() {
    let ax = [f64::NAN, 10.0, 20.0];
    let bx = [19.5, 10.25, 0.0];
    let out = run(&[&ax], &[&bx], &radius(1.0));
    assert_eq!(out.num_matched, 2);
    assert_eq!(out.first, vec![1, 2, 0]);
    assert_eq!(out.second, vec![1, 0, 2]);
    assert_eq!(out.distance, vec![0.25, 0.5]);
}

#[test]
fn presorted_input_gives_the_same_matches() {
    let ax = [0.0, 1.0, 2.0, 3.0];
    let ay = [0.0, 0.1, 0.0, 0.1];
    let bx = [0.05, 1.02, 2.9, 4.0];
    let by = [0.0, 0.1, 0.1, 4.0];
    let plain = run(&[&ax, &ay], &[&bx, &by], &radius(0.3));
    let presorted = run(
        &[&ax, &ay],
        &[&bx, &by],
        &MatchConfig {
            presorted: true,
            ..radius(0.3)
        },
    );
    assert_eq!(plain, presorted);
    assert_eq!(plain.num_matched, 3);
    assert_eq!(plain.first, vec![0, 1, 3, 2]);
    assert_eq!(plain.second, vec![0, 1, 2, 3]);
}

#[test]
fn column_arrays_of_any_numeric_type() {
    let a = [
        Data::from_vec(vec![0i32, 10], &[2]).unwrap(),
        Data::from_vec(vec![0i32, 10], &[2]).unwrap(),
    ];
    let b = [
        Data::from_vec(vec![10.5f32, 0.5], &[2]).unwrap(),
        Data::from_vec(vec![10.0f32, 0.0], &[2]).unwrap(),
    ];
    let out = match_columns(&a, &b, &radius(1.0)).unwrap();
    assert_eq!(out.num_matched, 2);
    assert_eq!(out.first, vec![0, 1]);
    assert_eq!(out.second, vec![1, 0]);
    assert_eq!(out.distance, vec![0.5, 0.5]);
}

#[test]
fn malformed_catalogues_are_rejected() {
    let x = [0.0, 1.0];
    let short = [0.0];
    let cfg = radius(1.0);

    assert!(matches!(
        match_coordinates(&[&x, &x, &x, &x], &[&x, &x, &x, &x], &cfg),
        Err(GalError::InvalidInput(_))
    ));
    assert!(matches!(
        match_coordinates(&[&x, &short], &[&x, &x], &cfg),
        Err(GalError::SizeMismatch { .. })
    ));
    assert!(matches!(
        match_coordinates(&[&x, &x], &[&x], &cfg),
        Err(GalError::NdimMismatch { expected: 2, got: 1 })
    ));

    let ellipse = MatchConfig {
        aperture: Aperture::Ellipse {
            major: 1.0,
            axis_ratio: 0.5,
            position_angle_deg: 0.0,
        },
        ..MatchConfig::default()
    };
    assert!(matches!(
        match_coordinates(&[&x, &x, &x], &[&x, &x, &x], &ellipse),
        Err(GalError::InvalidInput(_))
    ));
    assert!(matches!(
        match_coordinates(&[&x], &[&x], &radius(0.0)),
        Err(GalError::InvalidInput(_))
    ));
}
