use galdata::{AllocOptions, Data, DataType, GalError, Init, Wcs};

#[test]
fn alloc_zero_and_blank_initialisation() {
    let zeros = Data::alloc(DataType::Int16, &[3, 4], &AllocOptions::default()).unwrap();
    assert_eq!(zeros.size(), 12);
    assert!(zeros.as_slice::<i16>().unwrap().iter().all(|&v| v == 0));
    assert!(!zeros.has_blank());

    let blanks = Data::alloc(DataType::Float32, &[5], &AllocOptions::blank()).unwrap();
    assert_eq!(blanks.count_blank(), 5);
    assert!(blanks.as_slice::<f32>().unwrap().iter().all(|v| v.is_nan()));

    let strings = Data::alloc(DataType::String, &[2], &AllocOptions::blank()).unwrap();
    assert_eq!(strings.strings().unwrap(), &["n/a".to_string(), "n/a".to_string()]);
}

#[test]
fn alloc_rejects_zero_extent_and_overflow() {
    let opts = AllocOptions::default();
    assert_eq!(
        Data::alloc(DataType::UInt8, &[4, 0], &opts).unwrap_err(),
        GalError::ZeroDimension { dim: 1 }
    );
    assert!(matches!(
        Data::alloc(DataType::Float64, &[usize::MAX / 2, 3], &opts),
        Err(GalError::SizeOverflow { .. })
    ));
}

#[test]
fn large_payload_goes_to_disk_and_file_is_removed() {
    let opts = AllocOptions {
        init: Init::Blank,
        minmapsize: 0,
        quietmmap: true,
    };
    let mut data = Data::alloc(DataType::Int32, &[16, 16], &opts).unwrap();
    assert!(data.is_mapped());
    let path = data.mmap_path().unwrap().to_path_buf();
    assert!(path.exists());
    assert!(data.as_slice::<i32>().unwrap().iter().all(|&v| v == i32::MIN));

    data.as_mut_slice::<i32>().unwrap()[17] = 42;
    let copy = data.copy().unwrap();
    assert!(copy.is_mapped());
    assert_eq!(copy.as_slice::<i32>().unwrap()[17], 42);
    assert_ne!(copy.mmap_path().unwrap(), path.as_path());

    drop(data);
    assert!(!path.exists());
}

#[test]
fn typed_access_checks_element_type() {
    let data = Data::from_vec(vec![1u8, 2, 3], &[3]).unwrap();
    assert!(matches!(
        data.as_slice::<f32>(),
        Err(GalError::TypeMismatch {
            expected: DataType::Float32,
            got: DataType::UInt8,
            ..
        })
    ));
}

#[test]
fn conversion_maps_blanks_and_out_of_range_to_blank() {
    let data = Data::from_vec(vec![-1.0f64, f64::NAN, 300.0, 7.0], &[4]).unwrap();
    let bytes = data.copy_to_type(DataType::UInt8).unwrap();
    assert_eq!(bytes.as_slice::<u8>().unwrap(), &[255, 255, 255, 7]);

    let text = Data::from_vec(vec![1i32, i32::MIN], &[2])
        .unwrap()
        .copy_to_type(DataType::String)
        .unwrap();
    assert_eq!(text.strings().unwrap()[1], "n/a");
    let back = text.copy_to_type(DataType::Int64).unwrap();
    assert_eq!(back.as_slice::<i64>().unwrap(), &[1, i64::MIN]);
}

#[test]
fn copy_into_shrinks_and_reshape_restores() {
    let small = Data::from_vec(vec![1u16, 2, 3, 4], &[2, 2]).unwrap();
    let mut big = Data::alloc(DataType::Float32, &[3, 3], &AllocOptions::default()).unwrap();
    small.copy_into(&mut big).unwrap();
    assert_eq!(big.dsize(), &[2, 2]);
    assert_eq!(big.capacity(), 9);
    assert_eq!(big.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    big.reshape(&[3, 3]).unwrap();
    assert_eq!(big.size(), 9);
    assert!(big.reshape(&[4, 3]).is_err());

    let mut tiny = Data::alloc(DataType::UInt8, &[1, 2], &AllocOptions::default()).unwrap();
    assert!(small.copy_into(&mut tiny).is_err());
}

#[test]
fn view_is_zero_copy_and_copies_out_contiguously() {
    let values: Vec<i32> = (0..20).collect();
    let block = Data::from_vec(values, &[4, 5])
        .unwrap()
        .with_name("block")
        .with_wcs(Wcs::identity(2));
    let view = block.tile(&[1, 2], &[2, 3]).unwrap();
    assert_eq!(view.start_end(), (vec![1, 2], vec![3, 5]));
    assert_eq!(view.start_end_index(), (7, 14));
    assert_eq!(view.indices().collect::<Vec<_>>(), vec![7, 8, 9, 12, 13, 14]);

    let copied = view.to_data().unwrap();
    assert_eq!(copied.dsize(), &[2, 3]);
    assert_eq!(copied.as_slice::<i32>().unwrap(), &[7, 8, 9, 12, 13, 14]);
    assert_eq!(copied.name.as_deref(), Some("block"));
    assert_eq!(copied.wcs.as_ref().unwrap().crpix, vec![-1.0, -2.0]);

    let as_float = view.to_data_as(DataType::Float64).unwrap();
    assert_eq!(as_float.as_slice::<f64>().unwrap()[5], 14.0);

    assert!(block.tile(&[3, 0], &[2, 1]).is_err());
}
