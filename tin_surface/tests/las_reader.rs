mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use common::{grid, las_bytes, rec, write_las};
use tin_surface::io::las::{read_points, read_points_with, LasReader, ReadOptions};
use tin_surface::lidar::ClassificationFilter;
use tin_surface::TinSurface;

#[test]
fn format_six_classes_and_coordinates() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let file = dir.child("cloud.las");
    let records = vec![
        rec(1000.5, 2000.25, 12.125, 2),
        rec(1001.0, 2001.0, 13.0, 6),
        rec(1002.0, 2002.0, 14.0, 13),
        rec(1003.0, 2003.0, 15.0, 7),
    ];
    write_las(file.path(), 6, &records);

    let pts = read_points(file.path(), &ClassificationFilter::default(), 0).unwrap();
    assert_eq!(pts.len(), 2);
    assert_eq!(pts[0].classification, 2);
    assert_eq!(pts[1].classification, 13);
    assert!((pts[0].x - 1000.5).abs() < 1e-9);
    assert!((pts[0].y - 2000.25).abs() < 1e-9);
    assert!((pts[0].z - 12.125).abs() < 1e-9);
}

#[test]
fn legacy_formats_mask_class_flags() {
    let dir = TempDir::new().unwrap();
    let file = dir.child("legacy.las");
    write_las(
        file.path(),
        1,
        &[rec(1000.0, 2000.0, 1.0, 2), rec(1001.0, 2000.0, 1.0, 5)],
    );
    let pts = read_points(file.path(), &ClassificationFilter::new([2]), 0).unwrap();
    assert_eq!(pts.len(), 1);
    assert_eq!(pts[0].classification, 2);
}

#[test]
fn header_respects_point_offset() {
    let dir = TempDir::new().unwrap();
    let file = dir.child("cloud.las");
    write_las(file.path(), 6, &grid(3, 1.0, |_, _| 5.0));
    let reader = LasReader::open(file.path()).unwrap();
    assert_eq!(reader.header().point_data_offset, 375 + 17);
    assert_eq!(reader.header().point_count, 9);
    let pts = read_points(file.path(), &ClassificationFilter::all(), 0).unwrap();
    assert_eq!(pts.len(), 9);
    assert!(pts.iter().all(|p| (p.z - 5.0).abs() < 1e-9));
}

#[test]
fn decimation_keeps_expected_share() {
    let dir = TempDir::new().unwrap();
    let file = dir.child("cloud.las");
    let mut records = grid(10, 1.0, |x, _| x - 1000.0);
    // Interleave rejected points so decimation counts only retained records.
    for i in 0..50 {
        records.insert(i * 2, rec(900.0, 900.0, 0.0, 6));
    }
    write_las(file.path(), 6, &records);

    for stride in [0usize, 1, 2, 3, 7] {
        let pts = read_points(file.path(), &ClassificationFilter::new([2]), stride).unwrap();
        let expected = 100 / (stride + 1);
        assert!(
            pts.len().abs_diff(expected) <= 1,
            "stride {stride}: {} points",
            pts.len()
        );
        assert!(pts.iter().all(|p| p.classification == 2));
    }

    let read = read_points_with(
        file.path(),
        &ReadOptions {
            classification_filter: ClassificationFilter::new([2]),
            skip_stride: 3,
            trim: None,
            keep_skipped: true,
        },
    )
    .unwrap();
    assert_eq!(read.kept.len() + read.skipped.len(), 100);
    assert_eq!(read.kept.len(), 25);
}

#[test]
fn wrong_signature_builds_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.child("fake.las");
    let mut bytes = las_bytes(6, &grid(3, 1.0, |_, _| 0.0));
    bytes[..4].copy_from_slice(b"LASG");
    file.write_binary(&bytes).unwrap();

    let err = TinSurface::from_las(file.path(), &ReadOptions::default()).unwrap_err();
    assert!(err.is_format_error());
    let msg = err.to_string();
    assert!(predicate::str::contains("LASF").eval(msg.as_str()));
    assert!(predicate::str::contains("fake.las").eval(msg.as_str()));
}

#[test]
fn short_file_is_format_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.child("short.las");
    file.write_binary(b"LASF\0\0\0").unwrap();
    let err = read_points(file.path(), &ClassificationFilter::all(), 0).unwrap_err();
    assert!(err.is_format_error());
    assert!(err.to_string().contains("375-byte header"));
}

#[test]
fn source_file_is_not_modified() {
    let dir = TempDir::new().unwrap();
    let file = dir.child("cloud.las");
    let bytes = las_bytes(6, &grid(4, 1.0, |x, y| x + y));
    file.write_binary(&bytes).unwrap();
    TinSurface::from_las(file.path(), &ReadOptions::default()).unwrap();
    file.assert(predicate::path::exists());
    assert_eq!(std::fs::read(file.path()).unwrap(), bytes);
}
