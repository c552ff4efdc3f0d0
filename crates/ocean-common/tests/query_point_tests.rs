//! Tests for building query points from parallel arrays.

use chrono::{DateTime, Duration, TimeZone, Utc};
use ocean_common::{Mission, OceanError, QueryPoints};

fn times(n: usize) -> Vec<DateTime<Utc>> {
    (0..n)
        .map(|i| Utc.with_ymd_and_hms(2013, 3, 14, 23, 0, 0).unwrap() + Duration::hours(i as i64))
        .collect()
}

// ============================================================================
// Array length invariants
// ============================================================================

#[test]
fn test_equal_length_arrays() {
    let points = QueryPoints::from_arrays(&[-69.0, 10.0], &[28.1, -45.0], &times(2)).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points.latitudes(), vec![-69.0, 10.0]);
    assert_eq!(points.longitudes(), vec![28.1, -45.0]);
}

#[test]
fn test_longitude_length_mismatch() {
    let err = QueryPoints::from_arrays(&[-69.0, 10.0], &[28.1], &times(2)).unwrap_err();
    match err {
        OceanError::LengthMismatch {
            field,
            expected,
            actual,
        } => {
            assert_eq!(field, "longitudes");
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_time_length_mismatch() {
    let err = QueryPoints::from_arrays(&[-69.0], &[28.1], &times(3)).unwrap_err();
    assert!(matches!(err, OceanError::LengthMismatch { .. }));
    assert!(err.is_caller_error());
}

#[test]
fn test_radii_length_mismatch() {
    let points = QueryPoints::from_arrays(&[-69.0, 10.0], &[28.1, -45.0], &times(2)).unwrap();
    let err = points.with_radii(&[1000.0]).unwrap_err();
    assert!(matches!(err, OceanError::LengthMismatch { .. }));
}

#[test]
fn test_empty_arrays() {
    let points = QueryPoints::from_arrays(&[], &[], &[]).unwrap();
    assert!(points.is_empty());
}

// ============================================================================
// Per-point options
// ============================================================================

#[test]
fn test_per_point_radii() {
    let points = QueryPoints::from_arrays(&[-69.0, 10.0], &[28.1, -45.0], &times(2))
        .unwrap()
        .with_radii(&[1000.0, 2000.0])
        .unwrap();
    let radii: Vec<f64> = points.iter().map(|p| p.radius).collect();
    assert_eq!(radii, vec![1000.0, 2000.0]);
}

#[test]
fn test_non_positive_radius_rejected() {
    let points = QueryPoints::from_arrays(&[-69.0], &[28.1], &times(1)).unwrap();
    assert!(points.clone().with_radius(0.0).is_err());
    assert!(points.with_radius(-5.0).is_err());
}

#[test]
fn test_time_window_is_centered() {
    let points = QueryPoints::from_arrays(&[-69.0], &[28.1], &times(1))
        .unwrap()
        .with_time_window(Duration::days(10))
        .unwrap();
    let p = &points.as_slice()[0];
    assert_eq!(p.central_time - p.window.start(), Duration::days(5));
    assert_eq!(p.window.end() - p.central_time, Duration::days(5));
}

#[test]
fn test_oversized_time_window_is_a_caller_error() {
    let points = QueryPoints::from_arrays(&[-69.0, 10.0], &[28.1, 20.0], &times(2)).unwrap();
    let err = points
        .clone()
        .with_time_window(Duration::days(200_000_000))
        .unwrap_err();
    assert!(matches!(err, OceanError::InvalidParameter { .. }));
    assert!(points.with_time_window(Duration::seconds(-1)).is_err());
}

#[test]
fn test_mission_filter() {
    let missions = Mission::parse_list(["al", "j3"]).unwrap();
    let points = QueryPoints::from_arrays(&[-69.0], &[28.1], &times(1))
        .unwrap()
        .with_missions(&missions)
        .unwrap();
    assert_eq!(points.as_slice()[0].missions, missions);
}

#[test]
fn test_empty_mission_filter_rejected() {
    let points = QueryPoints::from_arrays(&[-69.0], &[28.1], &times(1)).unwrap();
    assert!(points.with_missions(&[]).is_err());
}
