//! Along-track service behavior against a scripted backend.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use dataset::{RawRow, SchemaRegistry};
use ocean_common::{OceanError, QueryPoints, TimeWindow};
use query_service::{AlongTrackService, QueryDefaults};
use storage::{BatchExecutor, ParamSet, ParamValue};
use test_utils::{
    along_track_row, along_track_rows, assert_approx_eq, basins, points, query_point,
    reference_time, toy_basin_world, with_query_point, RecordingBackend,
};

fn service(backend: &Arc<RecordingBackend>) -> AlongTrackService {
    AlongTrackService::new(
        BatchExecutor::new(backend.clone()),
        Arc::new(toy_basin_world()),
        &SchemaRegistry::builtin(),
        QueryDefaults::default(),
    )
    .unwrap()
}

fn float(set: &ParamSet, name: &str) -> f64 {
    match set.get(name) {
        Some(ParamValue::Float(v)) => *v,
        other => panic!("parameter {name} is {other:?}"),
    }
}

fn timestamp(set: &ParamSet, name: &str) -> NaiveDateTime {
    match set.get(name) {
        Some(ParamValue::Timestamp(t)) => *t,
        other => panic!("parameter {name} is {other:?}"),
    }
}

fn basin_ids(set: &ParamSet) -> Vec<i64> {
    match set.get("connected_basin_ids") {
        Some(ParamValue::IntArray(ids)) => ids.clone(),
        other => panic!("connected_basin_ids is {other:?}"),
    }
}

/// Behaves like the store: no rows outside every basin, otherwise a few
/// observations around the query point.
fn store_like(i: usize, set: &ParamSet) -> Vec<RawRow> {
    if basin_ids(set).is_empty() {
        return Vec::new();
    }
    let (lat, lon) = (float(set, "latitude"), float(set, "longitude"));
    let t = timestamp(set, "central_date_time");
    along_track_rows(i as u64, 4 + i, (lat, lon), t)
        .into_iter()
        .map(|row| with_query_point(row, lat, lon, t))
        .collect()
}

fn scenario() -> QueryPoints {
    QueryPoints::from_points(vec![
        query_point(points::SOUTHERN_OCEAN),
        query_point(points::CASPIAN),
        query_point(points::AFRICA),
        query_point(points::CENTRAL_PACIFIC),
    ])
}

const FIELDS: [&str; 5] = ["latitude", "longitude", "date_time", "sla_filtered", "distance"];

// ============================================================================
// Radius queries
// ============================================================================

#[tokio::test]
async fn test_radius_query_one_result_per_point() {
    let backend = Arc::new(RecordingBackend::new(store_like));
    let results = service(&backend)
        .geographic_points_in_r_dt(&scenario(), &FIELDS)
        .await
        .unwrap()
        .collect_all()
        .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(backend.call_count(), 1);

    let southern = results[0].as_ref().unwrap();
    assert_eq!(southern.len(), 4);
    assert_eq!(southern.field_names(), FIELDS.to_vec());
    assert!(southern.f64_column("latitude").unwrap().iter().all(|lat| *lat < -67.0));

    assert_eq!(results[1].as_ref().unwrap().len(), 5);
    assert!(results[2].is_none(), "land point must match nothing");
    let pacific = results[3].as_ref().unwrap();
    assert!(pacific.f64_column("latitude").unwrap().iter().all(|lat| lat.abs() < 1.0));
}

#[tokio::test]
async fn test_radius_query_binds_connected_basins() {
    let backend = Arc::new(RecordingBackend::empty());
    service(&backend)
        .geographic_points_in_r_dt(&scenario(), &FIELDS)
        .await
        .unwrap();

    let batch = backend.last_batch().unwrap();
    assert_eq!(batch.template, "along_track_radius");
    let sets = &batch.param_sets;
    assert_eq!(basin_ids(&sets[0]), vec![1, 2, 3, 4]);
    assert_eq!(basin_ids(&sets[1]), vec![basins::CASPIAN as i64]);
    assert!(basin_ids(&sets[2]).is_empty());
    assert_eq!(float(&sets[0], "radius"), 500_000.0);
    // signed longitude convention for the store
    assert_eq!(float(&sets[3], "longitude"), -150.0);

    let start = timestamp(&sets[0], "start_date_time");
    let end = timestamp(&sets[0], "end_date_time");
    assert_eq!((end - start).num_seconds(), 856_710);
    assert_eq!(timestamp(&sets[0], "central_date_time"), reference_time().naive_utc());
}

#[tokio::test]
async fn test_interleaved_store_rows_keep_point_order() {
    let backend = Arc::new(RecordingBackend::new(store_like).interleaved());
    let results = service(&backend)
        .geographic_points_in_r_dt(&scenario(), &FIELDS)
        .await
        .unwrap()
        .collect_all()
        .unwrap();

    let lengths: Vec<Option<usize>> = results.iter().map(|r| r.as_ref().map(|d| d.len())).collect();
    assert_eq!(lengths, vec![Some(4), Some(5), None, Some(7)]);
}

#[tokio::test]
async fn test_unknown_field_fails_before_round_trip() {
    let backend = Arc::new(RecordingBackend::new(store_like));
    let err = service(&backend)
        .geographic_points_in_r_dt(&scenario(), &["sla_filtered", "salinity"])
        .await
        .unwrap_err();

    assert!(matches!(err, OceanError::UnknownField { .. }));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_no_points_no_round_trip() {
    let backend = Arc::new(RecordingBackend::new(store_like));
    let results = service(&backend)
        .geographic_points_in_r_dt(&QueryPoints::default(), &FIELDS)
        .await
        .unwrap();

    assert_eq!(results.len(), 0);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_store_failure_fails_the_call() {
    let backend = Arc::new(RecordingBackend::failing("canceling statement due to statement timeout"));
    let err = service(&backend)
        .geographic_points_in_r_dt(&scenario(), &FIELDS)
        .await
        .unwrap_err();
    assert!(matches!(err, OceanError::DatabaseError(_)));
}

// ============================================================================
// Nearest neighbors
// ============================================================================

#[tokio::test]
async fn test_nearest_neighbors_template() {
    let backend = Arc::new(RecordingBackend::new(|i, set| store_like(i, set).into_iter().take(3).collect()));
    let results = service(&backend)
        .nearest_neighbors(&scenario(), &["sla_filtered", "distance", "delta_t"])
        .await
        .unwrap()
        .collect_all()
        .unwrap();

    let batch = backend.last_batch().unwrap();
    assert_eq!(batch.template, "along_track_nearest_neighbors");
    assert!(batch.sql.trim_end().ends_with("LIMIT 3"));
    assert!(batch.sql.contains(":central_date_time"));

    assert_eq!(results[0].as_ref().unwrap().len(), 3);
    assert!(results[2].is_none());
}

// ============================================================================
// Projected queries
// ============================================================================

#[tokio::test]
async fn test_projected_radius_adds_offsets() {
    let backend = Arc::new(RecordingBackend::new(store_like));
    let results = service(&backend)
        .projected_points_in_r_dt(&scenario(), &["sla_filtered"])
        .await
        .unwrap()
        .collect_all()
        .unwrap();

    // coordinates are fetched for the offsets but not returned
    let sql = backend.last_batch().unwrap().sql;
    assert!(sql.contains("latitude, longitude"));

    let southern = results[0].as_ref().unwrap();
    assert_eq!(southern.field_names(), vec!["sla_filtered", "delta_x", "delta_y"]);
    let dy = southern.f64_column("delta_y").unwrap();
    assert!(dy.iter().all(|d| d.abs() < 120_000.0));
}

#[tokio::test]
async fn test_projected_box_keeps_rows_inside_box() {
    let (lat0, lon0) = points::INDIAN_OCEAN;
    let t = reference_time().naive_utc();
    let backend = Arc::new(RecordingBackend::new(move |_, _| {
        vec![
            // at the center
            along_track_row(lat0, lon0, t, "j3", 100),
            // ~0.5 degree north: inside a 100 km half-height
            along_track_row(lat0 + 0.5, lon0, t, "j3", 200),
            // ~3 degrees east: outside a 100 km half-width
            along_track_row(lat0, lon0 + 3.0, t, "j3", 300),
        ]
    }));

    let points = QueryPoints::from_points(vec![query_point(points::INDIAN_OCEAN)]);
    let results = service(&backend)
        .projected_points_in_dx_dy_dt(&points, &["sla_filtered", "latitude"], 100_000.0, 100_000.0, true)
        .await
        .unwrap()
        .collect_all()
        .unwrap();

    let ds = results[0].as_ref().unwrap();
    assert_eq!(ds.field_names(), vec!["sla_filtered", "latitude", "delta_x", "delta_y"]);
    assert_eq!(ds.len(), 2);
    let sla = ds.f64_column("sla_filtered").unwrap();
    assert_approx_eq!(sla[0], 0.097, 1e-12);
    assert_approx_eq!(sla[1], 0.197, 1e-12);

    let batch = backend.last_batch().unwrap();
    assert_eq!(batch.template, "along_track_box");
    let set = &batch.param_sets[0];
    assert!(float(set, "min_lat") < lat0 && float(set, "max_lat") > lat0);
    assert!(float(set, "min_lon") < lon0 && float(set, "max_lon") > lon0);
    // the envelope of a 200 km box is about 1.8 degrees tall
    assert_approx_eq!(float(set, "max_lat") - float(set, "min_lat"), 1.8, 0.05);
}

#[tokio::test]
async fn test_projected_box_without_basin_mask() {
    let backend = Arc::new(RecordingBackend::empty());
    let results = service(&backend)
        .projected_points_in_dx_dy_dt(&scenario(), &["sla_filtered"], 50_000.0, 80_000.0, false)
        .await
        .unwrap();
    assert_eq!(results.len(), 4);

    let batch = backend.last_batch().unwrap();
    assert_eq!(batch.template, "along_track_box_no_mask");
    assert!(!batch.sql.contains(":connected_basin_ids"));
}

#[tokio::test]
async fn test_projected_box_rejects_bad_extent() {
    let backend = Arc::new(RecordingBackend::empty());
    let err = service(&backend)
        .projected_points_in_dx_dy_dt(&scenario(), &["sla_filtered"], 0.0, 1000.0, true)
        .await
        .unwrap_err();
    assert!(matches!(err, OceanError::InvalidParameter { ref param, .. } if param == "lx"));
    assert_eq!(backend.call_count(), 0);
}

// ============================================================================
// Time windows
// ============================================================================

#[test]
fn test_oversized_default_window_rejected_at_construction() {
    let backend = Arc::new(RecordingBackend::empty());
    let err = AlongTrackService::new(
        BatchExecutor::new(backend.clone()),
        Arc::new(toy_basin_world()),
        &SchemaRegistry::builtin(),
        QueryDefaults {
            time_window: Duration::days(200_000_000),
            ..QueryDefaults::default()
        },
    )
    .err()
    .unwrap();
    assert!(matches!(err, OceanError::ConfigError(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_unchecked_window_is_clamped_not_overflowed() {
    let backend = Arc::new(RecordingBackend::empty());
    let mut point = query_point(points::SOUTHERN_OCEAN);
    point.window = TimeWindow::new(point.central_time, Duration::days(200_000_000));

    let results = service(&backend)
        .geographic_points_in_r_dt(&QueryPoints::from_points(vec![point]), &FIELDS)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);

    let batch = backend.last_batch().unwrap();
    assert_eq!(timestamp(&batch.param_sets[0], "start_date_time"), DateTime::<Utc>::MIN_UTC.naive_utc());
    assert_eq!(timestamp(&batch.param_sets[0], "end_date_time"), DateTime::<Utc>::MAX_UTC.naive_utc());
}
