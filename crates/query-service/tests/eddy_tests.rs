//! Eddy service behavior against a scripted backend.

use std::sync::Arc;

use chrono::Duration;
use dataset::{RawRow, SchemaRegistry};
use ocean_common::{OceanError, QueryPoints};
use query_service::{EddyService, QueryDefaults};
use storage::{BatchExecutor, ParamSet, ParamValue};
use test_utils::{
    along_track_rows, eddy_track, points, query_point, reference_time, toy_basin_world,
    RecordingBackend,
};

const TRACK: i64 = -4242;

fn service(backend: &Arc<RecordingBackend>) -> EddyService {
    EddyService::new(
        BatchExecutor::new(backend.clone()),
        Arc::new(toy_basin_world()),
        &SchemaRegistry::builtin(),
        QueryDefaults::default(),
    )
    .unwrap()
}

fn track_rows() -> Vec<RawRow> {
    // a cyclonic eddy in the Southern Ocean
    eddy_track(4242, -1, 5, (-65.0, 28.0), reference_time().naive_utc())
}

/// Answers track lookups for [`TRACK`] and the along-track stage with
/// a few observations.
fn eddy_store(_: usize, set: &ParamSet) -> Vec<RawRow> {
    if set.get("signed_track_id") != Some(&ParamValue::Int(TRACK)) {
        return Vec::new();
    }
    if set.get("connected_basin_ids").is_some() {
        return along_track_rows(1, 6, (-65.0, 27.8), reference_time().naive_utc());
    }
    track_rows()
}

// ============================================================================
// Tracks
// ============================================================================

#[tokio::test]
async fn test_eddy_with_track_id() {
    let backend = Arc::new(RecordingBackend::new(eddy_store));
    let data = service(&backend)
        .eddy_with_track_id(TRACK, &["signed_track", "observation_number", "amplitude"])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(data.names(), vec!["eddy"]);
    let eddy = data.get("eddy").unwrap();
    assert_eq!(eddy.len(), 5);
    assert_eq!(eddy.row_json(0)["signed_track"], TRACK);

    let batch = backend.last_batch().unwrap();
    assert!(batch.sql.contains("track::bigint * cyclonic_type = :signed_track_id"));
}

#[tokio::test]
async fn test_unknown_track_is_none() {
    let backend = Arc::new(RecordingBackend::new(eddy_store));
    let svc = service(&backend);
    assert!(svc.eddy_with_track_id(4242, &svc.default_fields()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_point_fields_need_a_query_point() {
    let backend = Arc::new(RecordingBackend::new(eddy_store));
    let err = service(&backend)
        .eddy_with_track_id(TRACK, &["track", "distance"])
        .await
        .unwrap_err();
    assert!(matches!(err, OceanError::MissingParameter(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_eddy_tracks_in_time_range() {
    let backend = Arc::new(RecordingBackend::new(|_, _| {
        [-7i64, 3, 12]
            .iter()
            .map(|id| RawRow::new().with("signed_track", *id))
            .collect()
    }));
    let start = reference_time();
    let ids = service(&backend)
        .eddy_tracks_in_time_range(start, start + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(ids, vec![-7, 3, 12]);

    let err = service(&backend)
        .eddy_tracks_in_time_range(start, start)
        .await
        .unwrap_err();
    assert!(err.is_caller_error());
    assert_eq!(backend.call_count(), 1);
}

// ============================================================================
// Along-track near an eddy
// ============================================================================

#[tokio::test]
async fn test_along_track_near_eddy() {
    let backend = Arc::new(RecordingBackend::new(eddy_store));
    let data = service(&backend)
        .along_track_near_eddy(TRACK, &["signed_track", "amplitude"], &["sla_filtered", "mission"])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(data.names(), vec!["eddy", "along_track"]);
    assert_eq!(
        data.get("eddy").unwrap().field_names(),
        vec!["signed_track", "amplitude"]
    );
    assert_eq!(data.get("along_track").unwrap().len(), 6);

    let batches = backend.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].template, "eddy_by_track");
    assert_eq!(batches[1].template, "along_track_near_eddy");

    let set = &batches[1].param_sets[0];
    // Southern Ocean and everything connected to it
    assert_eq!(
        set.get("connected_basin_ids"),
        Some(&ParamValue::IntArray(vec![1, 2, 3, 4]))
    );
    let t0 = reference_time().naive_utc();
    assert_eq!(set.get("start_date_time"), Some(&ParamValue::Timestamp(t0)));
    // last observation is four days in, plus one day of search
    assert_eq!(
        set.get("end_date_time"),
        Some(&ParamValue::Timestamp(t0 + Duration::days(5)))
    );
}

#[tokio::test]
async fn test_along_track_near_missing_eddy() {
    let backend = Arc::new(RecordingBackend::new(eddy_store));
    let result = service(&backend)
        .along_track_near_eddy(1, &["track"], &["sla_filtered"])
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_along_track_near_eddy_rejects_unknown_fields() {
    let backend = Arc::new(RecordingBackend::new(eddy_store));
    let err = service(&backend)
        .along_track_near_eddy(TRACK, &["track"], &["sla_filtered", "salinity"])
        .await
        .unwrap_err();
    assert!(matches!(err, OceanError::UnknownField { .. }));
    assert_eq!(backend.call_count(), 0);
}

// ============================================================================
// Point queries
// ============================================================================

#[tokio::test]
async fn test_eddies_in_radius_per_point() {
    let backend = Arc::new(RecordingBackend::new(|i, _| {
        if i == 1 {
            Vec::new()
        } else {
            eddy_track(i as i32 + 1, 1, 2, (-40.0, 10.0), reference_time().naive_utc())
        }
    }));
    let points = QueryPoints::from_points(vec![
        query_point(points::SOUTHERN_OCEAN),
        query_point(points::AFRICA),
        query_point(points::INDIAN_OCEAN),
    ]);

    let results = service(&backend)
        .eddies_in_r_dt(&points, &["track", "latitude"])
        .await
        .unwrap()
        .collect_all()
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[1].is_none());
    assert_eq!(results[2].as_ref().unwrap().row_json(0)["track"], 3);

    let batch = backend.last_batch().unwrap();
    assert!(batch.sql.contains("ST_Intersects(basin.basin_geog, eddy.eddy_point)"));
}

#[tokio::test]
async fn test_eddy_nearest_neighbors_template() {
    let backend = Arc::new(RecordingBackend::empty());
    let points = QueryPoints::from_points(vec![query_point(points::CENTRAL_PACIFIC)]);
    let results = service(&backend)
        .eddy_nearest_neighbors(&points, &["signed_track", "distance"])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let batch = backend.last_batch().unwrap();
    assert_eq!(batch.template, "eddy_nearest_neighbors");
    assert!(batch.sql.trim_end().ends_with("LIMIT 3"));
}
