//! Decoding generated store rows through the built-in schemas.

use chrono::NaiveDateTime;
use dataset::{decode, along_track_schema, eddy_schema, ColumnData, OceanData, SchemaRegistry};
use ocean_common::OceanError;
use test_utils::{along_track_row, along_track_rows, assert_approx_eq, eddy_track, reference_time, with_query_point};

fn t0() -> NaiveDateTime {
    reference_time().naive_utc()
}

// ============================================================================
// Along-track
// ============================================================================

#[test]
fn test_decode_full_along_track_rows() {
    let rows: Vec<_> = along_track_rows(11, 40, (-69.0, 28.1), t0())
        .into_iter()
        .map(|r| with_query_point(r, -69.0, 28.1, t0()))
        .collect();
    let schema = along_track_schema();
    let requested = schema.field_names();

    let ds = decode(&rows, &schema, &requested).unwrap().unwrap();
    assert_eq!(ds.len(), 40);
    assert_eq!(ds.field_names(), requested);

    // tpa_correction is NULL in every generated row
    let tpa = ds.f64_column("tpa_correction").unwrap();
    assert!(tpa.iter().all(|v| v.is_nan()));

    let distance = ds.f64_column("distance").unwrap();
    assert!(distance.iter().all(|d| *d >= 0.0 && *d < 300_000.0));
}

#[test]
fn test_sea_level_values_are_scaled() {
    let rows = vec![
        along_track_row(-69.0, 28.1, t0(), "j3", 1234),
        along_track_row(-69.1, 28.2, t0(), "j3", -56),
    ];
    let ds = decode(&rows, &along_track_schema(), &["sla_unfiltered", "sla_filtered", "mdt"])
        .unwrap()
        .unwrap();

    let sla = ds.f64_column("sla_unfiltered").unwrap();
    assert_approx_eq!(sla[0], 1.234, 1e-12);
    assert_approx_eq!(sla[1], -0.056, 1e-12);

    let filtered = ds.f64_column("sla_filtered").unwrap();
    assert_approx_eq!(filtered[0], 1.231, 1e-12);

    let mdt = ds.f64_column("mdt").unwrap();
    assert_approx_eq!(mdt[1], 1.05, 1e-12);
}

#[test]
fn test_declared_types_are_applied() {
    let rows = vec![along_track_row(-69.0, 28.1, t0(), "s3a", 10)];
    let ds = decode(&rows, &along_track_schema(), &["track", "mission", "date_time"])
        .unwrap()
        .unwrap();

    assert!(matches!(ds.get("track").unwrap(), ColumnData::I16(v) if v == &[17]));
    assert!(matches!(ds.get("mission").unwrap(), ColumnData::Text(v) if v == &["s3a".to_string()]));
    assert!(matches!(ds.get("date_time").unwrap(), ColumnData::Timestamp(v) if v == &[t0()]));
}

#[test]
fn test_requested_field_missing_from_rows() {
    // rows without the per-query computed columns
    let rows = vec![along_track_row(-69.0, 28.1, t0(), "j3", 10)];
    let err = decode(&rows, &along_track_schema(), &["sla_filtered", "distance"]).unwrap_err();
    assert!(matches!(err, OceanError::MissingColumn(ref f) if f == "distance"));
}

#[test]
fn test_unknown_field_is_caller_error() {
    let rows = vec![along_track_row(-69.0, 28.1, t0(), "j3", 10)];
    let err = decode(&rows, &along_track_schema(), &["salinity"]).unwrap_err();
    assert!(err.is_caller_error());
}

// ============================================================================
// Eddies
// ============================================================================

#[test]
fn test_decode_eddy_track() {
    let rows = eddy_track(9001, -1, 6, (-40.0, 10.0), t0());
    let ds = decode(
        &rows,
        &eddy_schema(),
        &["signed_track", "observation_number", "amplitude", "effective_radius", "observation_flag"],
    )
    .unwrap()
    .unwrap();

    assert_eq!(ds.len(), 6);
    assert!(matches!(ds.get("signed_track").unwrap(), ColumnData::I64(v) if v.iter().all(|t| *t == -9001)));

    let amplitude = ds.f64_column("amplitude").unwrap();
    assert_approx_eq!(amplitude[0], 0.12, 1e-12);
    assert_approx_eq!(amplitude[5], 0.1205, 1e-12);

    let radius = ds.f64_column("effective_radius").unwrap();
    assert_approx_eq!(radius[0], 50_000.0, 1e-9);
}

#[test]
fn test_registry_lookup_and_collection() {
    let registry = SchemaRegistry::builtin();
    let along = registry.get("along_track").unwrap();
    let eddy = registry.get("eddy").unwrap();

    let mut data = OceanData::default();
    let track = decode(&along_track_rows(3, 5, (0.0, -150.0), t0()), &along, &["sla_filtered"])
        .unwrap()
        .unwrap();
    let eddies = decode(&eddy_track(1, 1, 2, (0.0, -150.0), t0()), &eddy, &["track"])
        .unwrap()
        .unwrap();
    data.add(track).unwrap();
    data.add(eddies).unwrap();
    assert_eq!(data.names(), vec!["along_track", "eddy"]);

    let again = decode(&eddy_track(2, 1, 1, (0.0, 0.0), t0()), &eddy, &["track"])
        .unwrap()
        .unwrap();
    assert!(matches!(data.add(again), Err(OceanError::DuplicateDataset(_))));
}
