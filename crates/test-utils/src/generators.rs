//! Test data generators for synthetic store rows.
//!
//! Rows are built the way the store returns them: packed integers for the
//! scaled sea-level and eddy fields, plain floats for coordinates, naive UTC
//! timestamps. Random generators are seeded so failures reproduce.

use chrono::{Duration, NaiveDateTime};
use dataset::RawRow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mean Earth radius used for synthetic distances, in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

/// Great-circle distance between two points in meters.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS * a.sqrt().asin()
}

/// One along-track observation as the store returns it.
///
/// `sla_mm` is the packed sea level anomaly in millimeters. The correction
/// fields are derived from it so each row is distinguishable.
pub fn along_track_row(
    latitude: f64,
    longitude: f64,
    date_time: NaiveDateTime,
    mission: &str,
    sla_mm: i16,
) -> RawRow {
    RawRow::new()
        .with("latitude", latitude)
        .with("longitude", longitude)
        .with("date_time", date_time)
        .with("file_name", format!("dt_global_{}_phy_l3_{}.nc", mission, date_time.format("%Y%m%d")))
        .with("mission", mission)
        .with("track", 17i16)
        .with("cycle", 112i16)
        .with("basin_id", 4i16)
        .with("sla_unfiltered", sla_mm)
        .with("sla_filtered", sla_mm.saturating_sub(3))
        .with("dac", 12i16)
        .with("ocean_tide", -250i16)
        .with("internal_tide", 4i16)
        .with("lwe", -1i16)
        .with("mdt", 1050i16)
        .with("tpa_correction", None::<i16>)
}

/// Add the per-query computed columns (`distance`, `delta_t`) to a row,
/// relative to a query point.
pub fn with_query_point(
    row: RawRow,
    latitude: f64,
    longitude: f64,
    central_date_time: NaiveDateTime,
) -> RawRow {
    let lat = row.get("latitude").and_then(raw_f64).unwrap_or(f64::NAN);
    let lon = row.get("longitude").and_then(raw_f64).unwrap_or(f64::NAN);
    let delta_t = match row.get("date_time") {
        Some(dataset::RawValue::Timestamp(t)) => (central_date_time - *t).num_seconds() as f64,
        _ => f64::NAN,
    };
    row.with("distance", great_circle_distance(latitude, longitude, lat, lon))
        .with("delta_t", delta_t)
}

fn raw_f64(value: &dataset::RawValue) -> Option<f64> {
    match value {
        dataset::RawValue::Float(f) => Some(*f),
        dataset::RawValue::Int(i) => Some(*i as f64),
        _ => None,
    }
}

/// `n` along-track rows scattered within one degree and three days of a
/// center, ordered by time.
pub fn along_track_rows(
    seed: u64,
    n: usize,
    center: (f64, f64),
    central_time: NaiveDateTime,
) -> Vec<RawRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let missions = ["j3", "s3a", "al", "c2n"];
    let mut rows: Vec<(NaiveDateTime, RawRow)> = (0..n)
        .map(|_| {
            let lat = (center.0 + rng.gen_range(-1.0..1.0)).clamp(-90.0, 90.0);
            let lon = center.1 + rng.gen_range(-1.0..1.0);
            let time = central_time + Duration::seconds(rng.gen_range(-259_200..259_200));
            let mission = missions[rng.gen_range(0..missions.len())];
            let sla = rng.gen_range(-800i16..800);
            (time, along_track_row(lat, lon, time, mission, sla))
        })
        .collect();
    rows.sort_by_key(|(t, _)| *t);
    rows.into_iter().map(|(_, row)| row).collect()
}

/// One eddy observation as the store returns it.
///
/// Amplitude and speed are packed in units of 1e-4; radii in units of 50 m.
pub fn eddy_row(
    track: i32,
    cyclonic_type: i8,
    observation_number: i32,
    latitude: f64,
    longitude: f64,
    date_time: NaiveDateTime,
) -> RawRow {
    RawRow::new()
        .with("track", track)
        .with("cyclonic_type", cyclonic_type as i16)
        .with("signed_track", track as i64 * cyclonic_type as i64)
        .with("date_time", date_time)
        .with("latitude", latitude)
        .with("longitude", longitude)
        .with("observation_number", observation_number)
        .with("amplitude", 1200i32 + observation_number)
        .with("speed_radius", 800i32)
        .with("effective_radius", 1000i32)
        .with("effective_area", 3.1e9)
        .with("speed_average", 2500i32)
        .with("speed_area", 2.0e9)
        .with("cost_association", 0.25)
        .with("observation_flag", false)
}

/// A daily eddy track of `n` observations drifting west from `start`.
pub fn eddy_track(
    track: i32,
    cyclonic_type: i8,
    n: usize,
    start: (f64, f64),
    start_time: NaiveDateTime,
) -> Vec<RawRow> {
    (0..n)
        .map(|k| {
            eddy_row(
                track,
                cyclonic_type,
                k as i32,
                start.0,
                start.1 - 0.1 * k as f64,
                start_time + Duration::days(k as i64),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 3, 14)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_great_circle_distance() {
        crate::assert_approx_eq!(great_circle_distance(0.0, 0.0, 0.0, 0.0), 0.0, 1e-9);
        // One degree of arc on the equator
        crate::assert_approx_eq!(great_circle_distance(0.0, 0.0, 0.0, 1.0), 111_195.0, 1.0);
        // Symmetric across the antimeridian
        crate::assert_approx_eq!(
            great_circle_distance(0.0, 179.5, 0.0, -179.5),
            great_circle_distance(0.0, 0.0, 0.0, 1.0),
            1e-6
        );
    }

    #[test]
    fn test_along_track_rows_are_reproducible() {
        let a = along_track_rows(7, 25, (-69.0, 28.1), t0());
        let b = along_track_rows(7, 25, (-69.0, 28.1), t0());
        assert_eq!(a, b);
        assert_eq!(a.len(), 25);
    }

    #[test]
    fn test_with_query_point() {
        let row = along_track_row(0.0, 1.0, t0() - Duration::hours(1), "j3", 100);
        let row = with_query_point(row, 0.0, 0.0, t0());
        assert_eq!(row.get("delta_t"), Some(&dataset::RawValue::Float(3600.0)));
        match row.get("distance") {
            Some(dataset::RawValue::Float(d)) => crate::assert_approx_eq!(*d, 111_195.0, 1.0),
            other => panic!("unexpected distance {other:?}"),
        }
    }

    #[test]
    fn test_eddy_track() {
        let rows = eddy_track(42, -1, 5, (-40.0, 10.0), t0());
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[3].get("signed_track"), Some(&dataset::RawValue::Int(-42)));
        assert_eq!(rows[3].get("observation_number"), Some(&dataset::RawValue::Int(3)));
    }
}
