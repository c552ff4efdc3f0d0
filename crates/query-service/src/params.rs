//! Per-point parameter sets.

use basin::BasinResolver;
use metrics::counter;
use ocean_common::{OceanResult, QueryPoints};
use storage::ParamSet;
use tracing::debug;

/// One parameter set per query point: position, central time, window
/// bounds, radius, missions and connected basins.
pub(crate) fn point_params(points: &QueryPoints, resolver: &BasinResolver) -> OceanResult<Vec<ParamSet>> {
    let basin_sets = resolver.connected_basins_for(&points.latitudes(), &points.longitudes())?;

    // only land resolves to an empty connected set
    let land = basin_sets.iter().filter(|set| set.is_empty()).count();
    if land > 0 {
        counter!("oceandb_land_query_points_total").increment(land as u64);
        debug!(land, "Query points outside every basin will match nothing");
    }

    Ok(points
        .iter()
        .zip(basin_sets)
        .map(|(point, basins)| {
            ParamSet::new()
                .with("latitude", point.latitude)
                .with("longitude", point.signed_longitude())
                .with("central_date_time", point.central_time)
                .with("start_date_time", point.window.start())
                .with("end_date_time", point.window.end())
                .with("radius", point.radius)
                .with("connected_basin_ids", basins)
                .with(
                    "missions",
                    point
                        .missions
                        .iter()
                        .map(|m| m.as_str().to_string())
                        .collect::<Vec<_>>(),
                )
        })
        .collect())
}

/// `requested` as owned names.
pub(crate) fn owned_fields<S: AsRef<str>>(requested: &[S]) -> Vec<String> {
    requested.iter().map(|f| f.as_ref().to_string()).collect()
}

/// `requested` plus any of `extra` it lacks, appended in order.
pub(crate) fn with_fields<S: AsRef<str>>(requested: &[S], extra: &[&str]) -> Vec<String> {
    let mut fields = owned_fields(requested);
    for name in extra {
        if !fields.iter().any(|f| f == name) {
            fields.push(name.to_string());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_common::QueryPoint;
    use storage::ParamValue;

    #[test]
    fn test_with_fields_appends_missing_only() {
        assert_eq!(
            with_fields(&["sla_filtered", "latitude"], &["latitude", "longitude"]),
            vec!["sla_filtered", "latitude", "longitude"]
        );
    }

    #[test]
    fn test_point_params() {
        let world = basin::BasinResolver::new(
            basin::BasinMask::from_fn(18, 36, |lat, _| if lat > 0.0 { 2 } else { 0 }).unwrap(),
            basin::BasinConnectivity::from_pairs([(2, 3)]),
        );
        let t = chrono::Utc::now();
        let points = QueryPoints::from_points(vec![
            QueryPoint::new(45.0, 350.0, t).unwrap(),
            QueryPoint::new(-45.0, 10.0, t).unwrap(),
        ]);

        let sets = point_params(&points, &world).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].get("longitude"), Some(&ParamValue::Float(-10.0)));
        assert_eq!(
            sets[0].get("connected_basin_ids"),
            Some(&ParamValue::IntArray(vec![2, 3]))
        );
        assert_eq!(
            sets[1].get("connected_basin_ids"),
            Some(&ParamValue::IntArray(vec![]))
        );
        assert!(matches!(sets[1].get("missions"), Some(ParamValue::TextArray(m)) if m.len() == 25));
    }
}
