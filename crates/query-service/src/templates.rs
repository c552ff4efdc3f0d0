//! Canonical query templates.
//!
//! Templates take the rendered select list of the requested fields and use
//! `:name` parameters bound per query point. Parameter names shared by all
//! point templates:
//!
//! | parameter             | type        |
//! |-----------------------|-------------|
//! | `latitude`            | float       |
//! | `longitude`           | float       |
//! | `central_date_time`   | timestamp   |
//! | `start_date_time`     | timestamp   |
//! | `end_date_time`       | timestamp   |
//! | `radius`              | float       |
//! | `connected_basin_ids` | int array   |
//! | `missions`            | text array  |

use dataset::registry::EDDY_RADIUS_SCALE;
use dataset::Schema;
use ocean_common::OceanResult;
use storage::QueryTemplate;

pub const ALONG_TRACK_RADIUS: &str = "along_track_radius";
pub const ALONG_TRACK_NEAREST: &str = "along_track_nearest_neighbors";
pub const ALONG_TRACK_BOX: &str = "along_track_box";
pub const ALONG_TRACK_BOX_NO_MASK: &str = "along_track_box_no_mask";
pub const ALONG_TRACK_NEAR_EDDY: &str = "along_track_near_eddy";
pub const EDDY_BY_TRACK: &str = "eddy_by_track";
pub const EDDY_TRACKS_IN_RANGE: &str = "eddy_tracks_in_range";
pub const EDDY_RADIUS: &str = "eddy_radius";
pub const EDDY_NEAREST: &str = "eddy_nearest_neighbors";

/// Number of rows kept by the nearest-neighbor templates.
pub const NEAREST_NEIGHBOR_COUNT: usize = 3;

/// Along-track observations within `radius` meters of the point, inside the
/// time window, in the point's connected basins.
pub fn along_track_radius_sql(select: &str) -> String {
    format!(
        "SELECT {select}
FROM along_track
WHERE date_time BETWEEN :start_date_time AND :end_date_time
  AND mission = ANY(:missions)
  AND basin_id = ANY(:connected_basin_ids)
  AND ST_DWithin(along_track_point, ST_MakePoint(:longitude, :latitude)::geography, :radius)
ORDER BY date_time"
    )
}

/// The closest along-track observations to the point inside the time
/// window, in the point's connected basins.
pub fn along_track_nearest_sql(select: &str) -> String {
    format!(
        "SELECT {select}
FROM along_track
WHERE date_time BETWEEN :start_date_time AND :end_date_time
  AND mission = ANY(:missions)
  AND basin_id = ANY(:connected_basin_ids)
ORDER BY along_track_point <-> ST_MakePoint(:longitude, :latitude)::geography
LIMIT {NEAREST_NEIGHBOR_COUNT}"
    )
}

/// Longitude test for `[min_lon, max_lon]` that works in any longitude
/// convention and across the antimeridian.
fn longitude_in_range(column: &str) -> String {
    format!(
        "({column} - :min_lon) - 360.0 * floor(({column} - :min_lon) / 360.0) <= (:max_lon - :min_lon)"
    )
}

/// Along-track observations inside a geographic envelope and the time
/// window, optionally restricted to the point's connected basins.
pub fn along_track_box_sql(select: &str, basin_mask: bool) -> String {
    let basin_filter = if basin_mask {
        "\n  AND basin_id = ANY(:connected_basin_ids)"
    } else {
        ""
    };
    format!(
        "SELECT {select}
FROM along_track
WHERE date_time BETWEEN :start_date_time AND :end_date_time
  AND mission = ANY(:missions)
  AND latitude BETWEEN :min_lat AND :max_lat
  AND {lon}{basin_filter}
ORDER BY date_time",
        lon = longitude_in_range("longitude"),
    )
}

/// Every observation of one eddy, by signed track id.
pub fn eddy_by_track_sql(select: &str) -> String {
    format!(
        "SELECT {select}
FROM eddy
WHERE track::bigint * cyclonic_type = :signed_track_id
ORDER BY date_time, observation_number"
    )
}

/// Distinct signed track ids observed in `[start_date_time, end_date_time)`.
pub fn eddy_tracks_in_range_sql() -> String {
    "SELECT DISTINCT track::bigint * cyclonic_type AS signed_track
FROM eddy
WHERE date_time >= :start_date_time
  AND date_time < :end_date_time
ORDER BY signed_track"
        .to_string()
}

/// Along-track observations within twice the speed radius of any
/// observation of one eddy, up to a day after that observation.
pub fn along_track_near_eddy_sql(select: &str) -> String {
    format!(
        "SELECT {select}
FROM along_track
WHERE date_time BETWEEN :start_date_time AND :end_date_time
  AND basin_id = ANY(:connected_basin_ids)
  AND EXISTS (
    SELECT 1
    FROM eddy
    WHERE eddy.track::bigint * eddy.cyclonic_type = :signed_track_id
      AND along_track.date_time BETWEEN eddy.date_time AND eddy.date_time + interval '1 day'
      AND ST_DWithin(along_track.along_track_point, eddy.eddy_point, eddy.speed_radius * {scale:.1} * 2.0)
  )
ORDER BY date_time",
        scale = EDDY_RADIUS_SCALE,
    )
}

const EDDY_BASIN_FILTER: &str = "EXISTS (
    SELECT 1
    FROM basin
    WHERE basin.id = ANY(:connected_basin_ids)
      AND ST_Intersects(basin.basin_geog, eddy.eddy_point)
  )";

/// Eddy observations within `radius` meters of the point, inside the time
/// window, over the point's connected basins.
pub fn eddy_radius_sql(select: &str) -> String {
    format!(
        "SELECT {select}
FROM eddy
WHERE date_time BETWEEN :start_date_time AND :end_date_time
  AND ST_DWithin(eddy_point, ST_MakePoint(:longitude, :latitude)::geography, :radius)
  AND {EDDY_BASIN_FILTER}
ORDER BY date_time"
    )
}

/// The closest eddy observations to the point inside the time window.
pub fn eddy_nearest_sql(select: &str) -> String {
    format!(
        "SELECT {select}
FROM eddy
WHERE date_time BETWEEN :start_date_time AND :end_date_time
  AND {EDDY_BASIN_FILTER}
ORDER BY eddy_point <-> ST_MakePoint(:longitude, :latitude)::geography
LIMIT {NEAREST_NEIGHBOR_COUNT}"
    )
}

/// Render the select list for `fields` and compile the template built
/// around it.
pub fn compile<S, F>(name: &str, schema: &Schema, fields: &[S], build: F) -> OceanResult<QueryTemplate>
where
    S: AsRef<str>,
    F: FnOnce(&str) -> String,
{
    let select = schema.render(fields)?;
    QueryTemplate::compile(name, &build(&select))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::{along_track_schema, eddy_schema};

    fn params_of(template: &QueryTemplate) -> Vec<&str> {
        let mut params: Vec<&str> = template.params().iter().map(String::as_str).collect();
        params.sort_unstable();
        params
    }

    #[test]
    fn test_radius_template_params() {
        let template = compile(
            ALONG_TRACK_RADIUS,
            &along_track_schema(),
            &["sla_filtered", "distance"],
            along_track_radius_sql,
        )
        .unwrap();
        assert_eq!(
            params_of(&template),
            vec![
                "connected_basin_ids",
                "end_date_time",
                "latitude",
                "longitude",
                "missions",
                "radius",
                "start_date_time",
            ]
        );
    }

    #[test]
    fn test_nearest_template_limits_rows() {
        let sql = along_track_nearest_sql("sla_filtered");
        assert!(sql.ends_with("LIMIT 3"));
    }

    #[test]
    fn test_box_template_mask_is_optional() {
        let schema = along_track_schema();
        let masked = compile(ALONG_TRACK_BOX, &schema, &["latitude"], |s| {
            along_track_box_sql(s, true)
        })
        .unwrap();
        let unmasked = compile(ALONG_TRACK_BOX_NO_MASK, &schema, &["latitude"], |s| {
            along_track_box_sql(s, false)
        })
        .unwrap();
        assert!(masked.params().iter().any(|p| p == "connected_basin_ids"));
        assert!(!unmasked.params().iter().any(|p| p == "connected_basin_ids"));
        assert!(unmasked.params().iter().any(|p| p == "max_lon"));
    }

    #[test]
    fn test_near_eddy_template() {
        let sql = along_track_near_eddy_sql("sla_filtered");
        assert!(sql.contains("eddy.speed_radius * 50.0 * 2.0"));
        let template = QueryTemplate::compile(ALONG_TRACK_NEAR_EDDY, &sql).unwrap();
        assert_eq!(
            params_of(&template),
            vec![
                "connected_basin_ids",
                "end_date_time",
                "signed_track_id",
                "start_date_time",
            ]
        );
    }

    #[test]
    fn test_eddy_templates_compile() {
        let schema = eddy_schema();
        for (name, build) in [
            (EDDY_BY_TRACK, eddy_by_track_sql as fn(&str) -> String),
            (EDDY_RADIUS, eddy_radius_sql),
            (EDDY_NEAREST, eddy_nearest_sql),
        ] {
            compile(name, &schema, &["signed_track", "amplitude"], build).unwrap();
        }
        QueryTemplate::compile(EDDY_TRACKS_IN_RANGE, &eddy_tracks_in_range_sql()).unwrap();
    }

    #[test]
    fn test_unknown_field_fails_before_compile() {
        let err = compile(
            ALONG_TRACK_RADIUS,
            &along_track_schema(),
            &["salinity"],
            along_track_radius_sql,
        )
        .unwrap_err();
        assert!(err.is_caller_error());
    }
}
