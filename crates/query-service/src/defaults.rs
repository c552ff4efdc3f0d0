//! Service-wide query defaults.

use chrono::{DateTime, Duration, Utc};
use dataset::Schema;
use ocean_common::{
    Mission, OceanError, OceanResult, QueryPoints, DEFAULT_RADIUS_METERS, DEFAULT_TIME_WINDOW_SECS,
};
use serde::{Deserialize, Serialize};

/// Fields computed relative to a query point. They can only be requested
/// from point queries.
pub const POINT_RELATIVE_FIELDS: [&str; 2] = ["distance", "delta_t"];

/// Defaults applied to query points built by a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    /// Search radius in meters.
    pub radius: f64,
    /// Full width of the time window.
    #[serde(with = "ocean_common::time::duration_secs")]
    pub time_window: Duration,
    pub missions: Vec<Mission>,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS_METERS,
            time_window: Duration::seconds(DEFAULT_TIME_WINDOW_SECS),
            missions: Mission::all(),
        }
    }
}

impl QueryDefaults {
    pub fn validate(&self) -> OceanResult<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(OceanError::ConfigError(format!(
                "default radius must be a positive number of meters, got {}",
                self.radius
            )));
        }
        ocean_common::time::check_window_width(self.time_window)
            .map_err(|e| OceanError::ConfigError(format!("default time window: {}", e)))?;
        if self.missions.is_empty() {
            return Err(OceanError::ConfigError(
                "at least one default mission is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Query points from parallel arrays with these defaults applied.
    pub fn points(
        &self,
        latitudes: &[f64],
        longitudes: &[f64],
        times: &[DateTime<Utc>],
    ) -> OceanResult<QueryPoints> {
        QueryPoints::from_arrays(latitudes, longitudes, times)?
            .with_radius(self.radius)?
            .with_time_window(self.time_window)?
            .with_missions(&self.missions)
    }
}

/// Every field of `schema` that is read from storage rather than computed
/// relative to a query point.
pub fn stored_fields(schema: &Schema) -> Vec<String> {
    schema
        .field_names()
        .into_iter()
        .filter(|name| !POINT_RELATIVE_FIELDS.contains(name))
        .map(str::to_string)
        .collect()
}
