//! Query points: the per-point inputs of a spatiotemporal batch query.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};
use crate::mission::Mission;
use crate::time::{TimeWindow, DEFAULT_TIME_WINDOW_SECS};

/// Default search radius around a query point.
pub const DEFAULT_RADIUS_METERS: f64 = 500_000.0;

/// One spatiotemporal search: a position, a central time, a search radius,
/// a time window and the missions to consider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    /// Latitude in degrees, within [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, any range.
    pub longitude: f64,
    pub central_time: DateTime<Utc>,
    /// Search radius in meters.
    pub radius: f64,
    pub window: TimeWindow,
    pub missions: Vec<Mission>,
}

impl QueryPoint {
    /// Create a query point with the default radius, window and missions.
    pub fn new(latitude: f64, longitude: f64, central_time: DateTime<Utc>) -> OceanResult<Self> {
        validate_position(latitude, longitude)?;
        let window = TimeWindow::try_new(central_time, Duration::seconds(DEFAULT_TIME_WINDOW_SECS))?;
        Ok(Self {
            latitude,
            longitude,
            central_time,
            radius: DEFAULT_RADIUS_METERS,
            window,
            missions: Mission::all(),
        })
    }

    /// Longitude normalized to [0, 360).
    pub fn normalized_longitude(&self) -> f64 {
        self.longitude.rem_euclid(360.0)
    }

    /// Longitude normalized to [-180, 180).
    pub fn signed_longitude(&self) -> f64 {
        let lon = self.normalized_longitude();
        if lon >= 180.0 {
            lon - 360.0
        } else {
            lon
        }
    }
}

fn validate_position(latitude: f64, longitude: f64) -> OceanResult<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(OceanError::invalid_parameter(
            "latitude",
            format!("{} is outside [-90, 90]", latitude),
        ));
    }
    if !longitude.is_finite() {
        return Err(OceanError::invalid_parameter(
            "longitude",
            format!("{} is not a finite number", longitude),
        ));
    }
    Ok(())
}

fn validate_radius(radius: f64) -> OceanResult<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(OceanError::invalid_parameter(
            "radius",
            format!("{} must be a positive number of meters", radius),
        ));
    }
    Ok(())
}

/// An ordered collection of query points built from parallel arrays.
///
/// The position of each point is its identity: results are returned in the
/// same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPoints {
    points: Vec<QueryPoint>,
}

impl QueryPoints {
    /// Build query points from parallel latitude/longitude/time arrays.
    ///
    /// All three arrays must have the same length.
    pub fn from_arrays(
        latitudes: &[f64],
        longitudes: &[f64],
        times: &[DateTime<Utc>],
    ) -> OceanResult<Self> {
        check_len("longitudes", latitudes.len(), longitudes.len())?;
        check_len("times", latitudes.len(), times.len())?;

        let points = latitudes
            .iter()
            .zip(longitudes)
            .zip(times)
            .map(|((&lat, &lon), &t)| QueryPoint::new(lat, lon, t))
            .collect::<OceanResult<Vec<_>>>()?;

        Ok(Self { points })
    }

    pub fn from_points(points: Vec<QueryPoint>) -> Self {
        Self { points }
    }

    /// Use the same search radius for every point.
    pub fn with_radius(mut self, radius: f64) -> OceanResult<Self> {
        validate_radius(radius)?;
        for p in &mut self.points {
            p.radius = radius;
        }
        Ok(self)
    }

    /// Use one search radius per point.
    pub fn with_radii(mut self, radii: &[f64]) -> OceanResult<Self> {
        check_len("radii", self.points.len(), radii.len())?;
        for (p, &r) in self.points.iter_mut().zip(radii) {
            validate_radius(r)?;
            p.radius = r;
        }
        Ok(self)
    }

    /// Set the full width of every point's time window.
    pub fn with_time_window(mut self, width: Duration) -> OceanResult<Self> {
        for p in &mut self.points {
            p.window = TimeWindow::try_new(p.central_time, width)?;
        }
        Ok(self)
    }

    /// Restrict every point to the given missions.
    pub fn with_missions(mut self, missions: &[Mission]) -> OceanResult<Self> {
        if missions.is_empty() {
            return Err(OceanError::invalid_parameter(
                "missions",
                "at least one mission is required",
            ));
        }
        for p in &mut self.points {
            p.missions = missions.to_vec();
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[QueryPoint] {
        &self.points
    }

    pub fn latitudes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.latitude).collect()
    }

    pub fn longitudes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.longitude).collect()
    }
}

impl<'a> IntoIterator for &'a QueryPoints {
    type Item = &'a QueryPoint;
    type IntoIter = std::slice::Iter<'a, QueryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn check_len(field: &str, expected: usize, actual: usize) -> OceanResult<()> {
    if expected != actual {
        return Err(OceanError::LengthMismatch {
            field: field.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
