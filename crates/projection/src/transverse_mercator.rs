//! Spherical Transverse Mercator projection.
//!
//! Each query point gets its own projection centered on the point's meridian,
//! so a "box in meters" around the point can be expressed as a planar
//! rectangle and converted back to a geographic envelope for the store.
//!
//! The sphere approximates the WGS84 ellipsoid with the UTM scale factor
//! folded into the radius:
//!
//! ```text
//! R = 0.9996 * 6378137 m
//! x = R * atanh(sin(Δλ) cos(φ))
//! y = R * atan2(sin(φ), cos(φ) cos(Δλ))
//! ```

use std::f64::consts::PI;

use ocean_common::BoundingBox;

/// WGS84 semi-major axis (meters).
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// Central meridian scale factor used by UTM.
pub const UTM_SCALE_FACTOR: f64 = 0.9996;

/// Radius of the projection sphere (meters).
pub const EFFECTIVE_EARTH_RADIUS: f64 = UTM_SCALE_FACTOR * WGS84_SEMI_MAJOR_AXIS;

const TO_RAD: f64 = PI / 180.0;
const TO_DEG: f64 = 180.0 / PI;

/// Spherical Transverse Mercator projection centered on meridian `lon0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalTransverseMercator {
    /// Central meridian in degrees
    pub lon0: f64,
    /// Sphere radius in meters
    pub radius: f64,
}

/// Geographic envelope of a planar box, plus the projected box center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedEnvelope {
    /// Projected x of the box center (meters)
    pub center_x: f64,
    /// Projected y of the box center (meters)
    pub center_y: f64,
    /// Geographic envelope enclosing the box (degrees)
    pub bbox: BoundingBox,
}

impl ProjectedEnvelope {
    pub fn min_lat(&self) -> f64 {
        self.bbox.min_y
    }

    pub fn max_lat(&self) -> f64 {
        self.bbox.max_y
    }

    pub fn min_lon(&self) -> f64 {
        self.bbox.min_x
    }

    pub fn max_lon(&self) -> f64 {
        self.bbox.max_x
    }
}

impl SphericalTransverseMercator {
    /// Create a projection centered on `lon0` degrees.
    pub fn new(lon0: f64) -> Self {
        Self {
            lon0,
            radius: EFFECTIVE_EARTH_RADIUS,
        }
    }

    /// Convert geographic coordinates (degrees) to projected (x, y) meters.
    pub fn project(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let phi = lat_deg * TO_RAD;
        let dlambda = (lon_deg - self.lon0) * TO_RAD;

        let b = dlambda.sin() * phi.cos();
        let x = self.radius * b.atanh();
        let y = self.radius * phi.sin().atan2(phi.cos() * dlambda.cos());

        (x, y)
    }

    /// Convert projected (x, y) meters back to geographic (lat, lon) degrees.
    ///
    /// The returned longitude is `lon0 + Δλ` with Δλ in (-180, 180], so it is
    /// not normalized to any particular 360° range.
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let xr = x / self.radius;
        let yr = y / self.radius;

        let lat = (yr.sin() / xr.cosh()).asin();
        let dlambda = xr.sinh().atan2(yr.cos());

        (lat * TO_DEG, self.lon0 + dlambda * TO_DEG)
    }

    /// Planar offsets (dx, dy) in meters of `(lat, lon)` from `(lat0, lon0)`.
    pub fn offsets_from_center(&self, lat0: f64, lat: f64, lon: f64) -> (f64, f64) {
        let (x0, y0) = self.project(lat0, self.lon0);
        let (x, y) = self.project(lat, lon);
        (x - x0, y - y0)
    }

    /// Geographic envelope of a `width × height` meter box centered on
    /// `(lat0, lon0)`.
    ///
    /// A north-south oriented planar box does not map to an axis-aligned
    /// lat/lon box: the northern and southern edges bow poleward, so the
    /// midpoints of those edges are unprojected along with the four corners.
    pub fn bounding_box(&self, lat0: f64, width: f64, height: f64) -> ProjectedEnvelope {
        let (center_x, center_y) = self.project(lat0, self.lon0);
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        let corners = [
            (center_x + half_w, center_y + half_h),
            (center_x - half_w, center_y - half_h),
            (center_x - half_w, center_y + half_h),
            (center_x, center_y + half_h),
            (center_x, center_y - half_h),
            (center_x + half_w, center_y - half_h),
        ];

        let bbox = BoundingBox::enclosing(corners.iter().map(|&(x, y)| self.unproject(x, y)))
            .unwrap_or(BoundingBox::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN));

        ProjectedEnvelope {
            center_x,
            center_y,
            bbox,
        }
    }
}

/// Project `(lat, lon)` in a Transverse Mercator frame centered on `lon0`.
pub fn project(lat: f64, lon: f64, lon0: f64) -> (f64, f64) {
    SphericalTransverseMercator::new(lon0).project(lat, lon)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, lon0: f64) -> (f64, f64) {
    SphericalTransverseMercator::new(lon0).unproject(x, y)
}

/// Geographic envelope of a `width × height` meter box centered on the query
/// point, using a projection centered on the point's own meridian.
pub fn bounding_box_for(lat0: f64, lon0: f64, width: f64, height: f64) -> ProjectedEnvelope {
    SphericalTransverseMercator::new(lon0).bounding_box(lat0, width, height)
}
