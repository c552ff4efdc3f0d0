//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// `x` is longitude and `y` is latitude. Envelopes produced around a
/// projection center may extend past ±180° in longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box enclosing every `(lat, lon)` pair.
    ///
    /// NaN coordinates propagate into the result so that an invalid point
    /// yields an invalid envelope. Returns `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (lat, lon) = iter.next()?;
        let mut bbox = BoundingBox::new(lon, lat, lon, lat);
        for (lat, lon) in iter {
            bbox.expand_to_include(lat, lon);
        }
        Some(bbox)
    }

    /// Grow the box so that it contains `(lat, lon)`.
    pub fn expand_to_include(&mut self, lat: f64, lon: f64) {
        self.min_x = nan_min(self.min_x, lon);
        self.max_x = nan_max(self.max_x, lon);
        self.min_y = nan_min(self.min_y, lat);
        self.max_y = nan_max(self.max_y, lat);
    }

    /// Width of the bounding box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when all four edges are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite() && self.min_y.is_finite() && self.max_x.is_finite() && self.max_y.is_finite()
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        lon >= self.min_x && lon <= self.max_x && lat >= self.min_y && lat <= self.max_y
    }
}

// f64::min/max drop NaN; envelopes must keep it.
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}
