//! Common test fixtures and constants.
//!
//! The toy basin world is a coarse 5-degree global mask with a handful of
//! basins whose connectivity is known, so basin-aware queries can be tested
//! without the real mask files.

use std::path::PathBuf;

use basin::{BasinConnectivity, BasinId, BasinMask, BasinResolver, LAND};
use chrono::{DateTime, TimeZone, Utc};
use ocean_common::QueryPoint;
use tempfile::TempDir;

/// Basin ids of the toy world.
pub mod basins {
    use basin::BasinId;

    pub const ATLANTIC: BasinId = 1;
    pub const INDIAN: BasinId = 2;
    pub const PACIFIC: BasinId = 3;
    pub const SOUTHERN: BasinId = 4;
    pub const MEDITERRANEAN: BasinId = 5;
    /// Enclosed sea with no connections.
    pub const CASPIAN: BasinId = 6;
}

/// Named positions as `(latitude, longitude)`.
pub mod points {
    /// Southern Ocean south of Africa.
    pub const SOUTHERN_OCEAN: (f64, f64) = (-69.0, 28.1);
    pub const INDIAN_OCEAN: (f64, f64) = (-30.0, 70.0);
    /// Central Pacific, given in the signed longitude convention.
    pub const CENTRAL_PACIFIC: (f64, f64) = (0.0, -150.0);
    pub const NORTH_ATLANTIC: (f64, f64) = (30.0, -40.0);
    pub const MEDITERRANEAN: (f64, f64) = (38.0, 18.0);
    pub const CASPIAN: (f64, f64) = (42.0, 50.0);
    /// Inside the toy African continent.
    pub const AFRICA: (f64, f64) = (0.0, 25.0);
    /// Just east of the antimeridian.
    pub const DATELINE_EAST: (f64, f64) = (-10.0, -179.9);
    /// Just west of the antimeridian.
    pub const DATELINE_WEST: (f64, f64) = (-10.0, 179.9);
}

/// Common time values for testing.
pub mod time {
    /// Central time of the reference scenario.
    pub const REFERENCE_TIME: &str = "2013-03-14T23:00:00Z";

    /// Default half window used by along-track queries, in seconds.
    pub const DEFAULT_HALF_WINDOW_SECS: i64 = 856_710 / 2;
}

/// The reference scenario time as a UTC timestamp.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 3, 14, 23, 0, 0)
        .single()
        .expect("reference time is unambiguous")
}

/// A query point at a named position at the reference time.
pub fn query_point(position: (f64, f64)) -> QueryPoint {
    QueryPoint::new(position.0, position.1, reference_time())
        .unwrap_or_else(|e| panic!("fixture position {position:?} is invalid: {e}"))
}

/// Basin id of the toy world at a cell center.
fn toy_basin_at(lat: f64, lon: f64) -> u8 {
    let id: BasinId = if lat > 80.0 {
        LAND
    } else if (-35.0..30.0).contains(&lat) && (10.0..40.0).contains(&lon) {
        LAND
    } else if lat < -60.0 {
        basins::SOUTHERN
    } else if (37.0..47.0).contains(&lat) && (45.0..55.0).contains(&lon) {
        basins::CASPIAN
    } else if (30.0..45.0).contains(&lat) && (0.0..40.0).contains(&lon) {
        basins::MEDITERRANEAN
    } else if (20.0..120.0).contains(&lon) {
        basins::INDIAN
    } else if (120.0..290.0).contains(&lon) {
        basins::PACIFIC
    } else {
        basins::ATLANTIC
    };
    id as u8
}

/// The toy basin mask: 36 rows by 72 columns.
pub fn toy_basin_mask() -> BasinMask {
    BasinMask::from_fn(36, 72, toy_basin_at)
        .unwrap_or_else(|e| panic!("toy basin mask is invalid: {e}"))
}

/// Connectivity document of the toy world.
pub const TOY_BASIN_CONNECTIONS: &str = "\
basins:
  - id: 1
    name: Atlantic Ocean
    connected: [2, 3, 4, 5]
  - id: 2
    name: Indian Ocean
    connected: [1, 3, 4]
  - id: 3
    name: Pacific Ocean
    connected: [1, 2, 4]
  - id: 4
    name: Southern Ocean
    connected: [1, 2, 3]
  - id: 5
    name: Mediterranean Sea
    connected: [1]
  - id: 6
    name: Caspian Sea
";

pub fn toy_basin_connectivity() -> BasinConnectivity {
    BasinConnectivity::from_yaml_str(TOY_BASIN_CONNECTIONS)
        .unwrap_or_else(|e| panic!("toy basin connections are invalid: {e}"))
}

/// Resolver over the toy mask and connectivity.
pub fn toy_basin_world() -> BasinResolver {
    BasinResolver::new(toy_basin_mask(), toy_basin_connectivity())
}

/// Toy basin files written to a temporary directory.
///
/// The directory is removed when this value is dropped.
pub struct ToyBasinFiles {
    pub dir: TempDir,
    pub mask_path: PathBuf,
    pub connections_path: PathBuf,
}

/// Write the toy mask and connectivity files to a fresh temporary directory.
pub fn write_toy_basin_files() -> std::io::Result<ToyBasinFiles> {
    let dir = TempDir::new()?;
    let mask_path = dir.path().join("basin_mask.bin");
    let connections_path = dir.path().join("basin_connections.yaml");

    toy_basin_mask()
        .write_file(&mask_path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    std::fs::write(&connections_path, TOY_BASIN_CONNECTIONS)?;

    Ok(ToyBasinFiles {
        dir,
        mask_path,
        connections_path,
    })
}
