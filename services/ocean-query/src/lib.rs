//! OceanDB command-line queries.
//!
//! - [`config`]: connection and basin file settings
//! - [`points`]: query points from flags or CSV
//! - [`output`]: JSON-lines results
//! - [`setup`]: database, basin resolver and NetCDF export wiring

pub mod config;
pub mod output;
pub mod points;
pub mod setup;

pub use config::OceanDbConfig;
pub use output::JsonLinesWriter;
pub use points::{parse_points_csv, read_points_csv, window_from_days, PointColumns};
