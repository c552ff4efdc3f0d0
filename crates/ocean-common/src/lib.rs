//! Common types and utilities shared across all OceanDB crates.

pub mod bbox;
pub mod error;
pub mod mission;
pub mod query_point;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{OceanError, OceanResult};
pub use mission::{Mission, ALL_MISSIONS};
pub use query_point::{QueryPoint, QueryPoints, DEFAULT_RADIUS_METERS};
pub use time::{TimeWindow, DEFAULT_TIME_WINDOW_SECS, MAX_TIME_WINDOW_DAYS};
