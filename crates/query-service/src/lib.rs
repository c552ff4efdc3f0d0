//! Along-track and eddy query services.
//!
//! Each service takes query points, resolves their connected basins, builds
//! one parameter set per point and runs the service's template as a single
//! batch. Results come back as a [`QueryResults`] iterator with exactly one
//! item per query point, in input order.

pub mod along_track;
pub mod defaults;
pub mod eddy;
mod params;
pub mod results;
pub mod templates;

pub use along_track::AlongTrackService;
pub use defaults::{stored_fields, QueryDefaults, POINT_RELATIVE_FIELDS};
pub use eddy::EddyService;
pub use results::QueryResults;
