//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies.

pub mod transverse_mercator;

pub use transverse_mercator::{
    bounding_box_for, project, unproject, ProjectedEnvelope, SphericalTransverseMercator,
    EFFECTIVE_EARTH_RADIUS, UTM_SCALE_FACTOR, WGS84_SEMI_MAJOR_AXIS,
};
