//! Basin-aware spatial filtering.
//!
//! A [`BasinMask`] assigns every point on the globe to an ocean basin by
//! grid lookup; [`BasinConnectivity`] lists which basins can be reached from
//! each other without crossing land. Together they let a query around a
//! point exclude observations on the far side of a landmass.
//!
//! Both tables are built once and are read-only afterwards; share a
//! [`BasinResolver`] between services with `Arc`.

pub mod connectivity;
pub mod mask;
pub mod resolver;

pub use connectivity::{BasinConnectivity, BasinEntry};
pub use mask::{BasinMask, MASK_MAGIC, MASK_VERSION};
pub use resolver::BasinResolver;

/// Identifier of an ocean basin.
pub type BasinId = i32;

/// Basin id used for land and for points that cannot be resolved.
pub const LAND: BasinId = 0;
