//! Store access for OceanDB query services.
//!
//! Provides:
//! - Query templates with named parameters ([`QueryTemplate`], [`ParamSet`])
//! - Order-preserving batch execution ([`BatchExecutor`], [`QueryBackend`])
//! - The PostgreSQL/PostGIS backend ([`PgBackend`])
//! - Basin connectivity loading from the database

pub mod basin_table;
pub mod batch;
pub mod postgres;
pub mod template;

pub use basin_table::load_basin_connectivity;
pub use batch::{regroup, BatchExecutor, BatchResults, QueryBackend, TaggedRow};
pub use postgres::PgBackend;
pub use template::{Batch, ParamSet, ParamType, ParamValue, QueryTemplate};
