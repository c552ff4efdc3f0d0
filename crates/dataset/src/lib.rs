//! Schema-driven decoding of raw store rows into columnar datasets.
//!
//! - [`Schema`] / [`SchemaField`]: logical field name to storage metadata
//! - [`registry`]: the built-in along-track and eddy schemas
//! - [`decode`](decode::decode): raw rows to a typed, scaled [`Dataset`]
//! - [`OceanData`]: a named collection of datasets forming one result

pub mod column;
pub mod dataset;
pub mod decode;
pub mod ocean_data;
pub mod registry;
pub mod schema;
pub mod value;

pub use column::{Column, ColumnData};
pub use dataset::Dataset;
pub use decode::decode;
pub use ocean_data::OceanData;
pub use registry::{along_track_schema, eddy_schema, SchemaRegistry, ALONG_TRACK, EDDY};
pub use schema::{FieldAttrs, FieldSource, FieldType, Schema, SchemaField};
pub use value::{RawRow, RawValue};
