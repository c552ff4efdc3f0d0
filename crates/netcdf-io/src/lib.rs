//! NetCDF-4 export of query results and basin mask import.
//!
//! [`layout`] turns an [`OceanData`](dataset::OceanData) into a plain
//! description of the file to write: one group per dataset, one `obs`
//! dimension, one variable per field with its CF attributes. It needs no
//! native libraries and is always available.
//!
//! Writing the file and reading a `basinmask` variable need libnetcdf and
//! are behind the `netcdf` feature.

pub mod layout;

#[cfg(feature = "netcdf")]
pub mod mask;
#[cfg(feature = "netcdf")]
pub mod writer;

pub use layout::{
    plan, AttrValue, FileLayout, GroupLayout, VariableLayout, VariableValues, CONVENTIONS,
    OBS_DIMENSION, SOURCE, TIME_UNITS,
};

#[cfg(feature = "netcdf")]
pub use mask::{read_basin_mask, BASIN_MASK_VARIABLE};
#[cfg(feature = "netcdf")]
pub use writer::write_ocean_data;
