//! Basin masks stored as NetCDF.

use std::path::Path;

use basin::BasinMask;
use ocean_common::{OceanError, OceanResult};
use tracing::info;

/// Variable holding the basin id grid, `(lat, lon)` row-major.
pub const BASIN_MASK_VARIABLE: &str = "basinmask";

/// Read the `basinmask` variable of a NetCDF file.
///
/// The grid must be two-dimensional; its first dimension runs south to
/// north and its second east from longitude 0, like the packed mask file.
pub fn read_basin_mask(path: impl AsRef<Path>) -> OceanResult<BasinMask> {
    let path = path.as_ref();
    let file = netcdf::open(path).map_err(|e| {
        OceanError::NetCdfError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let var = file.variable(BASIN_MASK_VARIABLE).ok_or_else(|| {
        OceanError::BasinDataError(format!(
            "{} has no '{}' variable",
            path.display(),
            BASIN_MASK_VARIABLE
        ))
    })?;

    let dims = var.dimensions();
    if dims.len() != 2 {
        return Err(OceanError::BasinDataError(format!(
            "'{}' has {} dimensions, expected 2",
            BASIN_MASK_VARIABLE,
            dims.len()
        )));
    }
    let (rows, cols) = (dims[0].len(), dims[1].len());

    let cells: Vec<u8> = var.get_values(..).map_err(|e| {
        OceanError::NetCdfError(format!("Failed to read {}: {}", BASIN_MASK_VARIABLE, e))
    })?;

    let mask = BasinMask::new(rows, cols, cells)?;
    info!(path = %path.display(), rows, cols, "Loaded basin mask from NetCDF");
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_basin_mask() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basins.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("lat", 2).unwrap();
            file.add_dimension("lon", 4).unwrap();
            let mut var = file
                .add_variable::<u8>(BASIN_MASK_VARIABLE, &["lat", "lon"])
                .unwrap();
            var.put_values(&[0u8, 1, 1, 2, 3, 3, 0, 4], ..).unwrap();
        }

        let mask = read_basin_mask(&path).unwrap();
        assert_eq!((mask.rows(), mask.cols()), (2, 4));
        assert_eq!(mask.cell(0, 3), Some(2));
        assert_eq!(mask.cell(1, 3), Some(4));
    }

    #[test]
    fn test_missing_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.nc");
        netcdf::create(&path).unwrap();
        assert!(matches!(
            read_basin_mask(&path),
            Err(OceanError::BasinDataError(_))
        ));
    }
}
