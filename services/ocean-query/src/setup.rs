//! Wiring between configuration and services.

use std::path::Path;

use anyhow::{Context, Result};
use basin::{BasinConnectivity, BasinMask, BasinResolver};
use dataset::OceanData;
use storage::{load_basin_connectivity, PgBackend};
use tracing::info;

use crate::config::OceanDbConfig;

/// Open the configured database.
pub async fn connect(config: &OceanDbConfig) -> Result<PgBackend> {
    PgBackend::connect(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to OceanDB")
}

/// Load a basin mask, from NetCDF when the file ends in `.nc`.
pub fn load_mask(path: &Path) -> Result<BasinMask> {
    if path.extension().is_some_and(|ext| ext == "nc") {
        #[cfg(feature = "netcdf")]
        return netcdf_io::read_basin_mask(path)
            .with_context(|| format!("Failed to read basin mask {}", path.display()));

        #[cfg(not(feature = "netcdf"))]
        anyhow::bail!(
            "{} is a NetCDF basin mask; rebuild with --features netcdf",
            path.display()
        );
    }
    BasinMask::from_file(path)
        .with_context(|| format!("Failed to read basin mask {}", path.display()))
}

/// Basin mask plus connectivity, from the adjacency file when configured
/// and from the `basin_connections` table otherwise.
pub async fn load_resolver(config: &OceanDbConfig, backend: &PgBackend) -> Result<BasinResolver> {
    let mask = load_mask(&config.basin_mask)?;
    let connectivity = match &config.basin_connections {
        Some(path) => BasinConnectivity::from_file(path)
            .with_context(|| format!("Failed to read basin connections {}", path.display()))?,
        None => load_basin_connectivity(backend.pool())
            .await
            .context("Failed to load basin connections from database")?,
    };
    info!(
        rows = mask.rows(),
        cols = mask.cols(),
        basins = connectivity.len(),
        "Basin resolver ready"
    );
    Ok(BasinResolver::new(mask, connectivity))
}

/// Write `data` as NetCDF-4.
pub fn write_netcdf(data: &OceanData, path: &Path) -> Result<()> {
    #[cfg(feature = "netcdf")]
    {
        netcdf_io::write_ocean_data(data, path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    #[cfg(not(feature = "netcdf"))]
    {
        netcdf_io::plan(data)?;
        anyhow::bail!(
            "cannot write {}: rebuild with --features netcdf",
            path.display()
        )
    }
}
