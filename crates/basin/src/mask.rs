//! Global basin mask grid.
//!
//! The mask is a regular lat/lon grid covering the whole globe. Row `i`
//! spans latitudes `[-90 + i*dlat, -90 + (i+1)*dlat)` and column `j` spans
//! longitudes `[j*dlon, (j+1)*dlon)` in the 0..360 convention. Cell sizes are
//! derived from the grid dimensions.
//!
//! # File format
//!
//! ```text
//! magic    4 bytes  "OBMK"
//! version  u32 LE   1
//! rows     u32 LE
//! cols     u32 LE
//! cells    rows*cols bytes, row-major, one basin id per cell
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ocean_common::{OceanError, OceanResult};
use tracing::info;

use crate::{BasinId, LAND};

/// Magic bytes of a packed basin mask file.
pub const MASK_MAGIC: &[u8; 4] = b"OBMK";

/// Current packed mask format version.
pub const MASK_VERSION: u32 = 1;

/// Basin id per grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasinMask {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl BasinMask {
    /// Create a mask from row-major cells.
    pub fn new(rows: usize, cols: usize, cells: Vec<u8>) -> OceanResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(OceanError::BasinDataError(format!(
                "basin mask must have at least one row and column, got {}x{}",
                rows, cols
            )));
        }
        if cells.len() != rows * cols {
            return Err(OceanError::BasinDataError(format!(
                "basin mask has {} cells, expected {}x{} = {}",
                cells.len(),
                rows,
                cols,
                rows * cols
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build a mask by evaluating `f(lat, lon)` at every cell center.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> OceanResult<Self>
    where
        F: FnMut(f64, f64) -> u8,
    {
        let dlat = 180.0 / rows as f64;
        let dlon = 360.0 / cols as f64;
        let mut cells = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            let lat = -90.0 + (i as f64 + 0.5) * dlat;
            for j in 0..cols {
                let lon = (j as f64 + 0.5) * dlon;
                cells.push(f(lat, lon));
            }
        }
        Self::new(rows, cols, cells)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Latitude extent of one cell in degrees.
    pub fn lat_cell_size(&self) -> f64 {
        180.0 / self.rows as f64
    }

    /// Longitude extent of one cell in degrees.
    pub fn lon_cell_size(&self) -> f64 {
        360.0 / self.cols as f64
    }

    /// Grid cell `(row, col)` containing a point, or `None` when the point
    /// is not a valid position.
    pub fn cell_index(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }

        let i = ((lat + 90.0) / self.lat_cell_size()).floor() as usize;
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        let j = (lon.rem_euclid(360.0) / self.lon_cell_size()).floor() as usize;

        Some((i.min(self.rows - 1), j.min(self.cols - 1)))
    }

    /// Basin id at a point; [`LAND`] for invalid coordinates.
    pub fn basin_at(&self, lat: f64, lon: f64) -> BasinId {
        match self.cell_index(lat, lon) {
            Some((i, j)) => self.cells[i * self.cols + j] as BasinId,
            None => LAND,
        }
    }

    /// Raw cell value at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    /// Serialize to the packed mask format.
    pub fn save<W: Write>(&self, mut writer: W) -> OceanResult<()> {
        writer.write_all(MASK_MAGIC)?;
        writer.write_all(&MASK_VERSION.to_le_bytes())?;
        writer.write_all(&(self.rows as u32).to_le_bytes())?;
        writer.write_all(&(self.cols as u32).to_le_bytes())?;
        writer.write_all(&self.cells)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a mask in the packed format.
    pub fn load<R: Read>(mut reader: R) -> OceanResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MASK_MAGIC {
            return Err(OceanError::BasinDataError(
                "invalid basin mask magic bytes".to_string(),
            ));
        }

        let mut buf4 = [0u8; 4];
        reader.read_exact(&mut buf4)?;
        let version = u32::from_le_bytes(buf4);
        if version != MASK_VERSION {
            return Err(OceanError::BasinDataError(format!(
                "unsupported basin mask version: {}",
                version
            )));
        }

        reader.read_exact(&mut buf4)?;
        let rows = u32::from_le_bytes(buf4) as usize;
        reader.read_exact(&mut buf4)?;
        let cols = u32::from_le_bytes(buf4) as usize;

        let mut cells = vec![0u8; rows * cols];
        reader.read_exact(&mut cells).map_err(|e| {
            OceanError::BasinDataError(format!(
                "truncated basin mask: expected {} cells: {}",
                rows * cols,
                e
            ))
        })?;

        Self::new(rows, cols, cells)
    }

    /// Load a packed mask file.
    pub fn from_file(path: impl AsRef<Path>) -> OceanResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            OceanError::BasinDataError(format!(
                "failed to open basin mask {}: {}",
                path.display(),
                e
            ))
        })?;
        let mask = Self::load(BufReader::new(file))?;
        info!(
            path = %path.display(),
            rows = mask.rows,
            cols = mask.cols,
            "Loaded basin mask"
        );
        Ok(mask)
    }

    /// Write a packed mask file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> OceanResult<()> {
        let file = File::create(path.as_ref())?;
        self.save(BufWriter::new(file))
    }
}
