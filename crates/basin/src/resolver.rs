//! Basin lookup for batches of query points.

use std::path::Path;

use ocean_common::{OceanError, OceanResult};
use tracing::debug;

use crate::{BasinConnectivity, BasinId, BasinMask};

/// Resolves query positions to basins and their connected-basin sets.
#[derive(Debug, Clone)]
pub struct BasinResolver {
    mask: BasinMask,
    connectivity: BasinConnectivity,
}

impl BasinResolver {
    pub fn new(mask: BasinMask, connectivity: BasinConnectivity) -> Self {
        Self { mask, connectivity }
    }

    /// Load a packed mask file and a YAML connectivity file.
    pub fn from_files(
        mask_path: impl AsRef<Path>,
        connections_path: impl AsRef<Path>,
    ) -> OceanResult<Self> {
        let mask = BasinMask::from_file(mask_path)?;
        let connectivity = BasinConnectivity::from_file(connections_path)?;
        Ok(Self::new(mask, connectivity))
    }

    pub fn mask(&self) -> &BasinMask {
        &self.mask
    }

    pub fn connectivity(&self) -> &BasinConnectivity {
        &self.connectivity
    }

    pub fn basin_id(&self, lat: f64, lon: f64) -> BasinId {
        self.mask.basin_at(lat, lon)
    }

    /// Basin id of every `(latitudes[k], longitudes[k])`.
    pub fn basin_ids_for(&self, latitudes: &[f64], longitudes: &[f64]) -> OceanResult<Vec<BasinId>> {
        if latitudes.len() != longitudes.len() {
            return Err(OceanError::LengthMismatch {
                field: "longitudes".to_string(),
                expected: latitudes.len(),
                actual: longitudes.len(),
            });
        }

        let ids: Vec<BasinId> = latitudes
            .iter()
            .zip(longitudes)
            .map(|(&lat, &lon)| self.mask.basin_at(lat, lon))
            .collect();

        debug!(points = ids.len(), "Resolved basin ids");
        Ok(ids)
    }

    /// Basins reachable from `basin`, itself included. Empty for land.
    pub fn connected_basins(&self, basin: BasinId) -> Vec<BasinId> {
        self.connectivity.connected(basin)
    }

    /// Connected-basin set of every query position.
    pub fn connected_basins_for(
        &self,
        latitudes: &[f64],
        longitudes: &[f64],
    ) -> OceanResult<Vec<Vec<BasinId>>> {
        Ok(self
            .basin_ids_for(latitudes, longitudes)?
            .into_iter()
            .map(|id| self.connected_basins(id))
            .collect())
    }

    /// Union of the connected sets of several basins, sorted and deduplicated.
    pub fn connected_union<I>(&self, basins: I) -> Vec<BasinId>
    where
        I: IntoIterator<Item = BasinId>,
    {
        let mut all: Vec<BasinId> = basins
            .into_iter()
            .flat_map(|b| self.connected_basins(b))
            .collect();
        all.sort_unstable();
        all.dedup();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LAND;

    fn resolver() -> BasinResolver {
        let mask = BasinMask::from_fn(18, 36, |lat, lon| {
            if lat.abs() > 80.0 {
                0
            } else if lon < 180.0 {
                1
            } else {
                2
            }
        })
        .unwrap();
        BasinResolver::new(mask, BasinConnectivity::from_pairs([(1, 2)]))
    }

    #[test]
    fn test_basin_ids_for() {
        let r = resolver();
        let ids = r.basin_ids_for(&[0.0, 0.0, 85.0], &[10.0, -10.0, 10.0]).unwrap();
        assert_eq!(ids, vec![1, 2, LAND]);
    }

    #[test]
    fn test_length_mismatch() {
        let r = resolver();
        assert!(matches!(
            r.basin_ids_for(&[0.0, 1.0], &[0.0]),
            Err(OceanError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_connected_for_points() {
        let r = resolver();
        let sets = r.connected_basins_for(&[0.0, 0.0, 85.0], &[10.0, 190.0, 0.0]).unwrap();
        assert_eq!(sets, vec![vec![1, 2], vec![2], vec![]]);
    }

    #[test]
    fn test_connected_union() {
        let r = resolver();
        assert_eq!(r.connected_union([2, 1, LAND]), vec![1, 2]);
    }
}
