//! Basin adjacency: which basins can be reached from each other by water.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use ocean_common::{OceanError, OceanResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{BasinId, LAND};

/// One basin in a connectivity file.
///
/// ```yaml
/// basins:
///   - id: 1
///     name: Atlantic Ocean
///     connected: [2, 3]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasinEntry {
    pub id: BasinId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connected: Vec<BasinId>,
}

#[derive(Debug, Deserialize)]
struct BasinFile {
    basins: Vec<BasinEntry>,
}

/// Static connected-basin relation.
///
/// Every non-land basin is connected to itself even when the relation does
/// not list it. [`LAND`] is connected to nothing.
#[derive(Debug, Clone, Default)]
pub struct BasinConnectivity {
    connected: HashMap<BasinId, BTreeSet<BasinId>>,
    names: HashMap<BasinId, String>,
}

impl BasinConnectivity {
    /// Build the relation from `(basin_id, connected_id)` pairs, the shape
    /// of the `basin_connections` table.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (BasinId, BasinId)>,
    {
        let mut this = Self::default();
        for (basin, other) in pairs {
            if basin == LAND || other == LAND {
                warn!(basin, other, "Ignoring basin connection involving land");
                continue;
            }
            this.insert(basin, other);
        }
        this
    }

    /// Build the relation from parsed basin entries.
    pub fn from_entries(entries: Vec<BasinEntry>) -> OceanResult<Self> {
        let mut this = Self::default();
        for entry in entries {
            if entry.id == LAND || entry.connected.contains(&LAND) {
                return Err(OceanError::BasinDataError(format!(
                    "basin {} lists land (id {}) as a basin",
                    entry.id, LAND
                )));
            }
            if let Some(name) = entry.name {
                this.names.insert(entry.id, name);
            }
            this.connected.entry(entry.id).or_default().insert(entry.id);
            for other in entry.connected {
                this.insert(entry.id, other);
            }
        }
        Ok(this)
    }

    /// Parse a YAML connectivity document.
    pub fn from_yaml_str(yaml: &str) -> OceanResult<Self> {
        let file: BasinFile = serde_yaml::from_str(yaml).map_err(|e| {
            OceanError::BasinDataError(format!("failed to parse basin connections: {}", e))
        })?;
        Self::from_entries(file.basins)
    }

    /// Load a YAML connectivity file.
    pub fn from_file(path: impl AsRef<Path>) -> OceanResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OceanError::BasinDataError(format!(
                "failed to read basin connections {}: {}",
                path.display(),
                e
            ))
        })?;
        let this = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            basins = this.connected.len(),
            "Loaded basin connections"
        );
        Ok(this)
    }

    /// Attach display names to basins.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (BasinId, S)>,
        S: Into<String>,
    {
        for (id, name) in names {
            self.names.insert(id, name.into());
        }
        self
    }

    fn insert(&mut self, basin: BasinId, other: BasinId) {
        let set = self.connected.entry(basin).or_default();
        set.insert(basin);
        set.insert(other);
    }

    /// Basins reachable from `basin`, sorted ascending.
    pub fn connected(&self, basin: BasinId) -> Vec<BasinId> {
        if basin == LAND {
            return Vec::new();
        }
        match self.connected.get(&basin) {
            Some(set) => set.iter().copied().collect(),
            None => vec![basin],
        }
    }

    pub fn name(&self, basin: BasinId) -> Option<&str> {
        self.names.get(&basin).map(String::as_str)
    }

    /// Basins that appear in the relation, sorted ascending.
    pub fn basin_ids(&self) -> Vec<BasinId> {
        let mut ids: Vec<BasinId> = self.connected.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.connected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connected.is_empty()
    }
}
