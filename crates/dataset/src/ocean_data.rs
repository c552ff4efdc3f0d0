//! Containers of uniquely named datasets.

use ocean_common::{OceanError, OceanResult};

use crate::dataset::Dataset;

/// One logical query result: datasets with distinct names, in insertion
/// order (e.g. an eddy track and the along-track points near it).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OceanData {
    datasets: Vec<Dataset>,
}

impl OceanData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset; its name must not already be present.
    pub fn add(&mut self, dataset: Dataset) -> OceanResult<()> {
        if self.get(dataset.name()).is_some() {
            return Err(OceanError::DuplicateDataset(dataset.name().to_string()));
        }
        self.datasets.push(dataset);
        Ok(())
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, dataset: Dataset) -> OceanResult<Self> {
        self.add(dataset)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.iter().map(Dataset::name).collect()
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dataset> {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl IntoIterator for OceanData {
    type Item = Dataset;
    type IntoIter = std::vec::IntoIter<Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.into_iter()
    }
}
