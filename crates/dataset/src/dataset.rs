//! Column-oriented datasets.

use std::collections::HashSet;

use ocean_common::{OceanError, OceanResult};
use serde_json::{Map, Value};

use crate::column::{Column, ColumnData};

/// A named set of equal-length columns.
///
/// Datasets are immutable; [`Dataset::with_column`] and [`Dataset::filter`]
/// return new values.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<Column>,
    len: usize,
}

impl Dataset {
    /// Build a dataset, checking that all columns share one length and
    /// have distinct names.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> OceanResult<Self> {
        let name = name.into();
        let len = columns.first().map_or(0, Column::len);

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(OceanError::InvalidSchema(format!(
                    "dataset '{}' has two columns named '{}'",
                    name, column.name
                )));
            }
            if column.len() != len {
                return Err(OceanError::LengthMismatch {
                    field: column.name.clone(),
                    expected: len,
                    actual: column.len(),
                });
            }
        }

        Ok(Self { name, columns, len })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column data by name, failing with [`OceanError::MissingColumn`].
    pub fn get(&self, name: &str) -> OceanResult<&ColumnData> {
        self.column(name)
            .map(|c| &c.data)
            .ok_or_else(|| OceanError::MissingColumn(name.to_string()))
    }

    /// A floating-point column by name.
    pub fn f64_column(&self, name: &str) -> OceanResult<&[f64]> {
        let data = self.get(name)?;
        data.as_f64().ok_or_else(|| {
            OceanError::invalid_parameter(
                name,
                format!("column holds {} values, not f64", data.field_type()),
            )
        })
    }

    /// A new dataset with `column` appended.
    pub fn with_column(&self, column: Column) -> OceanResult<Self> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Self::new(self.name.clone(), columns)
    }

    /// A new dataset holding only the rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> OceanResult<Self> {
        if mask.len() != self.len {
            return Err(OceanError::LengthMismatch {
                field: "mask".to_string(),
                expected: self.len,
                actual: mask.len(),
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                data: c.data.filter(mask),
                ..c.clone()
            })
            .collect();
        Self::new(self.name.clone(), columns)
    }

    /// A new dataset holding only `fields`, in that order.
    pub fn select<S: AsRef<str>>(&self, fields: &[S]) -> OceanResult<Self> {
        let columns = fields
            .iter()
            .map(|f| {
                self.column(f.as_ref())
                    .cloned()
                    .ok_or_else(|| OceanError::MissingColumn(f.as_ref().to_string()))
            })
            .collect::<OceanResult<Vec<_>>>()?;
        Self::new(self.name.clone(), columns)
    }

    /// Row `index` as a JSON object keyed by field name.
    pub fn row_json(&self, index: usize) -> Value {
        let mut map = Map::new();
        for column in &self.columns {
            map.insert(column.name.clone(), column.data.json_at(index));
        }
        Value::Object(map)
    }
}
