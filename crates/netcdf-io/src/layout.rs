//! File layout for exported results.

use dataset::{Column, ColumnData, Dataset, OceanData};
use ocean_common::time::days_since_1950;
use ocean_common::{OceanError, OceanResult};

/// Name of the single dimension of every group.
pub const OBS_DIMENSION: &str = "obs";

/// Global `Conventions` attribute.
pub const CONVENTIONS: &str = "CF-1.9";

/// Global `source` attribute.
pub const SOURCE: &str = "OceanDB";

/// Units of exported timestamp variables.
pub const TIME_UNITS: &str = "days since 1950-01-01 00:00:00";

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Double(f64),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Double(v)
    }
}

/// Values of one variable in their on-disk type.
///
/// Timestamps are already converted to days since 1950 and booleans to
/// `0`/`1` bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValues {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Text(Vec<String>),
}

impl VariableValues {
    pub fn len(&self) -> usize {
        match self {
            VariableValues::I8(v) => v.len(),
            VariableValues::I16(v) => v.len(),
            VariableValues::I32(v) => v.len(),
            VariableValues::I64(v) => v.len(),
            VariableValues::F32(v) => v.len(),
            VariableValues::F64(v) => v.len(),
            VariableValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableLayout {
    pub name: String,
    pub attrs: Vec<(String, AttrValue)>,
    pub values: VariableValues,
}

impl VariableLayout {
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    pub name: String,
    /// Length of the `obs` dimension.
    pub obs: usize,
    pub variables: Vec<VariableLayout>,
}

impl GroupLayout {
    pub fn variable(&self, name: &str) -> Option<&VariableLayout> {
        self.variables.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileLayout {
    pub attrs: Vec<(String, AttrValue)>,
    pub groups: Vec<GroupLayout>,
}

impl FileLayout {
    pub fn group(&self, name: &str) -> Option<&GroupLayout> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Lay out `data` as a NetCDF-4 file.
///
/// Decoded values are written as-is. The scale and offset applied while
/// decoding are kept as `decode_scale_factor` / `decode_add_offset` so CF
/// readers do not apply them a second time.
pub fn plan(data: &OceanData) -> OceanResult<FileLayout> {
    if data.is_empty() {
        return Err(OceanError::NetCdfError("nothing to write".to_string()));
    }

    let groups = data.iter().map(group_layout).collect();
    Ok(FileLayout {
        attrs: vec![
            ("Conventions".to_string(), CONVENTIONS.into()),
            ("source".to_string(), SOURCE.into()),
        ],
        groups,
    })
}

fn group_layout(dataset: &Dataset) -> GroupLayout {
    GroupLayout {
        name: dataset.name().to_string(),
        obs: dataset.len(),
        variables: dataset.columns().iter().map(variable_layout).collect(),
    }
}

fn variable_layout(column: &Column) -> VariableLayout {
    let mut attrs = Vec::new();
    let mut push = |name: &str, value: AttrValue| attrs.push((name.to_string(), value));

    if let ColumnData::Timestamp(_) = column.data {
        push("units", TIME_UNITS.into());
        push("calendar", "standard".into());
    } else if let Some(units) = &column.attrs.units {
        push("units", units.as_str().into());
    }
    if let Some(long_name) = &column.attrs.long_name {
        push("long_name", long_name.as_str().into());
    }
    if let Some(standard_name) = &column.attrs.standard_name {
        push("standard_name", standard_name.as_str().into());
    }
    if let Some(scale) = column.scale {
        push("decode_scale_factor", scale.into());
    }
    if let Some(offset) = column.offset {
        push("decode_add_offset", offset.into());
    }

    VariableLayout {
        name: column.name.clone(),
        attrs,
        values: values(&column.data),
    }
}

fn values(data: &ColumnData) -> VariableValues {
    match data {
        ColumnData::I8(v) => VariableValues::I8(v.clone()),
        ColumnData::I16(v) => VariableValues::I16(v.clone()),
        ColumnData::I32(v) => VariableValues::I32(v.clone()),
        ColumnData::I64(v) => VariableValues::I64(v.clone()),
        ColumnData::F32(v) => VariableValues::F32(v.clone()),
        ColumnData::F64(v) => VariableValues::F64(v.clone()),
        ColumnData::Text(v) => VariableValues::Text(v.clone()),
        ColumnData::Timestamp(v) => VariableValues::F64(v.iter().map(days_since_1950).collect()),
        ColumnData::Bool(v) => VariableValues::I8(v.iter().map(|&b| b as i8).collect()),
    }
}
