//! Homogeneously typed column storage.

use chrono::NaiveDateTime;
use ocean_common::{OceanError, OceanResult};
use serde_json::Value;

use crate::schema::{FieldAttrs, FieldType, SchemaField};

/// The values of one column, one variant per declared [`FieldType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Text(Vec<String>),
    Timestamp(Vec<NaiveDateTime>),
    Bool(Vec<bool>),
}

macro_rules! for_each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::I8($v) => $body,
            ColumnData::I16($v) => $body,
            ColumnData::I32($v) => $body,
            ColumnData::I64($v) => $body,
            ColumnData::F32($v) => $body,
            ColumnData::F64($v) => $body,
            ColumnData::Text($v) => $body,
            ColumnData::Timestamp($v) => $body,
            ColumnData::Bool($v) => $body,
        }
    };
}

fn keep<T: Clone>(values: &[T], mask: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m)
        .map(|(v, _)| v.clone())
        .collect()
}

impl ColumnData {
    /// An empty column of the given type with room for `capacity` values.
    pub fn with_capacity(field_type: FieldType, capacity: usize) -> Self {
        match field_type {
            FieldType::I8 => ColumnData::I8(Vec::with_capacity(capacity)),
            FieldType::I16 => ColumnData::I16(Vec::with_capacity(capacity)),
            FieldType::I32 => ColumnData::I32(Vec::with_capacity(capacity)),
            FieldType::I64 => ColumnData::I64(Vec::with_capacity(capacity)),
            FieldType::F32 => ColumnData::F32(Vec::with_capacity(capacity)),
            FieldType::F64 => ColumnData::F64(Vec::with_capacity(capacity)),
            FieldType::Text => ColumnData::Text(Vec::with_capacity(capacity)),
            FieldType::Timestamp => ColumnData::Timestamp(Vec::with_capacity(capacity)),
            FieldType::Bool => ColumnData::Bool(Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        for_each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            ColumnData::I8(_) => FieldType::I8,
            ColumnData::I16(_) => FieldType::I16,
            ColumnData::I32(_) => FieldType::I32,
            ColumnData::I64(_) => FieldType::I64,
            ColumnData::F32(_) => FieldType::F32,
            ColumnData::F64(_) => FieldType::F64,
            ColumnData::Text(_) => FieldType::Text,
            ColumnData::Timestamp(_) => FieldType::Timestamp,
            ColumnData::Bool(_) => FieldType::Bool,
        }
    }

    /// Rows where `mask` is true, in order.
    pub fn filter(&self, mask: &[bool]) -> Self {
        match self {
            ColumnData::I8(v) => ColumnData::I8(keep(v, mask)),
            ColumnData::I16(v) => ColumnData::I16(keep(v, mask)),
            ColumnData::I32(v) => ColumnData::I32(keep(v, mask)),
            ColumnData::I64(v) => ColumnData::I64(keep(v, mask)),
            ColumnData::F32(v) => ColumnData::F32(keep(v, mask)),
            ColumnData::F64(v) => ColumnData::F64(keep(v, mask)),
            ColumnData::Text(v) => ColumnData::Text(keep(v, mask)),
            ColumnData::Timestamp(v) => ColumnData::Timestamp(keep(v, mask)),
            ColumnData::Bool(v) => ColumnData::Bool(keep(v, mask)),
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            ColumnData::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamps(&self) -> Option<&[NaiveDateTime]> {
        match self {
            ColumnData::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    /// Value at `index` as JSON. Non-finite floats become `null`.
    pub fn json_at(&self, index: usize) -> Value {
        let value = match self {
            ColumnData::I8(v) => v.get(index).map(|&x| Value::from(x)),
            ColumnData::I16(v) => v.get(index).map(|&x| Value::from(x)),
            ColumnData::I32(v) => v.get(index).map(|&x| Value::from(x)),
            ColumnData::I64(v) => v.get(index).map(|&x| Value::from(x)),
            ColumnData::F32(v) => v.get(index).map(|&x| Value::from(x as f64)),
            ColumnData::F64(v) => v.get(index).map(|&x| Value::from(x)),
            ColumnData::Text(v) => v.get(index).map(|x| Value::from(x.as_str())),
            ColumnData::Timestamp(v) => v
                .get(index)
                .map(|x| Value::from(x.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
            ColumnData::Bool(v) => v.get(index).map(|&x| Value::from(x)),
        };
        // serde_json maps NaN/inf to Null already
        value.unwrap_or(Value::Null)
    }
}

/// A named column with its export metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
    pub attrs: FieldAttrs,
    /// Scale applied at decode time, kept as provenance.
    pub scale: Option<f64>,
    /// Offset applied at decode time, kept as provenance.
    pub offset: Option<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
            attrs: FieldAttrs::default(),
            scale: None,
            offset: None,
        }
    }

    /// A column carrying the metadata of a schema field.
    pub fn for_field(field: &SchemaField, data: ColumnData) -> OceanResult<Self> {
        if data.field_type() != field.field_type {
            return Err(OceanError::InvalidSchema(format!(
                "column '{}' holds {} values but the field is declared {}",
                field.name,
                data.field_type(),
                field.field_type
            )));
        }
        Ok(Self {
            name: field.name.clone(),
            data,
            attrs: field.attrs.clone(),
            scale: field.scale,
            offset: field.offset,
        })
    }

    pub fn with_attrs(mut self, attrs: FieldAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
