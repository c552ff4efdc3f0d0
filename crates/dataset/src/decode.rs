//! Decoding raw store rows into typed, scaled datasets.

use ocean_common::{OceanError, OceanResult};
use tracing::trace;

use crate::column::{Column, ColumnData};
use crate::dataset::Dataset;
use crate::schema::{Schema, SchemaField};
use crate::value::{RawRow, RawValue};

/// Decode `rows` into a dataset named after the schema.
///
/// Returns `Ok(None)` for an empty row set: "no match" is not an error.
/// Every requested field must exist in the schema and in the first row.
/// Values are converted to the field's declared type, then multiplied by
/// the field's scale and shifted by its offset when those are configured.
pub fn decode<S: AsRef<str>>(
    rows: &[RawRow],
    schema: &Schema,
    requested: &[S],
) -> OceanResult<Option<Dataset>> {
    let fields = schema.resolve(requested)?;

    let Some(first) = rows.first() else {
        return Ok(None);
    };
    if let Some(missing) = fields.iter().find(|f| !first.contains(&f.name)) {
        return Err(OceanError::MissingColumn(missing.name.clone()));
    }

    let columns = fields
        .iter()
        .map(|field| decode_column(rows, field))
        .collect::<OceanResult<Vec<_>>>()?;

    trace!(
        schema = schema.name(),
        rows = rows.len(),
        fields = fields.len(),
        "Decoded rows"
    );

    Dataset::new(schema.name(), columns).map(Some)
}

fn decode_column(rows: &[RawRow], field: &SchemaField) -> OceanResult<Column> {
    let mut data = ColumnData::with_capacity(field.field_type, rows.len());

    for (row_index, row) in rows.iter().enumerate() {
        let raw = row
            .get(&field.name)
            .ok_or_else(|| OceanError::MissingColumn(field.name.clone()))?;
        push_value(&mut data, raw, field, row_index)?;
    }

    Column::for_field(field, data)
}

fn push_value(
    data: &mut ColumnData,
    raw: &RawValue,
    field: &SchemaField,
    row: usize,
) -> OceanResult<()> {
    match data {
        ColumnData::I8(v) => v.push(to_int(raw, field, row)?),
        ColumnData::I16(v) => v.push(to_int(raw, field, row)?),
        ColumnData::I32(v) => v.push(to_int(raw, field, row)?),
        ColumnData::I64(v) => v.push(to_int(raw, field, row)?),
        ColumnData::F32(v) => v.push(to_float(raw, field, row)? as f32),
        ColumnData::F64(v) => v.push(to_float(raw, field, row)?),
        ColumnData::Text(v) => match raw {
            RawValue::Text(s) => v.push(s.clone()),
            other => return Err(mismatch(field, row, other)),
        },
        ColumnData::Timestamp(v) => match raw {
            RawValue::Timestamp(t) => v.push(*t),
            other => return Err(mismatch(field, row, other)),
        },
        ColumnData::Bool(v) => match raw {
            RawValue::Bool(b) => v.push(*b),
            other => return Err(mismatch(field, row, other)),
        },
    }
    Ok(())
}

fn to_int<T: TryFrom<i64>>(raw: &RawValue, field: &SchemaField, row: usize) -> OceanResult<T> {
    match raw {
        RawValue::Int(i) => T::try_from(*i).map_err(|_| {
            OceanError::decode(
                &field.name,
                row,
                format!("{} does not fit in {}", i, field.field_type),
            )
        }),
        other => Err(mismatch(field, row, other)),
    }
}

fn to_float(raw: &RawValue, field: &SchemaField, row: usize) -> OceanResult<f64> {
    let value = match raw {
        RawValue::Null => return Ok(f64::NAN),
        RawValue::Int(i) => *i as f64,
        RawValue::Float(f) => *f,
        other => return Err(mismatch(field, row, other)),
    };

    let scaled = match field.scale {
        Some(scale) => value * scale,
        None => value,
    };
    Ok(match field.offset {
        Some(offset) => scaled + offset,
        None => scaled,
    })
}

fn mismatch(field: &SchemaField, row: usize, raw: &RawValue) -> OceanError {
    let message = if raw.is_null() {
        format!("NULL is not allowed for {} fields", field.field_type)
    } else {
        format!(
            "cannot convert a {} value to {}",
            raw.kind(),
            field.field_type
        )
    };
    OceanError::decode(&field.name, row, message)
}
