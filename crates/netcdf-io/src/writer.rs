//! NetCDF-4 writer.

use std::path::Path;

use dataset::OceanData;
use netcdf::{AttributeValue, GroupMut, VariableMut};
use ocean_common::{OceanError, OceanResult};
use tracing::{debug, info};

use crate::layout::{plan, AttrValue, GroupLayout, VariableLayout, VariableValues, OBS_DIMENSION};

fn nc_error(context: &str, e: netcdf::Error) -> OceanError {
    OceanError::NetCdfError(format!("{}: {}", context, e))
}

fn attr_value(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::Text(s) => AttributeValue::from(s.as_str()),
        AttrValue::Double(v) => AttributeValue::from(*v),
    }
}

/// Write `data` to a new NetCDF-4 file at `path`, replacing any file
/// already there.
pub fn write_ocean_data(data: &OceanData, path: impl AsRef<Path>) -> OceanResult<()> {
    let path = path.as_ref();
    let layout = plan(data)?;

    let mut file = netcdf::create(path)
        .map_err(|e| nc_error(&format!("Failed to create {}", path.display()), e))?;

    for (name, value) in &layout.attrs {
        file.add_attribute(name, attr_value(value))
            .map_err(|e| nc_error(&format!("Failed to write attribute {}", name), e))?;
    }

    for group in &layout.groups {
        let mut nc_group = file
            .add_group(&group.name)
            .map_err(|e| nc_error(&format!("Failed to create group {}", group.name), e))?;
        write_group(&mut nc_group, group)?;
        debug!(group = %group.name, obs = group.obs, "Wrote group");
    }

    info!(
        path = %path.display(),
        groups = layout.groups.len(),
        "Wrote NetCDF file"
    );
    Ok(())
}

fn write_group(nc_group: &mut GroupMut<'_>, group: &GroupLayout) -> OceanResult<()> {
    nc_group
        .add_dimension(OBS_DIMENSION, group.obs)
        .map_err(|e| nc_error("Failed to add obs dimension", e))?;

    for variable in &group.variables {
        let mut nc_var = match &variable.values {
            VariableValues::I8(_) => nc_group.add_variable::<i8>(&variable.name, &[OBS_DIMENSION]),
            VariableValues::I16(_) => nc_group.add_variable::<i16>(&variable.name, &[OBS_DIMENSION]),
            VariableValues::I32(_) => nc_group.add_variable::<i32>(&variable.name, &[OBS_DIMENSION]),
            VariableValues::I64(_) => nc_group.add_variable::<i64>(&variable.name, &[OBS_DIMENSION]),
            VariableValues::F32(_) => nc_group.add_variable::<f32>(&variable.name, &[OBS_DIMENSION]),
            VariableValues::F64(_) => nc_group.add_variable::<f64>(&variable.name, &[OBS_DIMENSION]),
            VariableValues::Text(_) => nc_group.add_string_variable(&variable.name, &[OBS_DIMENSION]),
        }
        .map_err(|e| nc_error(&format!("Failed to add variable {}", variable.name), e))?;

        write_variable(&mut nc_var, variable)?;
    }
    Ok(())
}

fn write_variable(nc_var: &mut VariableMut<'_>, variable: &VariableLayout) -> OceanResult<()> {
    for (name, value) in &variable.attrs {
        nc_var
            .put_attribute(name, attr_value(value))
            .map_err(|e| nc_error(&format!("Failed to write {}:{}", variable.name, name), e))?;
    }

    if variable.values.is_empty() {
        return Ok(());
    }

    let result = match &variable.values {
        VariableValues::I8(v) => nc_var.put_values(v.as_slice(), ..),
        VariableValues::I16(v) => nc_var.put_values(v.as_slice(), ..),
        VariableValues::I32(v) => nc_var.put_values(v.as_slice(), ..),
        VariableValues::I64(v) => nc_var.put_values(v.as_slice(), ..),
        VariableValues::F32(v) => nc_var.put_values(v.as_slice(), ..),
        VariableValues::F64(v) => nc_var.put_values(v.as_slice(), ..),
        VariableValues::Text(v) => v
            .iter()
            .enumerate()
            .try_for_each(|(i, s)| nc_var.put_string(s, [i])),
    };
    result.map_err(|e| nc_error(&format!("Failed to write {}", variable.name), e))
}
