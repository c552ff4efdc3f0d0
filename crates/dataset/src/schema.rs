//! Schema definitions: how each logical field is stored and decoded.

use std::collections::HashSet;
use std::fmt;

use ocean_common::{OceanError, OceanResult};
use serde::{Deserialize, Serialize};

/// Declared target type of a decoded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Text,
    Timestamp,
    Bool,
}

impl FieldType {
    pub fn is_float(&self) -> bool {
        matches!(self, FieldType::F32 | FieldType::F64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldType::I8 | FieldType::I16 | FieldType::I32 | FieldType::I64
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::I8 => "i8",
            FieldType::I16 => "i16",
            FieldType::I32 => "i32",
            FieldType::I64 => "i64",
            FieldType::F32 => "f32",
            FieldType::F64 => "f64",
            FieldType::Text => "text",
            FieldType::Timestamp => "timestamp",
            FieldType::Bool => "bool",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a field's value comes from in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    /// A column identifier, selected as-is.
    Column(String),
    /// A verbatim SQL expression. May reference template parameters.
    Expression(String),
}

/// Descriptive attributes written alongside a variable on export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_name: Option<String>,
}

/// Storage metadata of one logical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub source: FieldSource,
    pub field_type: FieldType,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub attrs: FieldAttrs,
}

impl SchemaField {
    /// A field read from the column of the same name.
    pub fn column(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            source: FieldSource::Column(name.clone()),
            name,
            field_type,
            scale: None,
            offset: None,
            attrs: FieldAttrs::default(),
        }
    }

    /// A field computed by a SQL expression.
    pub fn expression(
        name: impl Into<String>,
        expression: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            source: FieldSource::Expression(expression.into()),
            field_type,
            scale: None,
            offset: None,
            attrs: FieldAttrs::default(),
        }
    }

    /// Read the field from a differently named column.
    pub fn from_column(mut self, column: impl Into<String>) -> Self {
        self.source = FieldSource::Column(column.into());
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.attrs.units = Some(units.into());
        self
    }

    pub fn long_name(mut self, long_name: impl Into<String>) -> Self {
        self.attrs.long_name = Some(long_name.into());
        self
    }

    pub fn standard_name(mut self, standard_name: impl Into<String>) -> Self {
        self.attrs.standard_name = Some(standard_name.into());
        self
    }

    /// `column AS name` or `(expression) AS name`.
    pub fn select_expr(&self) -> String {
        match &self.source {
            FieldSource::Column(column) if *column == self.name => column.clone(),
            FieldSource::Column(column) => format!("{} AS {}", column, self.name),
            FieldSource::Expression(expr) => format!("({}) AS {}", expr.trim(), self.name),
        }
    }

    fn validate(&self) -> OceanResult<()> {
        if self.name.is_empty() || !self.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(OceanError::InvalidSchema(format!(
                "field name '{}' must be a plain identifier",
                self.name
            )));
        }
        for (what, value) in [("scale", self.scale), ("offset", self.offset)] {
            let Some(value) = value else { continue };
            if !self.field_type.is_float() {
                return Err(OceanError::InvalidSchema(format!(
                    "field '{}' declares a {} but its type {} is not floating point",
                    self.name, what, self.field_type
                )));
            }
            if !value.is_finite() {
                return Err(OceanError::InvalidSchema(format!(
                    "field '{}' has a non-finite {}",
                    self.name, what
                )));
            }
        }
        Ok(())
    }
}

/// Ordered mapping from logical field name to [`SchemaField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    fields: Vec<SchemaField>,
}

impl Schema {
    /// Create a schema, validating every field.
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> OceanResult<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for field in &fields {
            field.validate()?;
            if !seen.insert(field.name.as_str()) {
                return Err(OceanError::InvalidSchema(format!(
                    "field '{}' is defined twice in schema '{}'",
                    field.name, name
                )));
            }
        }
        Ok(Self { name, fields })
    }

    /// Built-in schemas are static and covered by the registry tests.
    pub(crate) fn builtin(name: &str, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field, failing with [`OceanError::UnknownField`].
    pub fn field(&self, name: &str) -> OceanResult<&SchemaField> {
        self.get(name).ok_or_else(|| OceanError::UnknownField {
            schema: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Resolve requested names to their fields, in request order.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> OceanResult<Vec<&SchemaField>> {
        if requested.is_empty() {
            return Err(OceanError::invalid_parameter(
                "fields",
                "at least one field must be requested",
            ));
        }
        requested.iter().map(|f| self.field(f.as_ref())).collect()
    }

    /// Comma-separated select list for the requested fields.
    pub fn render<S: AsRef<str>>(&self, requested: &[S]) -> OceanResult<String> {
        let fields = self.resolve(requested)?;
        Ok(fields
            .iter()
            .map(|f| f.select_expr())
            .collect::<Vec<_>>()
            .join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(
            "test",
            vec![
                SchemaField::column("sla", FieldType::F64).scale(0.001),
                SchemaField::column("time", FieldType::Timestamp).from_column("date_time"),
                SchemaField::expression("delta_t", " EXTRACT(EPOCH FROM date_time) ", FieldType::F64),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_render() {
        let sql = schema().render(&["delta_t", "sla", "time"]).unwrap();
        assert_eq!(
            sql,
            "(EXTRACT(EPOCH FROM date_time)) AS delta_t, sla, date_time AS time"
        );
    }

    #[test]
    fn test_render_unknown_field() {
        let err = schema().render(&["sla", "salinity"]).unwrap_err();
        match err {
            OceanError::UnknownField { schema, field } => {
                assert_eq!(schema, "test");
                assert_eq!(field, "salinity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_requires_fields() {
        let none: [&str; 0] = [];
        assert!(schema().render(&none).is_err());
    }

    #[test]
    fn test_scale_on_integer_rejected() {
        let err = Schema::new("bad", vec![SchemaField::column("track", FieldType::I16).scale(2.0)])
            .unwrap_err();
        assert!(matches!(err, OceanError::InvalidSchema(_)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::new(
            "bad",
            vec![
                SchemaField::column("sla", FieldType::F64),
                SchemaField::column("sla", FieldType::F32),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, OceanError::InvalidSchema(_)));
    }

    #[test]
    fn test_field_order_preserved() {
        assert_eq!(schema().field_names(), vec!["sla", "time", "delta_t"]);
    }
}
