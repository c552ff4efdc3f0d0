//! Raw values as returned by the backing store.

use chrono::NaiveDateTime;

/// One raw value from a result row, tagged with its store-side kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl RawValue {
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::Text(_) => "text",
            RawValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i16> for RawValue {
    fn from(v: i16) -> Self {
        RawValue::Int(v as i64)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(v as i64)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        RawValue::Float(v as f64)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(v: NaiveDateTime) -> Self {
        RawValue::Timestamp(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Null, Into::into)
    }
}

/// One result row: store field names to raw values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<S: Into<String>, V: Into<RawValue>> FromIterator<(S, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_builder() {
        let row = RawRow::new()
            .with("sla_filtered", 120i16)
            .with("mission", "j3")
            .with("mdt", None::<i16>);
        assert_eq!(row.len(), 3);
        assert_eq!(row.get("sla_filtered"), Some(&RawValue::Int(120)));
        assert_eq!(row.get("mdt"), Some(&RawValue::Null));
        assert!(row.get("dac").is_none());
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["sla_filtered", "mission", "mdt"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut row = RawRow::new().with("track", 1);
        row.insert("track", 2);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("track"), Some(&RawValue::Int(2)));
    }
}
