//! Query templates with `:name` parameters.
//!
//! A template is SQL text where `:name` marks a named parameter. Postgres
//! casts (`::type`), quoted literals, quoted identifiers and comments are
//! left untouched. The store backend decides how each parameter is
//! substituted; templates themselves never contain values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use ocean_common::{OceanError, OceanResult};
use serde_json::{Number, Value};

/// Type of a bound parameter, used to cast it store-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Float,
    Int,
    Text,
    Timestamp,
    Interval,
    IntArray,
    TextArray,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Float => "float",
            ParamType::Int => "int",
            ParamType::Text => "text",
            ParamType::Timestamp => "timestamp",
            ParamType::Interval => "interval",
            ParamType::IntArray => "int[]",
            ParamType::TextArray => "text[]",
        };
        f.write_str(name)
    }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
    Interval(Duration),
    IntArray(Vec<i64>),
    TextArray(Vec<String>),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Int(_) => ParamType::Int,
            ParamValue::Text(_) => ParamType::Text,
            ParamValue::Timestamp(_) => ParamType::Timestamp,
            ParamValue::Interval(_) => ParamType::Interval,
            ParamValue::IntArray(_) => ParamType::IntArray,
            ParamValue::TextArray(_) => ParamType::TextArray,
        }
    }

    /// JSON encoding used to ship the value to the store.
    ///
    /// Non-finite floats are sent as the strings Postgres accepts for them
    /// (`NaN`, `Infinity`, `-Infinity`).
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Float(f) => float_json(*f),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Text(s) => Value::from(s.as_str()),
            ParamValue::Timestamp(t) => Value::from(t.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            ParamValue::Interval(d) => {
                float_json(d.num_microseconds().map_or(d.num_seconds() as f64, |us| us as f64 / 1e6))
            }
            ParamValue::IntArray(v) => Value::from(v.clone()),
            ParamValue::TextArray(v) => Value::from(v.clone()),
        }
    }
}

fn float_json(f: f64) -> Value {
    match Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None if f.is_nan() => Value::from("NaN"),
        None if f > 0.0 => Value::from("Infinity"),
        None => Value::from("-Infinity"),
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(v: NaiveDateTime) -> Self {
        ParamValue::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(v: DateTime<Utc>) -> Self {
        ParamValue::Timestamp(v.naive_utc())
    }
}

impl From<Duration> for ParamValue {
    fn from(v: Duration) -> Self {
        ParamValue::Interval(v)
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(v: Vec<i64>) -> Self {
        ParamValue::IntArray(v)
    }
}

impl From<Vec<i32>> for ParamValue {
    fn from(v: Vec<i32>) -> Self {
        ParamValue::IntArray(v.into_iter().map(i64::from).collect())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::TextArray(v)
    }
}

/// Named parameter values for one evaluation of a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON object of every bound value.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Sql(String),
    Param(String),
}

/// A compiled query template.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTemplate {
    name: String,
    segments: Vec<Segment>,
    params: Vec<String>,
}

impl QueryTemplate {
    /// Parse `sql` into literal SQL and parameter segments.
    pub fn compile(name: impl Into<String>, sql: &str) -> OceanResult<Self> {
        let name = name.into();
        let sql = sql.trim().trim_end_matches(';').trim_end();
        if sql.is_empty() {
            return Err(OceanError::TemplateError(format!("template '{}' is empty", name)));
        }

        let chars: Vec<char> = sql.chars().collect();
        let mut segments = Vec::new();
        let mut params: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\'' | '"' => {
                    let end = find_closing_quote(&chars, i, c).ok_or_else(|| {
                        OceanError::TemplateError(format!(
                            "template '{}' has an unterminated {} quote",
                            name,
                            if c == '\'' { "single" } else { "double" }
                        ))
                    })?;
                    literal.extend(&chars[i..=end]);
                    i = end + 1;
                }
                '-' if chars.get(i + 1) == Some(&'-') => {
                    let end = chars[i..]
                        .iter()
                        .position(|&ch| ch == '\n')
                        .map_or(chars.len(), |p| i + p);
                    literal.extend(&chars[i..end]);
                    i = end;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    let end = chars[i + 2..]
                        .windows(2)
                        .position(|w| w == ['*', '/'])
                        .map(|p| i + 2 + p + 2)
                        .ok_or_else(|| {
                            OceanError::TemplateError(format!(
                                "template '{}' has an unterminated comment",
                                name
                            ))
                        })?;
                    literal.extend(&chars[i..end]);
                    i = end;
                }
                ':' if chars.get(i + 1) == Some(&':') => {
                    literal.push_str("::");
                    i += 2;
                }
                ':' if chars.get(i + 1).is_some_and(|ch| ch.is_ascii_alphabetic() || *ch == '_') => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                        end += 1;
                    }
                    let param: String = chars[start..end].iter().collect();
                    if !literal.is_empty() {
                        segments.push(Segment::Sql(std::mem::take(&mut literal)));
                    }
                    if !params.contains(&param) {
                        params.push(param.clone());
                    }
                    segments.push(Segment::Param(param));
                    i = end;
                }
                '$' if chars.get(i + 1).is_some_and(char::is_ascii_digit) => {
                    return Err(OceanError::TemplateError(format!(
                        "template '{}' uses positional parameters; use :name instead",
                        name
                    )));
                }
                ';' => {
                    return Err(OceanError::TemplateError(format!(
                        "template '{}' must be a single statement",
                        name
                    )));
                }
                _ => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Sql(literal));
        }

        Ok(Self {
            name,
            segments,
            params,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter names in order of first appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Reassemble the SQL, substituting each parameter with `param_sql`.
    pub fn render<F>(&self, mut param_sql: F) -> String
    where
        F: FnMut(&str) -> String,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Sql(sql) => out.push_str(sql),
                Segment::Param(name) => out.push_str(&param_sql(name)),
            }
        }
        out
    }

    /// Check that every parameter set binds every template parameter with a
    /// type consistent across the whole batch.
    pub fn bind<'a>(&'a self, sets: &'a [ParamSet]) -> OceanResult<Batch<'a>> {
        let mut types: Vec<(String, ParamType)> = Vec::with_capacity(self.params.len());

        for param in &self.params {
            let mut expected: Option<ParamType> = None;
            for (index, set) in sets.iter().enumerate() {
                let value = set.get(param).ok_or_else(|| {
                    OceanError::MissingParameter(format!(
                        "{} (parameter set {} of template '{}')",
                        param, index, self.name
                    ))
                })?;
                let actual = value.param_type();
                match expected {
                    None => expected = Some(actual),
                    Some(t) if t != actual => {
                        return Err(OceanError::invalid_parameter(
                            param.as_str(),
                            format!(
                                "parameter set {} binds {} but earlier sets bind {}",
                                index, actual, t
                            ),
                        ));
                    }
                    Some(_) => {}
                }
            }
            if let Some(t) = expected {
                types.push((param.clone(), t));
            }
        }

        Ok(Batch {
            template: self,
            sets,
            types,
        })
    }
}

fn find_closing_quote(chars: &[char], start: usize, quote: char) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            // A doubled quote is an escaped quote
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// A template together with validated parameter sets.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    template: &'a QueryTemplate,
    sets: &'a [ParamSet],
    types: Vec<(String, ParamType)>,
}

impl<'a> Batch<'a> {
    pub fn template(&self) -> &'a QueryTemplate {
        self.template
    }

    pub fn param_sets(&self) -> &'a [ParamSet] {
        self.sets
    }

    /// Type of a template parameter; `None` for an empty batch.
    pub fn param_type(&self, name: &str) -> Option<ParamType> {
        self.types.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// JSON array of all parameter sets, in batch order.
    pub fn params_json(&self) -> Value {
        Value::Array(self.sets.iter().map(ParamSet::to_json).collect())
    }
}
