//! JSON-lines output.
//!
//! Every query point produces one summary line. With `rows` enabled the
//! summary is followed by one line per matched observation, tagged with
//! the point's index.

use std::io::Write;

use anyhow::Result;
use dataset::{Dataset, OceanData};
use serde_json::{json, Map, Value};

#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    out: W,
    rows: bool,
    lines: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W, rows: bool) -> Self {
        Self {
            out,
            rows,
            lines: 0,
        }
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Summary (and rows) for the result of query point `index`.
    pub fn write_point(&mut self, index: usize, result: Option<&Dataset>) -> Result<()> {
        match result {
            Some(dataset) => {
                self.write_line(&json!({
                    "query_index": index,
                    "dataset": dataset.name(),
                    "rows": dataset.len(),
                    "fields": dataset.field_names(),
                }))?;
                if self.rows {
                    self.write_rows(dataset, |row| {
                        row.insert("query_index".to_string(), json!(index));
                    })?;
                }
            }
            None => self.write_line(&json!({ "query_index": index, "rows": 0 }))?,
        }
        Ok(())
    }

    /// Summary (and rows) for every dataset of a multi-dataset result.
    pub fn write_ocean_data(&mut self, label: &str, data: &OceanData) -> Result<()> {
        for dataset in data.iter() {
            self.write_line(&json!({
                "result": label,
                "dataset": dataset.name(),
                "rows": dataset.len(),
                "fields": dataset.field_names(),
            }))?;
            if self.rows {
                let name = dataset.name().to_string();
                self.write_rows(dataset, |row| {
                    row.insert("dataset".to_string(), json!(name));
                })?;
            }
        }
        Ok(())
    }

    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.write_line(value)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn write_rows<F>(&mut self, dataset: &Dataset, tag: F) -> Result<()>
    where
        F: Fn(&mut Map<String, Value>),
    {
        for i in 0..dataset.len() {
            let mut row = match dataset.row_json(i) {
                Value::Object(map) => map,
                other => {
                    let mut map = Map::new();
                    map.insert("value".to_string(), other);
                    map
                }
            };
            tag(&mut row);
            self.write_line(&Value::Object(row))?;
        }
        Ok(())
    }

    fn write_line(&mut self, value: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}
