//! Query points from command-line flags or CSV files.
//!
//! CSV rows are `latitude,longitude,time`; a first line that does not
//! start with a number is treated as a header. Blank lines and lines
//! starting with `#` are skipped.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use ocean_common::time::parse_iso8601;
use ocean_common::{QueryPoints, MAX_TIME_WINDOW_DAYS};
use query_service::QueryDefaults;

/// Time window width from a `--window-days` value.
pub fn window_from_days(days: f64) -> Result<Duration> {
    if !days.is_finite() || days < 0.0 || days > MAX_TIME_WINDOW_DAYS as f64 {
        bail!(
            "window must be between 0 and {} days, got {}",
            MAX_TIME_WINDOW_DAYS,
            days
        );
    }
    Ok(Duration::milliseconds((days * 86_400_000.0).round() as i64))
}

/// Parallel coordinate arrays read from CSV.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointColumns {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub times: Vec<DateTime<Utc>>,
}

impl PointColumns {
    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }

    /// Query points with the service defaults applied.
    pub fn to_query_points(&self, defaults: &QueryDefaults) -> Result<QueryPoints> {
        Ok(defaults.points(&self.latitudes, &self.longitudes, &self.times)?)
    }
}

pub fn parse_points_csv(text: &str) -> Result<PointColumns> {
    let mut columns = PointColumns::default();
    let mut first = true;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let is_header = first
            && !line.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.');
        first = false;
        if is_header {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let &[lat, lon, time] = &fields[..] else {
            bail!(
                "line {}: expected latitude,longitude,time but found {} fields",
                line_no + 1,
                fields.len()
            );
        };
        let context = || format!("line {}", line_no + 1);
        let latitude = lat
            .parse::<f64>()
            .map_err(|e| anyhow!("bad latitude '{}': {}", lat, e))
            .with_context(context)?;
        let longitude = lon
            .parse::<f64>()
            .map_err(|e| anyhow!("bad longitude '{}': {}", lon, e))
            .with_context(context)?;
        columns.latitudes.push(latitude);
        columns.longitudes.push(longitude);
        columns.times.push(parse_iso8601(time).with_context(context)?);
    }

    Ok(columns)
}

pub fn read_points_csv(path: impl AsRef<Path>) -> Result<PointColumns> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read points file: {}", path.display()))?;
    parse_points_csv(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
