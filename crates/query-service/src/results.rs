//! Lazily decoded per-point results.

use std::sync::Arc;

use dataset::{decode, Column, ColumnData, Dataset, FieldAttrs, Schema};
use ocean_common::OceanResult;
use projection::SphericalTransverseMercator;
use storage::BatchResults;

/// Planar offset columns added to projected results.
pub const DELTA_X: &str = "delta_x";
pub const DELTA_Y: &str = "delta_y";

/// One item per query point, in input order: `Ok(None)` when the point
/// matched nothing, `Ok(Some(dataset))` otherwise.
///
/// Rows are decoded as items are consumed.
#[derive(Debug)]
pub struct QueryResults {
    slots: BatchResults,
    schema: Arc<Schema>,
    fields: Vec<String>,
    projection: Option<Projection>,
    index: usize,
}

/// Post-decode projection onto a frame centered on each query point.
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    /// `(latitude, longitude)` of every query point.
    pub centers: Vec<(f64, f64)>,
    /// Keep only rows with `|dx| <= lx` and `|dy| <= ly`.
    pub limits: Option<(f64, f64)>,
    /// Fields of the final dataset, offsets last.
    pub output: Vec<String>,
}

impl QueryResults {
    pub(crate) fn new(slots: BatchResults, schema: Arc<Schema>, fields: Vec<String>) -> Self {
        Self {
            slots,
            schema,
            fields,
            projection: None,
            index: 0,
        }
    }

    pub(crate) fn projected(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Drain every item, failing on the first error.
    pub fn collect_all(self) -> OceanResult<Vec<Option<Dataset>>> {
        self.collect()
    }
}

impl Iterator for QueryResults {
    type Item = OceanResult<Option<Dataset>>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.next()?;
        let index = self.index;
        self.index += 1;

        let Some(rows) = slot else {
            return Some(Ok(None));
        };
        let decoded = match decode(&rows, &self.schema, &self.fields) {
            Ok(decoded) => decoded,
            Err(e) => return Some(Err(e)),
        };
        Some(match (decoded, &self.projection) {
            (Some(ds), Some(projection)) => projection.apply(index, ds),
            (decoded, _) => Ok(decoded),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl ExactSizeIterator for QueryResults {}

impl Projection {
    fn apply(&self, index: usize, ds: Dataset) -> OceanResult<Option<Dataset>> {
        let (lat0, lon0) = self.centers[index];
        let tm = SphericalTransverseMercator::new(lon0);

        let latitudes = ds.f64_column("latitude")?;
        let longitudes = ds.f64_column("longitude")?;
        let (dx, dy): (Vec<f64>, Vec<f64>) = latitudes
            .iter()
            .zip(longitudes)
            .map(|(&lat, &lon)| tm.offsets_from_center(lat0, lat, lon))
            .unzip();

        let mask: Option<Vec<bool>> = self.limits.map(|(lx, ly)| {
            dx.iter()
                .zip(&dy)
                .map(|(x, y)| x.abs() <= lx && y.abs() <= ly)
                .collect()
        });

        let ds = ds
            .with_column(offset_column(DELTA_X, dx, "Eastward offset from the query point"))?
            .with_column(offset_column(DELTA_Y, dy, "Northward offset from the query point"))?;

        let ds = match mask {
            Some(mask) if !mask.iter().any(|&keep| keep) => return Ok(None),
            Some(mask) => ds.filter(&mask)?,
            None => ds,
        };
        ds.select(&self.output).map(Some)
    }
}

fn offset_column(name: &str, values: Vec<f64>, long_name: &str) -> Column {
    Column::new(name, ColumnData::F64(values)).with_attrs(FieldAttrs {
        units: Some("m".to_string()),
        long_name: Some(long_name.to_string()),
        standard_name: None,
    })
}
