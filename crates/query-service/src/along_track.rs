//! Along-track altimetry queries.

use std::sync::Arc;

use basin::BasinResolver;
use dataset::{Schema, SchemaRegistry, ALONG_TRACK};
use metrics::counter;
use ocean_common::{OceanError, OceanResult, QueryPoints};
use projection::bounding_box_for;
use storage::{BatchExecutor, ParamSet};
use tracing::{info, instrument};

use crate::defaults::{stored_fields, QueryDefaults};
use crate::params::{owned_fields, point_params, with_fields};
use crate::results::{Projection, QueryResults, DELTA_X, DELTA_Y};
use crate::templates::{self, ALONG_TRACK_BOX, ALONG_TRACK_BOX_NO_MASK, ALONG_TRACK_NEAREST, ALONG_TRACK_RADIUS};

/// Coordinates needed to compute planar offsets.
const POSITION_FIELDS: [&str; 2] = ["latitude", "longitude"];

/// Query service over the `along_track` table.
#[derive(Clone)]
pub struct AlongTrackService {
    executor: BatchExecutor,
    resolver: Arc<BasinResolver>,
    schema: Arc<Schema>,
    defaults: QueryDefaults,
}

impl AlongTrackService {
    pub fn new(
        executor: BatchExecutor,
        resolver: Arc<BasinResolver>,
        registry: &SchemaRegistry,
        defaults: QueryDefaults,
    ) -> OceanResult<Self> {
        defaults.validate()?;
        Ok(Self {
            executor,
            resolver,
            schema: registry.get(ALONG_TRACK)?,
            defaults,
        })
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Every stored along-track field.
    pub fn default_fields(&self) -> Vec<String> {
        stored_fields(&self.schema)
    }

    /// Observations within each point's radius and time window, restricted
    /// to the point's connected basins.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn geographic_points_in_r_dt<S: AsRef<str>>(
        &self,
        points: &QueryPoints,
        fields: &[S],
    ) -> OceanResult<QueryResults> {
        let fields = owned_fields(fields);
        let template = templates::compile(
            ALONG_TRACK_RADIUS,
            &self.schema,
            &fields,
            templates::along_track_radius_sql,
        )?;
        let params = point_params(points, &self.resolver)?;
        self.run(ALONG_TRACK_RADIUS, &template, params, fields).await
    }

    /// The three observations closest to each point within its time
    /// window, restricted to the point's connected basins.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn nearest_neighbors<S: AsRef<str>>(
        &self,
        points: &QueryPoints,
        fields: &[S],
    ) -> OceanResult<QueryResults> {
        let fields = owned_fields(fields);
        let template = templates::compile(
            ALONG_TRACK_NEAREST,
            &self.schema,
            &fields,
            templates::along_track_nearest_sql,
        )?;
        let params = point_params(points, &self.resolver)?;
        self.run(ALONG_TRACK_NEAREST, &template, params, fields).await
    }

    /// Radius query with `delta_x`/`delta_y` offsets (meters) of every
    /// observation in a transverse Mercator frame centered on its point.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn projected_points_in_r_dt<S: AsRef<str>>(
        &self,
        points: &QueryPoints,
        fields: &[S],
    ) -> OceanResult<QueryResults> {
        let output = with_fields(fields, &[DELTA_X, DELTA_Y]);
        let fetched = with_fields(fields, &POSITION_FIELDS);
        let template = templates::compile(
            ALONG_TRACK_RADIUS,
            &self.schema,
            &fetched,
            templates::along_track_radius_sql,
        )?;
        let params = point_params(points, &self.resolver)?;

        let results = self.run(ALONG_TRACK_RADIUS, &template, params, fetched).await?;
        Ok(results.projected(Projection {
            centers: centers(points),
            limits: None,
            output,
        }))
    }

    /// Observations inside a `2lx × 2ly` meter box centered on each point
    /// (`|Δx| <= lx`, `|Δy| <= ly`), with their offsets.
    ///
    /// The store is queried through the geographic envelope of the box.
    /// With `basin_mask` the query is also restricted to the point's
    /// connected basins; without it the box may reach across land.
    #[instrument(skip_all, fields(points = points.len(), lx = lx, ly = ly, basin_mask = basin_mask))]
    pub async fn projected_points_in_dx_dy_dt<S: AsRef<str>>(
        &self,
        points: &QueryPoints,
        fields: &[S],
        lx: f64,
        ly: f64,
        basin_mask: bool,
    ) -> OceanResult<QueryResults> {
        for (name, value) in [("lx", lx), ("ly", ly)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(OceanError::invalid_parameter(
                    name,
                    format!("{} must be a positive number of meters", value),
                ));
            }
        }

        let output = with_fields(fields, &[DELTA_X, DELTA_Y]);
        let fetched = with_fields(fields, &POSITION_FIELDS);
        let name = if basin_mask {
            ALONG_TRACK_BOX
        } else {
            ALONG_TRACK_BOX_NO_MASK
        };
        let template = templates::compile(name, &self.schema, &fetched, |select| {
            templates::along_track_box_sql(select, basin_mask)
        })?;

        let params: Vec<ParamSet> = point_params(points, &self.resolver)?
            .into_iter()
            .zip(points)
            .map(|(set, point)| {
                let envelope = bounding_box_for(
                    point.latitude,
                    point.signed_longitude(),
                    2.0 * lx,
                    2.0 * ly,
                );
                set.with("min_lat", envelope.min_lat())
                    .with("max_lat", envelope.max_lat())
                    .with("min_lon", envelope.min_lon())
                    .with("max_lon", envelope.max_lon())
            })
            .collect();

        let results = self.run(name, &template, params, fetched).await?;
        Ok(results.projected(Projection {
            centers: centers(points),
            limits: Some((lx, ly)),
            output,
        }))
    }

    async fn run(
        &self,
        operation: &'static str,
        template: &storage::QueryTemplate,
        params: Vec<ParamSet>,
        fields: Vec<String>,
    ) -> OceanResult<QueryResults> {
        counter!("oceandb_query_points_total", "operation" => operation)
            .increment(params.len() as u64);
        let slots = self.executor.execute(template, &params).await?;
        info!(operation, points = params.len(), "Along-track query executed");
        Ok(QueryResults::new(slots, self.schema.clone(), fields))
    }
}

fn centers(points: &QueryPoints) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| (p.latitude, p.signed_longitude()))
        .collect()
}
