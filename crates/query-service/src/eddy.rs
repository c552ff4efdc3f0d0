//! Eddy track queries and along-track data near eddies.

use std::sync::Arc;

use basin::BasinResolver;
use chrono::{DateTime, Duration, Utc};
use dataset::{decode, Dataset, OceanData, RawValue, Schema, SchemaRegistry, ALONG_TRACK, EDDY};
use ocean_common::{OceanError, OceanResult, QueryPoints};
use storage::{BatchExecutor, ParamSet, QueryTemplate};
use tracing::{debug, info, instrument};

use crate::defaults::{stored_fields, QueryDefaults};
use crate::params::{owned_fields, point_params, with_fields};
use crate::results::QueryResults;
use crate::templates::{
    self, ALONG_TRACK_NEAR_EDDY, EDDY_BY_TRACK, EDDY_NEAREST, EDDY_RADIUS, EDDY_TRACKS_IN_RANGE,
};

/// Fields needed to locate an eddy in space and time.
const EXTENT_FIELDS: [&str; 3] = ["latitude", "longitude", "date_time"];

/// Query service over the `eddy` table.
///
/// Eddy tracks are addressed by signed track id: `track * cyclonic_type`,
/// negative for cyclonic eddies.
#[derive(Clone)]
pub struct EddyService {
    executor: BatchExecutor,
    resolver: Arc<BasinResolver>,
    eddy_schema: Arc<Schema>,
    along_track_schema: Arc<Schema>,
    defaults: QueryDefaults,
}

impl EddyService {
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
            eddy_schema: registry.get(EDDY)?,
            along_track_schema: registry.get(ALONG_TRACK)?,
            defaults,
        })
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Every stored eddy field.
    pub fn default_fields(&self) -> Vec<String> {
        stored_fields(&self.eddy_schema)
    }

    /// Every stored along-track field.
    pub fn default_along_track_fields(&self) -> Vec<String> {
        stored_fields(&self.along_track_schema)
    }

    /// All observations of one eddy, as an `eddy` dataset.
    #[instrument(skip(self, fields))]
    pub async fn eddy_with_track_id<S: AsRef<str>>(
        &self,
        signed_track_id: i64,
        fields: &[S],
    ) -> OceanResult<Option<OceanData>> {
        let fields = owned_fields(fields);
        match self.fetch_track(signed_track_id, &fields).await? {
            Some(eddy) => OceanData::new().with(eddy).map(Some),
            None => Ok(None),
        }
    }

    /// Signed ids of every eddy track observed in `[start, end)`, ascending.
    #[instrument(skip(self))]
    pub async fn eddy_tracks_in_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> OceanResult<Vec<i64>> {
        if end <= start {
            return Err(OceanError::invalid_parameter(
                "end",
                format!("{} is not after {}", end, start),
            ));
        }

        let template =
            QueryTemplate::compile(EDDY_TRACKS_IN_RANGE, &templates::eddy_tracks_in_range_sql())?;
        let params = [ParamSet::new()
            .with("start_date_time", start)
            .with("end_date_time", end)];

        let rows = self
            .executor
            .execute(&template, &params)
            .await?
            .next()
            .flatten()
            .unwrap_or_default();

        let ids = rows
            .iter()
            .enumerate()
            .map(|(row, r)| match r.get("signed_track") {
                Some(RawValue::Int(id)) => Ok(*id),
                Some(other) => Err(OceanError::decode(
                    "signed_track",
                    row,
                    format!("expected an integer, got {}", other.kind()),
                )),
                None => Err(OceanError::MissingColumn("signed_track".to_string())),
            })
            .collect::<OceanResult<Vec<_>>>()?;

        info!(tracks = ids.len(), "Listed eddy tracks");
        Ok(ids)
    }

    /// One eddy track together with the along-track observations near it.
    ///
    /// The eddy's observations are fetched first; their positions give the
    /// connected basins to search and their dates bound the search. An
    /// along-track observation matches when it lies within twice the speed
    /// radius of an eddy observation, up to one day after it.
    ///
    /// Returns `None` when the track does not exist. The result always
    /// holds an `eddy` dataset and holds an `along_track` dataset when any
    /// observation matched.
    #[instrument(skip(self, eddy_fields, along_track_fields))]
    pub async fn along_track_near_eddy<S: AsRef<str>, T: AsRef<str>>(
        &self,
        signed_track_id: i64,
        eddy_fields: &[S],
        along_track_fields: &[T],
    ) -> OceanResult<Option<OceanData>> {
        let eddy_fields = owned_fields(eddy_fields);
        let along_track_fields = owned_fields(along_track_fields);
        // Reject bad along-track fields before the first round trip
        let along_template = templates::compile(
            ALONG_TRACK_NEAR_EDDY,
            &self.along_track_schema,
            &along_track_fields,
            templates::along_track_near_eddy_sql,
        )?;

        let extent_fields = with_fields(&eddy_fields, &EXTENT_FIELDS);
        let Some(track) = self.fetch_track(signed_track_id, &extent_fields).await? else {
            return Ok(None);
        };

        let latitudes = track.f64_column("latitude")?;
        let longitudes = track.f64_column("longitude")?;
        let basins = self.resolver.connected_union(
            self.resolver
                .basin_ids_for(latitudes, longitudes)?
                .into_iter(),
        );
        let (first, last) = time_extent(&track)?;
        debug!(
            observations = track.len(),
            basins = basins.len(),
            %first,
            %last,
            "Resolved eddy extent"
        );

        let params = [ParamSet::new()
            .with("signed_track_id", signed_track_id)
            .with("start_date_time", first)
            .with("end_date_time", last + Duration::days(1))
            .with("connected_basin_ids", basins)];
        let along_rows = self
            .executor
            .execute(&along_template, &params)
            .await?
            .next()
            .flatten();

        let mut data = OceanData::new().with(track.select(&eddy_fields)?)?;
        if let Some(rows) = along_rows {
            if let Some(along) = decode(&rows, &self.along_track_schema, &along_track_fields)? {
                info!(rows = along.len(), "Found along-track observations near eddy");
                data.add(along)?;
            }
        }
        Ok(Some(data))
    }

    /// Eddy observations within each point's radius and time window, over
    /// the point's connected basins.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn eddies_in_r_dt<S: AsRef<str>>(
        &self,
        points: &QueryPoints,
        fields: &[S],
    ) -> OceanResult<QueryResults> {
        let fields = owned_fields(fields);
        let template =
            templates::compile(EDDY_RADIUS, &self.eddy_schema, &fields, templates::eddy_radius_sql)?;
        let params = point_params(points, &self.resolver)?;
        let slots = self.executor.execute(&template, &params).await?;
        Ok(QueryResults::new(slots, self.eddy_schema.clone(), fields))
    }

    /// The three eddy observations closest to each point within its time
    /// window, over the point's connected basins.
    #[instrument(skip_all, fields(points = points.len()))]
    pub async fn eddy_nearest_neighbors<S: AsRef<str>>(
        &self,
        points: &QueryPoints,
        fields: &[S],
    ) -> OceanResult<QueryResults> {
        let fields = owned_fields(fields);
        let template =
            templates::compile(EDDY_NEAREST, &self.eddy_schema, &fields, templates::eddy_nearest_sql)?;
        let params = point_params(points, &self.resolver)?;
        let slots = self.executor.execute(&template, &params).await?;
        Ok(QueryResults::new(slots, self.eddy_schema.clone(), fields))
    }

    async fn fetch_track(
        &self,
        signed_track_id: i64,
        fields: &[String],
    ) -> OceanResult<Option<Dataset>> {
        let template = templates::compile(
            EDDY_BY_TRACK,
            &self.eddy_schema,
            fields,
            templates::eddy_by_track_sql,
        )?;
        let params = [ParamSet::new().with("signed_track_id", signed_track_id)];
        let rows = self.executor.execute(&template, &params).await?.next().flatten();
        match rows {
            Some(rows) => decode(&rows, &self.eddy_schema, fields),
            None => Ok(None),
        }
    }
}

fn time_extent(track: &Dataset) -> OceanResult<(chrono::NaiveDateTime, chrono::NaiveDateTime)> {
    let times = track
        .get("date_time")?
        .as_timestamps()
        .ok_or_else(|| {
            OceanError::InvalidSchema("eddy field 'date_time' is not a timestamp".to_string())
        })?;
    match (times.iter().min(), times.iter().max()) {
        (Some(first), Some(last)) => Ok((*first, *last)),
        _ => Err(OceanError::MissingColumn("date_time".to_string())),
    }
}
