//! Built-in schemas for the along-track and eddy archives.
//!
//! Packed variables are stored as `smallint` and decoded with the scale
//! factors below. The `distance` and `delta_t` fields are computed per query
//! point and reference the `:latitude`, `:longitude` and
//! `:central_date_time` template parameters.

use std::collections::HashMap;
use std::sync::Arc;

use ocean_common::{OceanError, OceanResult};

use crate::schema::{FieldType, Schema, SchemaField};

/// Name of the along-track schema and dataset.
pub const ALONG_TRACK: &str = "along_track";

/// Name of the eddy schema and dataset.
pub const EDDY: &str = "eddy";

/// Scale of the packed sea level fields (mm to m).
pub const SLA_SCALE: f64 = 0.001;

/// Scale of packed eddy amplitudes and speeds.
pub const EDDY_SPEED_SCALE: f64 = 1e-4;

/// Scale of packed eddy radii (50 m units).
pub const EDDY_RADIUS_SCALE: f64 = 50.0;

fn latitude() -> SchemaField {
    SchemaField::column("latitude", FieldType::F64)
        .units("degrees_north")
        .standard_name("latitude")
        .long_name("Latitude")
}

fn longitude() -> SchemaField {
    SchemaField::column("longitude", FieldType::F64)
        .units("degrees_east")
        .standard_name("longitude")
        .long_name("Longitude")
}

fn date_time() -> SchemaField {
    SchemaField::column("date_time", FieldType::Timestamp)
        .units("days since 1950-01-01 00:00:00")
        .standard_name("time")
        .long_name("Time of measurement")
}

fn distance(geography_column: &str) -> SchemaField {
    SchemaField::expression(
        "distance",
        format!(
            "ST_Distance(ST_MakePoint(:longitude, :latitude)::geography, {})",
            geography_column
        ),
        FieldType::F64,
    )
    .units("m")
    .long_name("Distance from the query point")
}

fn delta_t() -> SchemaField {
    SchemaField::expression(
        "delta_t",
        "EXTRACT(EPOCH FROM (:central_date_time - date_time))::double precision",
        FieldType::F64,
    )
    .units("s")
    .long_name("Query time minus observation time")
}

fn sea_level(name: &str, long_name: &str) -> SchemaField {
    SchemaField::column(name, FieldType::F64)
        .scale(SLA_SCALE)
        .units("m")
        .long_name(long_name)
}

/// Schema of the `along_track` table.
pub fn along_track_schema() -> Schema {
    let fields = vec![
        latitude(),
        longitude(),
        date_time(),
        SchemaField::column("file_name", FieldType::Text).long_name("Source file name"),
        SchemaField::column("mission", FieldType::Text).long_name("Mission code"),
        SchemaField::column("track", FieldType::I16)
            .units("1")
            .long_name("Track in cycle the measurement belongs to"),
        SchemaField::column("cycle", FieldType::I16)
            .units("1")
            .long_name("Cycle the measurement belongs to"),
        SchemaField::column("basin_id", FieldType::I16).long_name("Ocean basin identifier"),
        sea_level("sla_unfiltered", "Sea level anomaly not-filtered not-subsampled")
            .standard_name("sea_surface_height_above_sea_level"),
        sea_level("sla_filtered", "Sea level anomaly filtered not-subsampled")
            .standard_name("sea_surface_height_above_sea_level"),
        sea_level("dac", "Dynamic Atmospheric Correction"),
        sea_level("ocean_tide", "Ocean tide model"),
        sea_level("internal_tide", "Internal tide correction"),
        sea_level("lwe", "Long wavelength error"),
        sea_level("mdt", "Mean dynamic topography")
            .standard_name("sea_surface_height_above_geoid"),
        sea_level("tpa_correction", "TOPEX-A instrumental drift correction"),
        distance("along_track_point"),
        delta_t(),
    ];
    Schema::builtin(ALONG_TRACK, fields)
}

/// Schema of the `eddy` table.
pub fn eddy_schema() -> Schema {
    let fields = vec![
        SchemaField::column("track", FieldType::I32).long_name("Eddy track identifier"),
        SchemaField::column("cyclonic_type", FieldType::I8)
            .long_name("Cyclonic (-1) or anticyclonic (1) rotation"),
        SchemaField::expression(
            "signed_track",
            "track::bigint * cyclonic_type",
            FieldType::I64,
        )
        .long_name("Track identifier signed by rotation"),
        date_time(),
        latitude(),
        longitude(),
        SchemaField::column("observation_number", FieldType::I32)
            .long_name("Observation index along eddy track"),
        SchemaField::column("amplitude", FieldType::F64)
            .scale(EDDY_SPEED_SCALE)
            .units("m")
            .long_name("Eddy amplitude"),
        SchemaField::column("speed_radius", FieldType::F64)
            .scale(EDDY_RADIUS_SCALE)
            .units("m")
            .long_name("Speed-based eddy radius"),
        SchemaField::column("effective_radius", FieldType::F64)
            .scale(EDDY_RADIUS_SCALE)
            .units("m")
            .long_name("Effective eddy radius"),
        SchemaField::column("effective_area", FieldType::F64)
            .units("m^2")
            .long_name("Area enclosed by the effective contour"),
        SchemaField::column("speed_average", FieldType::F64)
            .scale(EDDY_SPEED_SCALE)
            .units("m/s")
            .long_name("Average speed of the speed contour"),
        SchemaField::column("speed_area", FieldType::F64)
            .units("m^2")
            .long_name("Area enclosed by the speed contour"),
        SchemaField::column("cost_association", FieldType::F64)
            .long_name("Cost of association between two eddies"),
        SchemaField::column("observation_flag", FieldType::Bool)
            .long_name("Virtual observation flag"),
        distance("eddy_point"),
        delta_t(),
    ];
    Schema::builtin(EDDY, fields)
}

/// Named, shared schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the along-track and eddy schemas.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.schemas.insert(ALONG_TRACK.to_string(), Arc::new(along_track_schema()));
        registry.schemas.insert(EDDY.to_string(), Arc::new(eddy_schema()));
        registry
    }

    /// Add a schema under its own name.
    pub fn register(&mut self, schema: Schema) -> OceanResult<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(OceanError::InvalidSchema(format!(
                "schema '{}' is already registered",
                schema.name()
            )));
        }
        self.schemas.insert(schema.name().to_string(), Arc::new(schema));
        Ok(())
    }

    pub fn get(&self, name: &str) -> OceanResult<Arc<Schema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| OceanError::InvalidSchema(format!("no schema named '{}'", name)))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
