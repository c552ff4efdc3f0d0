//! OceanDB query CLI.
//!
//! Runs basin-aware batch queries for many points at once and prints one
//! JSON line per point.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dataset::{OceanData, SchemaRegistry};
use ocean_common::time::parse_iso8601;
use ocean_common::{Mission, QueryPoints};
use query_service::{AlongTrackService, EddyService, QueryDefaults, QueryResults};
use storage::BatchExecutor;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ocean_query::{
    read_points_csv, setup, window_from_days, JsonLinesWriter, OceanDbConfig, PointColumns,
};

#[derive(Parser, Debug)]
#[command(name = "ocean-query")]
#[command(about = "Basin-aware batch queries against OceanDB")]
struct Args {
    /// Configuration file (YAML); environment variables are used otherwise
    #[arg(short, long, env = "OCEANDB_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Write every matched observation, not just per-point summaries
    #[arg(long)]
    rows: bool,

    /// JSON-lines output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for NetCDF output, one file per non-empty result
    #[arg(long)]
    netcdf: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct PointArgs {
    /// Latitude of a query point (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    lat: Vec<f64>,

    /// Longitude of a query point (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    lon: Vec<f64>,

    /// Central time of a query point (repeatable)
    #[arg(long)]
    time: Vec<String>,

    /// CSV file of latitude,longitude,time rows
    #[arg(long, conflicts_with_all = ["lat", "lon", "time"])]
    points: Option<PathBuf>,

    /// Search radius in meters
    #[arg(long)]
    radius: Option<f64>,

    /// Full width of the time window in days
    #[arg(long)]
    window_days: Option<f64>,

    /// Mission codes to search
    #[arg(long, value_delimiter = ',')]
    missions: Vec<String>,

    /// Fields to return (default: every stored field)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Observations within a radius and time window of each point
    Radius {
        #[command(flatten)]
        points: PointArgs,

        /// Add delta_x/delta_y offsets in a projection centered on the point
        #[arg(long)]
        projected: bool,

        /// Search eddy observations instead of along-track data
        #[arg(long, conflicts_with = "projected")]
        eddy: bool,
    },

    /// The three nearest observations to each point within its time window
    Nearest {
        #[command(flatten)]
        points: PointArgs,

        /// Search eddy observations instead of along-track data
        #[arg(long)]
        eddy: bool,
    },

    /// Observations inside a box of 2*lx by 2*ly meters around each point
    #[command(name = "box")]
    BoundingBox {
        #[command(flatten)]
        points: PointArgs,

        /// Half-width of the box in meters
        #[arg(long)]
        lx: f64,

        /// Half-height of the box in meters
        #[arg(long)]
        ly: f64,

        /// Search every basin instead of the point's connected basins
        #[arg(long)]
        no_basin_mask: bool,
    },

    /// One eddy track by signed track id, optionally with nearby along-track data
    EddyTrack {
        /// Signed track id (negative for cyclonic eddies)
        #[arg(allow_hyphen_values = true)]
        track: i64,

        /// Also fetch along-track observations near the eddy
        #[arg(long)]
        along_track: bool,

        /// Eddy fields to return
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Along-track fields to return
        #[arg(long, value_delimiter = ',')]
        along_track_fields: Vec<String>,
    },

    /// Signed ids of every eddy track observed in [start, end)
    EddyTracks {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .json()
        .init();

    let config = match &args.config {
        Some(path) => OceanDbConfig::from_yaml_file(path)?,
        None => OceanDbConfig::from_env()?,
    };
    info!(
        basin_mask = %config.basin_mask.display(),
        max_connections = config.max_connections,
        "Loaded configuration"
    );

    let backend = setup::connect(&config).await?;
    let resolver = Arc::new(setup::load_resolver(&config, &backend).await?);
    let executor = BatchExecutor::new(Arc::new(backend));
    let registry = SchemaRegistry::builtin();

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut writer = JsonLinesWriter::new(out, args.rows);

    let along_track = || {
        AlongTrackService::new(
            executor.clone(),
            resolver.clone(),
            &registry,
            config.defaults.clone(),
        )
    };
    let eddy = || {
        EddyService::new(
            executor.clone(),
            resolver.clone(),
            &registry,
            config.defaults.clone(),
        )
    };

    match &args.command {
        Command::Radius {
            points,
            projected,
            eddy: eddies,
        } => {
            let query = query_points(points, &config.defaults)?;
            let results = if *eddies {
                let service = eddy()?;
                let fields = fields_or(&points.fields, service.default_fields());
                service.eddies_in_r_dt(&query, &fields).await?
            } else {
                let service = along_track()?;
                let fields = fields_or(&points.fields, service.default_fields());
                if *projected {
                    service.projected_points_in_r_dt(&query, &fields).await?
                } else {
                    service.geographic_points_in_r_dt(&query, &fields).await?
                }
            };
            write_points(&mut writer, results, args.netcdf.as_deref())?;
        }
        Command::Nearest {
            points,
            eddy: eddies,
        } => {
            let query = query_points(points, &config.defaults)?;
            let results = if *eddies {
                let service = eddy()?;
                let fields = fields_or(&points.fields, service.default_fields());
                service.eddy_nearest_neighbors(&query, &fields).await?
            } else {
                let service = along_track()?;
                let fields = fields_or(&points.fields, service.default_fields());
                service.nearest_neighbors(&query, &fields).await?
            };
            write_points(&mut writer, results, args.netcdf.as_deref())?;
        }
        Command::BoundingBox {
            points,
            lx,
            ly,
            no_basin_mask,
        } => {
            let query = query_points(points, &config.defaults)?;
            let service = along_track()?;
            let fields = fields_or(&points.fields, service.default_fields());
            let results = service
                .projected_points_in_dx_dy_dt(&query, &fields, *lx, *ly, !*no_basin_mask)
                .await?;
            write_points(&mut writer, results, args.netcdf.as_deref())?;
        }
        Command::EddyTrack {
            track,
            along_track: with_along_track,
            fields,
            along_track_fields,
        } => {
            let service = eddy()?;
            let eddy_fields = fields_or(fields, service.default_fields());
            let data = if *with_along_track {
                let along_fields =
                    fields_or(along_track_fields, service.default_along_track_fields());
                service
                    .along_track_near_eddy(*track, &eddy_fields, &along_fields)
                    .await?
            } else {
                service.eddy_with_track_id(*track, &eddy_fields).await?
            };

            match data {
                Some(data) => {
                    writer.write_ocean_data(&format!("eddy {}", track), &data)?;
                    if let Some(dir) = &args.netcdf {
                        let path = netcdf_path(dir, &format!("eddy_{}.nc", track))?;
                        setup::write_netcdf(&data, &path)?;
                    }
                }
                None => writer.write_value(&serde_json::json!({
                    "result": format!("eddy {}", track),
                    "rows": 0,
                }))?,
            }
        }
        Command::EddyTracks { start, end } => {
            let ids = eddy()?
                .eddy_tracks_in_time_range(parse_iso8601(start)?, parse_iso8601(end)?)
                .await?;
            for id in ids {
                writer.write_value(&serde_json::json!({ "signed_track": id }))?;
            }
        }
    }

    writer.flush()?;
    info!(lines = writer.lines(), "Done");
    Ok(())
}

/// Query points from flags or a CSV file, with per-run overrides of the
/// configured defaults.
fn query_points(args: &PointArgs, defaults: &QueryDefaults) -> Result<QueryPoints> {
    let columns = match &args.points {
        Some(path) => read_points_csv(path)?,
        None => PointColumns {
            latitudes: args.lat.clone(),
            longitudes: args.lon.clone(),
            times: args
                .time
                .iter()
                .map(|t| parse_iso8601(t))
                .collect::<Result<Vec<_>, _>>()?,
        },
    };
    if columns.is_empty() {
        bail!("no query points: pass --lat/--lon/--time or --points");
    }

    let mut defaults = defaults.clone();
    if let Some(radius) = args.radius {
        defaults.radius = radius;
    }
    if let Some(days) = args.window_days {
        defaults.time_window = window_from_days(days)?;
    }
    if !args.missions.is_empty() {
        defaults.missions = Mission::parse_list(&args.missions)?;
    }
    defaults.validate()?;

    let points = columns.to_query_points(&defaults)?;
    info!(points = points.len(), "Prepared query points");
    Ok(points)
}

fn fields_or(requested: &[String], default: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        default
    } else {
        requested.to_vec()
    }
}

fn netcdf_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir.join(file_name))
}

fn write_points<W: Write>(
    writer: &mut JsonLinesWriter<W>,
    results: QueryResults,
    netcdf_dir: Option<&Path>,
) -> Result<()> {
    for (index, result) in results.enumerate() {
        let dataset = result?;
        writer.write_point(index, dataset.as_ref())?;

        if let (Some(dir), Some(dataset)) = (netcdf_dir, dataset) {
            let data = OceanData::new().with(dataset)?;
            let path = netcdf_path(dir, &format!("point_{:05}.nc", index))?;
            setup::write_netcdf(&data, &path)?;
        }
    }
    Ok(())
}
