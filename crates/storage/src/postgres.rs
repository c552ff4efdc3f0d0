//! PostgreSQL/PostGIS backend.
//!
//! A batch is sent as one statement. All parameter sets travel as a single
//! JSONB array; the template is evaluated once per array element through a
//! `LATERAL` join, and every row carries the element's ordinal:
//!
//! ```sql
//! WITH batch AS (
//!     SELECT (b.ord - 1)::bigint AS query_index, b.params
//!     FROM jsonb_array_elements($1::jsonb) WITH ORDINALITY AS b(params, ord)
//! )
//! SELECT batch.query_index AS __query_index, matches.*
//! FROM batch
//! CROSS JOIN LATERAL (
//!     SELECT row_number() OVER () AS __row_index, m.* FROM (<template>) AS m
//! ) AS matches
//! ORDER BY batch.query_index, matches.__row_index
//! ```
//!
//! Inside the template `:name` becomes a typed read of `batch.params`.
//!
//! `__row_index` numbers the template's rows in the order the subquery
//! emits them. Postgres feeds a sorted subquery scan straight into an
//! unordered window without re-sorting, so the template's own `ORDER BY`
//! carries through; this holds as long as `m` is the only relation in the
//! window's `FROM`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use dataset::{RawRow, RawValue};
use ocean_common::{OceanError, OceanResult};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};
use tracing::{debug, info};

use crate::batch::{QueryBackend, TaggedRow};
use crate::template::{Batch, ParamType};

/// Column carrying the parameter-set index of each row.
pub const QUERY_INDEX_COLUMN: &str = "__query_index";

/// Column carrying the per-set row ordinal.
pub const ROW_INDEX_COLUMN: &str = "__row_index";

/// Batch backend over a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Connect to the database.
    pub async fn connect(database_url: &str, max_connections: u32) -> OceanResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| OceanError::DatabaseError(format!("Connection failed: {}", e)))?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// SQL reading parameter `name` of type `ty` from the current batch element.
pub fn param_sql(name: &str, ty: ParamType) -> String {
    let text = format!("(batch.params->>'{}')", name);
    match ty {
        ParamType::Float => format!("{}::double precision", text),
        ParamType::Int => format!("{}::bigint", text),
        ParamType::Text => text,
        ParamType::Timestamp => format!("{}::timestamp", text),
        ParamType::Interval => format!("make_interval(secs => {}::double precision)", text),
        ParamType::IntArray => format!(
            "ARRAY(SELECT jsonb_array_elements_text(batch.params->'{}')::bigint)",
            name
        ),
        ParamType::TextArray => format!(
            "ARRAY(SELECT jsonb_array_elements_text(batch.params->'{}'))",
            name
        ),
    }
}

/// Full single-statement SQL for a batch.
pub fn render_batch_sql(batch: &Batch<'_>) -> String {
    let inner = batch.template().render(|name| {
        // bind() guarantees every parameter has a type in a non-empty batch
        let ty = batch.param_type(name).unwrap_or(ParamType::Text);
        param_sql(name, ty)
    });

    format!(
        "WITH batch AS (\n\
         \x20   SELECT (b.ord - 1)::bigint AS {qi}, b.params\n\
         \x20   FROM jsonb_array_elements($1::jsonb) WITH ORDINALITY AS b(params, ord)\n\
         )\n\
         SELECT batch.{qi} AS {qi}, matches.*\n\
         FROM batch\n\
         CROSS JOIN LATERAL (\n\
         \x20   SELECT row_number() OVER () AS {ri}, m.* FROM (\n{inner}\n) AS m\n\
         ) AS matches\n\
         ORDER BY batch.{qi}, matches.{ri}",
        qi = QUERY_INDEX_COLUMN,
        ri = ROW_INDEX_COLUMN,
        inner = inner,
    )
}

#[async_trait]
impl QueryBackend for PgBackend {
    async fn execute_tagged(&self, batch: &Batch<'_>) -> OceanResult<Vec<TaggedRow>> {
        let sql = render_batch_sql(batch);
        let params = batch.params_json();

        // One connection for the whole batch, returned to the pool before
        // any row is decoded.
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| OceanError::DatabaseError(format!("Failed to acquire connection: {}", e)))?;

        let rows = sqlx::query(&sql)
            .bind(sqlx::types::Json(params))
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                OceanError::DatabaseError(format!(
                    "Batch query '{}' failed: {}",
                    batch.template().name(),
                    e
                ))
            })?;
        drop(conn);

        debug!(rows = rows.len(), "Fetched batch rows");
        rows.iter().map(pg_row_to_tagged).collect()
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Split a result row into its parameter-set index and payload columns.
pub fn pg_row_to_tagged(row: &PgRow) -> OceanResult<TaggedRow> {
    let index: i64 = row
        .try_get(QUERY_INDEX_COLUMN)
        .map_err(|e| OceanError::BatchMisaligned(format!("row without query index: {}", e)))?;
    let index = usize::try_from(index)
        .map_err(|_| OceanError::BatchMisaligned(format!("negative query index {}", index)))?;

    let mut raw = RawRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        if name == QUERY_INDEX_COLUMN || name == ROW_INDEX_COLUMN {
            continue;
        }
        raw.insert(name, pg_value(row, idx)?);
    }
    Ok((index, raw))
}

fn pg_value(row: &PgRow, idx: usize) -> OceanResult<RawValue> {
    let ty = row.columns()[idx].type_info().name().to_string();
    let value = match ty.as_str() {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map(RawValue::from),
        "INT2" => row.try_get::<Option<i16>, _>(idx).map(RawValue::from),
        "INT4" => row.try_get::<Option<i32>, _>(idx).map(RawValue::from),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map(RawValue::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map(RawValue::from),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map(RawValue::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx).map(RawValue::from)
        }
        "TIMESTAMP" => row.try_get::<Option<NaiveDateTime>, _>(idx).map(RawValue::from),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)
            .map(|v| RawValue::from(v.map(|t| t.naive_utc()))),
        other => {
            return Err(OceanError::DatabaseError(format!(
                "Unsupported column type {} for '{}'",
                other,
                row.columns()[idx].name()
            )))
        }
    };
    value.map_err(|e| {
        OceanError::DatabaseError(format!(
            "Failed to read column '{}' ({}): {}",
            row.columns()[idx].name(),
            ty,
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ParamSet, QueryTemplate};

    #[test]
    fn test_param_sql() {
        assert_eq!(
            param_sql("latitude", ParamType::Float),
            "(batch.params->>'latitude')::double precision"
        );
        assert_eq!(
            param_sql("missions", ParamType::TextArray),
            "ARRAY(SELECT jsonb_array_elements_text(batch.params->'missions'))"
        );
    }

    #[test]
    fn test_render_batch_sql() {
        let template = QueryTemplate::compile(
            "radius",
            "SELECT sla FROM along_track WHERE basin_id = ANY(:basins) AND date_time > :start::timestamp",
        )
        .unwrap();
        let sets = vec![ParamSet::new()
            .with("basins", vec![1i64, 2])
            .with("start", chrono::Utc::now())];
        let batch = template.bind(&sets).unwrap();
        let sql = render_batch_sql(&batch);

        assert!(sql.contains("jsonb_array_elements($1::jsonb) WITH ORDINALITY"));
        assert!(sql.contains("ARRAY(SELECT jsonb_array_elements_text(batch.params->'basins')::bigint)"));
        assert!(sql.contains("(batch.params->>'start')::timestamp::timestamp"));
        assert!(sql.contains("ORDER BY batch.__query_index, matches.__row_index"));
        assert!(!sql.contains(":basins"));
    }

    #[test]
    fn test_row_index_numbers_the_template_order() {
        let template = QueryTemplate::compile(
            "nearest",
            "SELECT sla FROM along_track ORDER BY date_time DESC LIMIT 3",
        )
        .unwrap();
        let params = [ParamSet::new()];
        let batch = template.bind(&params).unwrap();
        let sql = render_batch_sql(&batch);

        // the window reads the ordered template directly, with nothing joined in
        let window = "SELECT row_number() OVER () AS __row_index, m.* FROM (\n\
                      SELECT sla FROM along_track ORDER BY date_time DESC LIMIT 3\n\
                      ) AS m\n)";
        assert!(sql.contains(window), "{sql}");
    }
}
