//! Loading basin connectivity from the `basin_connections` table.

use basin::{BasinConnectivity, BasinId};
use ocean_common::{OceanError, OceanResult};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};

#[derive(Debug, FromRow)]
struct ConnectionRow {
    basin_id: i32,
    connected_id: i32,
}

#[derive(Debug, FromRow)]
struct BasinNameRow {
    id: i32,
    name: Option<String>,
}

/// Read the connected-basin relation, plus basin names when the `basin`
/// table has them.
pub async fn load_basin_connectivity(pool: &PgPool) -> OceanResult<BasinConnectivity> {
    let rows = sqlx::query_as::<_, ConnectionRow>(
        "SELECT basin_id::int AS basin_id, connected_id::int AS connected_id \
         FROM basin_connections ORDER BY basin_id, connected_id",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| OceanError::DatabaseError(format!("Failed to load basin connections: {}", e)))?;

    let pairs: Vec<(BasinId, BasinId)> = rows
        .into_iter()
        .map(|r| (r.basin_id, r.connected_id))
        .collect();
    let pair_count = pairs.len();
    let mut connectivity = BasinConnectivity::from_pairs(pairs);

    match sqlx::query_as::<_, BasinNameRow>("SELECT id::int AS id, name FROM basin")
        .fetch_all(pool)
        .await
    {
        Ok(names) => {
            connectivity = connectivity.with_names(
                names
                    .into_iter()
                    .filter_map(|r| r.name.map(|name| (r.id, name))),
            );
        }
        Err(e) => warn!(error = %e, "Basin names unavailable"),
    }

    info!(
        pairs = pair_count,
        basins = connectivity.len(),
        "Loaded basin connections from database"
    );
    Ok(connectivity)
}
