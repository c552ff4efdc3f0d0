//! Service configuration.
//!
//! Loaded from a YAML file when one is given, otherwise from environment
//! variables (after `.env` has been read):
//!
//! | Variable                    | Meaning                               |
//! |-----------------------------|---------------------------------------|
//! | `DATABASE_URL`              | PostgreSQL connection string          |
//! | `OCEANDB_BASIN_MASK`        | basin mask file (`.nc` or packed)     |
//! | `OCEANDB_BASIN_CONNECTIONS` | basin adjacency YAML (else from DB)   |
//! | `OCEANDB_MAX_CONNECTIONS`   | connection pool size                  |

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use query_service::QueryDefaults;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OceanDbConfig {
    /// Database connection URL
    pub database_url: String,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Basin mask file
    pub basin_mask: PathBuf,

    /// Basin adjacency file; read from the `basin_connections` table
    /// when absent
    #[serde(default)]
    pub basin_connections: Option<PathBuf>,

    /// Query defaults
    #[serde(default)]
    pub defaults: QueryDefaults,
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

impl OceanDbConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let basin_mask = lookup("OCEANDB_BASIN_MASK")
            .map(PathBuf::from)
            .context("OCEANDB_BASIN_MASK is not set")?;
        let max_connections = match lookup("OCEANDB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid OCEANDB_MAX_CONNECTIONS: {}", v))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let config = Self {
            database_url,
            max_connections,
            basin_mask,
            basin_connections: lookup("OCEANDB_BASIN_CONNECTIONS").map(PathBuf::from),
            defaults: QueryDefaults::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            bail!("database_url must not be empty");
        }
        if self.max_connections == 0 {
            bail!("max_connections must be at least 1");
        }
        self.defaults.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_yaml() {
        let config = OceanDbConfig::from_yaml_str(
            r#"
database_url: postgres://ocean@localhost/ocean
basin_mask: /data/basin_masks.nc
defaults:
  radius: 250000
  missions: [j3, s3a]
"#,
        )
        .unwrap();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.basin_mask, PathBuf::from("/data/basin_masks.nc"));
        assert!(config.basin_connections.is_none());
        assert_eq!(config.defaults.radius, 250_000.0);
        assert_eq!(config.defaults.missions.len(), 2);
        assert_eq!(
            config.defaults.time_window,
            QueryDefaults::default().time_window
        );
    }

    #[test]
    fn test_yaml_rejects_unknown_mission() {
        let err = OceanDbConfig::from_yaml_str(
            "database_url: x\nbasin_mask: m\ndefaults:\n  missions: [zz]\n",
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oceandb.yaml");
        std::fs::write(
            &path,
            "database_url: postgres://localhost/ocean\nbasin_mask: mask.bin\nmax_connections: 2\n",
        )
        .unwrap();
        let config = OceanDbConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.max_connections, 2);

        let missing = OceanDbConfig::from_yaml_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(missing.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_from_env_vars() {
        let config = OceanDbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/ocean"),
            ("OCEANDB_BASIN_MASK", "/data/mask.bin"),
            ("OCEANDB_BASIN_CONNECTIONS", "/data/connections.yaml"),
            ("OCEANDB_MAX_CONNECTIONS", "16"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 16);
        assert_eq!(
            config.basin_connections,
            Some(PathBuf::from("/data/connections.yaml"))
        );
    }

    #[test]
    fn test_from_env_requires_database_url() {
        let err = OceanDbConfig::from_lookup(lookup(&[("OCEANDB_BASIN_MASK", "m")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_zero_connections_rejected() {
        assert!(OceanDbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/ocean"),
            ("OCEANDB_BASIN_MASK", "m"),
            ("OCEANDB_MAX_CONNECTIONS", "0"),
        ]))
        .is_err());
    }
}
