//! Process configuration, sourced once from the environment at startup.
//!
//! Nothing below the call to [`Config::from_env`] ever reads an environment
//! variable again — the value is constructed once in the binary entry point
//! and handed down by reference/`Arc` to the catalog, membership and
//! placement layers. This avoids the cyclic "state module reaches back into
//! global config" shape that's easy to fall into with a naive port.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Error};

/// Default listen address for the HTTP server.
const DEFAULT_BIND: &str = "0.0.0.0:8008";

#[derive(Debug, Clone)]
pub struct Config {
    /// This meta node's own identifier, reported by `/debug/leader`.
    pub node_id: String,
    /// Fixed role string; this core assumes a single leader.
    pub role: String,
    /// Target replication factor `R`.
    pub replication_factor: usize,
    /// The configured set of known storage node identifiers, `N_cfg`.
    pub storage_nodes: Vec<String>,
    /// Directory holding the metadata file.
    pub data_dir: PathBuf,
    /// Full path to the metadata file (`data_dir` joined with the configured name).
    pub metadata_file: PathBuf,
    /// Liveness timeout `T_timeout`.
    pub heartbeat_timeout: Duration,
    /// Whether to additionally probe storage nodes' `/health` endpoint.
    pub enable_storage_healthcheck: bool,
    /// Port storage nodes expose their HTTP health endpoint on.
    pub storage_port: u16,
    /// Per-request deadline for the optional health probe.
    pub storage_healthcheck_timeout: Duration,
    /// Address the meta HTTP server binds to.
    pub bind_addr: String,
}

impl Config {
    /// Build a `Config` from the process environment. Fails fast (before the
    /// server binds its socket) on any malformed value.
    pub fn from_env() -> Result<Self, Error> {
        let node_id = env_or("META_NODE_ID", "meta-01");
        let role = env_or("META_ROLE", "leader");

        let replication_factor = parse_int_env("REPLICATION_FACTOR", 1)
            .context("invalid REPLICATION_FACTOR")?;

        let storage_nodes = parse_csv_env("STORAGE_NODES", "storage-01");
        if storage_nodes.is_empty() {
            bail!("STORAGE_NODES must name at least one storage node");
        }

        let data_dir = PathBuf::from(env_or("DATA_DIR", "/data"));
        let metadata_file_name = env_or("METADATA_FILE", "metadata.json");
        let metadata_file = data_dir.join(metadata_file_name);

        let heartbeat_timeout_sec = parse_float_env("HEARTBEAT_TIMEOUT_SEC", 9.0)
            .context("invalid HEARTBEAT_TIMEOUT_SEC")?;
        if heartbeat_timeout_sec <= 0.0 {
            bail!("HEARTBEAT_TIMEOUT_SEC must be positive");
        }

        let enable_storage_healthcheck = parse_bool_env("ENABLE_STORAGE_HEALTHCHECK", false)
            .context("invalid ENABLE_STORAGE_HEALTHCHECK")?;

        let storage_port: u16 = parse_int_env("STORAGE_PORT", 9009)
            .context("invalid STORAGE_PORT")?;

        let storage_healthcheck_timeout_sec =
            parse_float_env("STORAGE_HEALTHCHECK_TIMEOUT_SEC", 0.2)
                .context("invalid STORAGE_HEALTHCHECK_TIMEOUT_SEC")?;

        let bind_addr = env_or("META_BIND", DEFAULT_BIND);

        Ok(Config {
            node_id,
            role,
            replication_factor,
            storage_nodes,
            data_dir,
            metadata_file,
            heartbeat_timeout: Duration::from_secs_f64(heartbeat_timeout_sec),
            enable_storage_healthcheck,
            storage_port,
            storage_healthcheck_timeout: Duration::from_secs_f64(storage_healthcheck_timeout_sec),
            bind_addr,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_csv_env(name: &str, default: &str) -> Vec<String> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Only `1`, `true`, `yes`, `on` (case-insensitive) are truthy.
fn parse_bool_env(name: &str, default: bool) -> Result<bool, Error> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let normalized = raw.trim().to_lowercase();
            Ok(matches!(normalized.as_str(), "1" | "true" | "yes" | "on"))
        }
    }
}

fn parse_int_env<T>(name: &str, default: T) -> Result<T, Error>
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("{}: {}", name, err)),
    }
}

fn parse_float_env(name: &str, default: f64) -> Result<f64, Error> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|err| anyhow::anyhow!("{}: {}", name, err)),
    }
}
