use std::sync::Arc;

use anyhow::{Context, Error};

use dfs_meta::api::AppState;
use dfs_meta::catalog::store::CatalogStore;
use dfs_meta::config::Config;
use dfs_meta::healthcheck::HealthChecker;
use dfs_meta::server;

#[tokio::main]
async fn main() -> Result<(), Error> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = Config::from_env().context("invalid configuration")?;
    log::info!(
        "starting {} as {} with replication factor {}, storage nodes {:?}",
        config.node_id,
        config.role,
        config.replication_factor,
        config.storage_nodes,
    );

    let store = CatalogStore::load(config.metadata_file.clone())
        .with_context(|| format!("unable to load catalog from {:?}", config.metadata_file))?;

    let health_checker = if config.enable_storage_healthcheck {
        Some(HealthChecker::new(config.storage_port, config.storage_healthcheck_timeout))
    } else {
        None
    };

    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(store),
        health_checker,
    };

    server::run(state).await
}
