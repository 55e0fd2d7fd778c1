//! The client-facing catalog API and the storage-node heartbeat API.
//!
//! Every handler here follows the same shape: `load → sweep → ...`, ending
//! with `persist` for the handlers that mutate the catalog. The sweep is
//! folded into the first lock acquisition via [`crate::catalog::membership`]
//! rather than run by a background timer — see the crate root docs.

pub mod debug;
pub mod chunk;
pub mod file;
pub mod heartbeat;
pub mod types;

use std::sync::Arc;

use crate::catalog::store::CatalogStore;
use crate::catalog::{membership, State};
use crate::config::Config;
use crate::error::ApiError;
use crate::healthcheck::HealthChecker;

/// Shared, immutable handles every handler needs. Cheap to clone (an `Arc`
/// around the catalog, a plain config value, an optional health-check
/// client).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<CatalogStore>,
    pub health_checker: Option<HealthChecker>,
}

impl AppState {
    /// Sweep membership and return the configured-node alive set, persisting
    /// the sweep's effect if it changed anything. Does not apply the
    /// optional health probe — see [`Self::effective_alive_nodes`].
    fn swept_alive_nodes(&self) -> Result<Vec<String>, ApiError> {
        let cfg_nodes = self.config.storage_nodes.clone();
        self.store.with_write(|state: &mut State| {
            let (now_ts, now_iso) = membership::now();
            let changed =
                membership::sweep(state, &cfg_nodes, self.config.heartbeat_timeout, now_ts, &now_iso);
            let alive = membership::alive_set(state, &cfg_nodes);
            Ok((alive, changed))
        })
    }

    /// The alive set a placement decision should use: membership-alive
    /// nodes, additionally filtered by a live `/health` probe when enabled.
    pub async fn effective_alive_nodes(&self) -> Result<Vec<String>, ApiError> {
        let alive = self.swept_alive_nodes()?;
        match &self.health_checker {
            Some(checker) => Ok(checker.filter_alive(&alive).await),
            None => Ok(alive),
        }
    }
}
