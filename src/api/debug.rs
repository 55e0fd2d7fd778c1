//! Introspection endpoints: `/debug/leader`, `/debug/membership`.
//!
//! Both trigger a sweep (so the reported membership is as fresh as any
//! other handler's view) and persist only if the sweep actually mutated
//! something.

use crate::api::types::{DebugLeaderResp, DebugMembershipResp};
use crate::api::AppState;
use crate::catalog::{membership, State};
use crate::error::ApiError;

/// `GET /debug/leader` — this core assumes a single leader; the identifier
/// reported is simply the configured node id. Still sweeps first, like
/// every other handler that touches the catalog.
pub async fn debug_leader(state: &AppState) -> Result<DebugLeaderResp, ApiError> {
    let cfg_nodes = state.config.storage_nodes.clone();
    let timeout = state.config.heartbeat_timeout;

    state.store.with_write(|catalog: &mut State| {
        let (now_ts, now_iso) = membership::now();
        let changed = membership::sweep(catalog, &cfg_nodes, timeout, now_ts, &now_iso);
        Ok(((), changed))
    })?;

    Ok(DebugLeaderResp {
        leader: state.config.node_id.clone(),
    })
}

/// `GET /debug/membership` — full membership snapshot plus counts by status.
pub async fn debug_membership(state: &AppState) -> Result<DebugMembershipResp, ApiError> {
    let cfg_nodes = state.config.storage_nodes.clone();
    let timeout = state.config.heartbeat_timeout;

    state.store.with_write(|catalog: &mut State| {
        let (now_ts, now_iso) = membership::now();
        let changed = membership::sweep(catalog, &cfg_nodes, timeout, now_ts, &now_iso);
        let summary = membership::summarize(catalog);
        let resp = DebugMembershipResp {
            membership: catalog.membership.clone(),
            summary,
        };
        Ok((resp, changed))
    })
}
