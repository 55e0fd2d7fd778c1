use log::info;

use crate::api::types::{StorageHeartbeatReq, StorageHeartbeatResp};
use crate::api::AppState;
use crate::catalog::{membership, State};
use crate::error::ApiError;

/// `POST /internal/storage_heartbeat`.
///
/// Sweeps *before* marking the node alive, so a node that had gone `dead`
/// shows that transition in the sweep before this heartbeat immediately
/// revives it — the sequence is explainable from logs, not collapsed into
/// one silent update.
pub async fn storage_heartbeat(
    state: &AppState,
    req: StorageHeartbeatReq,
) -> Result<StorageHeartbeatResp, ApiError> {
    if req.node_id.is_empty() || !state.config.storage_nodes.contains(&req.node_id) {
        return Err(ApiError::BadRequest(format!(
            "unknown storage node {:?}",
            req.node_id
        )));
    }

    let cfg_nodes = state.config.storage_nodes.clone();
    let timeout = state.config.heartbeat_timeout;
    let node_id = req.node_id.clone();

    let observed_at = state.store.with_write(|catalog: &mut State| {
        let (now_ts, now_iso) = membership::now();
        let mut changed = membership::sweep(catalog, &cfg_nodes, timeout, now_ts, &now_iso);
        if membership::mark_heartbeat(catalog, &node_id, now_ts, &now_iso) {
            changed = true;
        }
        Ok((now_iso, changed))
    })?;

    info!("heartbeat from {} at {}", req.node_id, observed_at);

    Ok(StorageHeartbeatResp {
        status: "alive",
        node_id: req.node_id,
        observed_at,
    })
}
