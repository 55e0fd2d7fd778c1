use log::info;

use crate::api::types::{ChunkCheckReq, ChunkCheckResp, ChunkRegisterReq, ChunkRegisterResp};
use crate::api::AppState;
use crate::catalog::{ChunkRecord, State};
use crate::error::ApiError;
use crate::placement;

fn validate_fingerprint(fingerprint: &str) -> Result<(), ApiError> {
    if fingerprint.is_empty() {
        return Err(ApiError::Validation("fingerprint must not be empty".to_string()));
    }
    Ok(())
}

/// `POST /chunk/check` — pure read, no persistence.
///
/// `exists` requires both that the chunk is recorded at all and that its
/// replica set has at least `R` members currently alive; otherwise a client
/// would dedupe against a fingerprint it never registered, or against data
/// it can no longer fetch.
pub async fn chunk_check(state: &AppState, req: ChunkCheckReq) -> Result<ChunkCheckResp, ApiError> {
    validate_fingerprint(&req.fingerprint)?;

    let alive = state.effective_alive_nodes().await?;
    let alive_set: std::collections::HashSet<&String> = alive.iter().collect();

    state.store.with_read(|catalog: &State| {
        let record = catalog.chunks.get(&req.fingerprint);
        let locations = record
            .map(|record| {
                record
                    .replicas
                    .iter()
                    .filter(|node| alive_set.contains(node))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        // A chunk that was never registered doesn't exist regardless of R,
        // even when R is 0 and an empty location list would otherwise pass.
        let exists = record.is_some() && locations.len() >= state.config.replication_factor;
        Ok(ChunkCheckResp { exists, locations })
    })
}

/// `POST /chunk/register` — idempotent in the steady state.
pub async fn chunk_register(
    state: &AppState,
    req: ChunkRegisterReq,
) -> Result<ChunkRegisterResp, ApiError> {
    validate_fingerprint(&req.fingerprint)?;

    let alive = state.effective_alive_nodes().await?;
    let r = state.config.replication_factor;

    let assigned = state.store.with_write(|catalog: &mut State| {
        match catalog.chunks.get(&req.fingerprint) {
            None => {
                let assigned = placement::choose_replicas(&alive, r)?;
                catalog.chunks.insert(
                    req.fingerprint.clone(),
                    ChunkRecord {
                        replicas: assigned.clone(),
                    },
                );
                Ok((assigned, true))
            }
            Some(record) => {
                let repaired = placement::repair(&record.replicas, &alive, r)?;
                let changed = repaired != record.replicas;
                if changed {
                    catalog
                        .chunks
                        .insert(req.fingerprint.clone(), ChunkRecord { replicas: repaired.clone() });
                }
                Ok((repaired, changed))
            }
        }
    })?;

    info!("chunk {} assigned to {:?}", req.fingerprint, assigned);
    Ok(ChunkRegisterResp::new(assigned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::CatalogStore;
    use crate::config::Config;
    use std::sync::Arc;

    fn test_state(nodes: &[&str], r: usize) -> AppState {
        let path = std::env::temp_dir().join(format!(
            "dfs-meta-chunk-test-{}-{}",
            std::process::id(),
            rand::random::<u64>()
        ));
        let _ = std::fs::remove_file(&path);
        let store = CatalogStore::load(path).unwrap();
        let config = Config {
            node_id: "meta-01".to_string(),
            role: "leader".to_string(),
            replication_factor: r,
            storage_nodes: nodes.iter().map(|s| s.to_string()).collect(),
            data_dir: std::env::temp_dir(),
            metadata_file: std::env::temp_dir().join("unused.json"),
            heartbeat_timeout: std::time::Duration::from_secs(9),
            enable_storage_healthcheck: false,
            storage_port: 9009,
            storage_healthcheck_timeout: std::time::Duration::from_millis(200),
            bind_addr: "127.0.0.1:0".to_string(),
        };
        AppState {
            config: Arc::new(config),
            store: Arc::new(store),
            health_checker: None,
        }
    }

    #[tokio::test]
    async fn register_then_check_reports_exists() {
        let state = test_state(&["s1"], 1);
        let assigned = chunk_register(
            &state,
            ChunkRegisterReq { fingerprint: "fp1".to_string() },
        )
        .await
        .unwrap();
        assert_eq!(assigned.assigned_nodes, vec!["s1".to_string()]);
        assert_eq!(assigned.assigned_node, assigned.assigned_nodes);

        let check = chunk_check(&state, ChunkCheckReq { fingerprint: "fp1".to_string() })
            .await
            .unwrap();
        assert!(check.exists);
        assert_eq!(check.locations, vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn check_unknown_fingerprint_does_not_exist() {
        let state = test_state(&["s1"], 1);
        let check = chunk_check(&state, ChunkCheckReq { fingerprint: "nope".to_string() })
            .await
            .unwrap();
        assert!(!check.exists);
        assert!(check.locations.is_empty());
    }

    #[tokio::test]
    async fn check_unknown_fingerprint_does_not_exist_even_with_zero_replication_factor() {
        // With R=0, an empty `locations` list would otherwise satisfy
        // `locations.len() >= R` for a chunk that was never registered.
        let state = test_state(&["s1"], 0);
        let check = chunk_check(&state, ChunkCheckReq { fingerprint: "nope".to_string() })
            .await
            .unwrap();
        assert!(!check.exists);
        assert!(check.locations.is_empty());
    }

    #[tokio::test]
    async fn register_rejects_empty_fingerprint() {
        let state = test_state(&["s1"], 1);
        let err = chunk_register(&state, ChunkRegisterReq { fingerprint: String::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn register_fails_when_insufficient_alive_nodes() {
        let state = test_state(&["s1"], 2);
        let err = chunk_register(&state, ChunkRegisterReq { fingerprint: "fp".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Insufficient));
    }

    #[tokio::test]
    async fn register_is_idempotent_in_steady_state() {
        let state = test_state(&["s1", "s2", "s3"], 2);
        let first = chunk_register(&state, ChunkRegisterReq { fingerprint: "fp".to_string() })
            .await
            .unwrap();
        let second = chunk_register(&state, ChunkRegisterReq { fingerprint: "fp".to_string() })
            .await
            .unwrap();
        assert_eq!(first.assigned_nodes, second.assigned_nodes);
    }

    #[tokio::test]
    async fn register_zero_replication_factor_succeeds_empty() {
        let state = test_state(&["s1"], 0);
        let assigned = chunk_register(&state, ChunkRegisterReq { fingerprint: "fp".to_string() })
            .await
            .unwrap();
        assert!(assigned.assigned_nodes.is_empty());
    }
}
