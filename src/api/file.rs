use std::collections::HashSet;

use log::info;

use crate::api::types::{FileCommitReq, FileCommitResp, FileGetItem, FileGetResp};
use crate::api::AppState;
use crate::catalog::{ChunkRecord, FileRecord, State};
use crate::error::ApiError;
use crate::placement;

/// `POST /file/commit`.
///
/// Every fingerprint in `chunks` must already be registered. Each *distinct*
/// fingerprint is repaired against the current alive set (replicas get
/// refreshed, not just validated) before the file record is written;
/// duplicates within `chunks` are preserved in the stored order.
pub async fn file_commit(state: &AppState, req: FileCommitReq) -> Result<FileCommitResp, ApiError> {
    if req.file_name.is_empty() {
        return Err(ApiError::Validation("file_name must not be empty".to_string()));
    }

    let alive = state.effective_alive_nodes().await?;
    let r = state.config.replication_factor;

    state.store.with_write(|catalog: &mut State| {
        let missing: Vec<String> = req
            .chunks
            .iter()
            .filter(|fp| !catalog.chunks.contains_key(*fp))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::Unregistered(missing));
        }

        if alive.len() < r {
            return Err(ApiError::Insufficient);
        }

        let distinct: HashSet<&String> = req.chunks.iter().collect();
        for fp in distinct {
            let current = catalog.chunks.get(fp).map(|r| r.replicas.clone()).unwrap_or_default();
            let repaired = placement::repair(&current, &alive, r)?;
            catalog.chunks.insert(fp.clone(), ChunkRecord { replicas: repaired });
        }

        catalog.files.insert(
            req.file_name.clone(),
            FileRecord {
                chunks: req.chunks.clone(),
            },
        );

        Ok((FileCommitResp { status: "ok" }, true))
    })
    .map(|resp| {
        info!("file {:?} committed with {} chunks", req.file_name, req.chunks.len());
        resp
    })
}

/// `GET /file/{name}`.
pub async fn file_get(state: &AppState, file_name: &str) -> Result<FileGetResp, ApiError> {
    let alive = state.effective_alive_nodes().await?;
    let alive_set: HashSet<&String> = alive.iter().collect();

    state.store.with_read(|catalog: &State| {
        let record = catalog
            .files
            .get(file_name)
            .ok_or_else(|| ApiError::NotFound(format!("file {:?} not found", file_name)))?;

        let chunks = record
            .chunks
            .iter()
            .map(|fp| {
                let locations = catalog
                    .chunks
                    .get(fp)
                    .map(|record| {
                        record
                            .replicas
                            .iter()
                            .filter(|node| alive_set.contains(node))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                FileGetItem {
                    fingerprint: fp.clone(),
                    locations,
                }
            })
            .collect();

        Ok(FileGetResp { chunks })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::chunk::chunk_register;
    use crate::api::types::ChunkRegisterReq;
    use crate::catalog::store::CatalogStore;
    use crate::config::Config;
    use std::sync::Arc;

    fn test_state(nodes: &[&str], r: usize) -> AppState {
        let path = std::env::temp_dir().join(format!(
            "dfs-meta-file-test-{}-{}",
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
    async fn commit_rejects_unregistered_chunks() {
        let state = test_state(&["s1"], 1);
        let err = file_commit(
            &state,
            FileCommitReq { file_name: "f".to_string(), chunks: vec!["missing".to_string()] },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Unregistered(_)));
    }

    #[tokio::test]
    async fn commit_then_get_round_trips_duplicate_chunks() {
        let state = test_state(&["s1"], 1);
        chunk_register(&state, ChunkRegisterReq { fingerprint: "a".to_string() }).await.unwrap();
        chunk_register(&state, ChunkRegisterReq { fingerprint: "b".to_string() }).await.unwrap();

        file_commit(
            &state,
            FileCommitReq {
                file_name: "f".to_string(),
                chunks: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            },
        )
        .await
        .unwrap();

        let got = file_get(&state, "f").await.unwrap();
        let fps: Vec<&str> = got.chunks.iter().map(|c| c.fingerprint.as_str()).collect();
        assert_eq!(fps, vec!["a", "b", "a"]);
        for item in &got.chunks {
            assert_eq!(item.locations, vec!["s1".to_string()]);
        }

        state
            .store
            .with_read(|catalog| {
                crate::catalog::check_integrity(catalog).expect("catalog integrity");
                Ok(())
            })
            .unwrap();
    }

    #[tokio::test]
    async fn get_unknown_file_is_not_found() {
        let state = test_state(&["s1"], 1);
        let err = file_get(&state, "nope").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn commit_fails_when_insufficient_alive_nodes() {
        let state = test_state(&["s1"], 1);
        chunk_register(&state, ChunkRegisterReq { fingerprint: "a".to_string() })
            .await
            .unwrap();

        // Same catalog, but this handle demands more replicas than there are
        // alive nodes — "a" is already registered, so this exercises the
        // Insufficient path rather than Unregistered.
        let mut stricter_config = (*state.config).clone();
        stricter_config.replication_factor = 2;
        let stricter_state = AppState {
            config: Arc::new(stricter_config),
            store: state.store.clone(),
            health_checker: None,
        };

        let err = file_commit(
            &stricter_state,
            FileCommitReq { file_name: "f".to_string(), chunks: vec!["a".to_string()] },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Insufficient));
    }
}
