//! Durable, serialized access to the catalog document.
//!
//! [`CatalogStore`] owns the one [`State`] value behind a `std::sync::Mutex`
//! guard — a single global lock is acceptable at this scale (see the
//! concurrency notes in the crate root docs). Every write handler runs its
//! whole `load → mutate → persist` window under that lock; every read
//! handler takes the same lock for the duration of its read, so a read can
//! never observe a half-applied mutation.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Error};
use log::info;

use crate::catalog::{membership, State};
use crate::error::ApiError;
use crate::tools;

pub struct CatalogStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl CatalogStore {
    /// Load the catalog from `path`, initializing it if absent. A malformed
    /// document is a fatal error — the process refuses to serve rather than
    /// silently re-initializing over existing data.
    pub fn load(path: PathBuf) -> Result<Self, Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("unable to create data directory {:?}", parent))?;
        }

        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("unable to read {:?}", path))?;
            let (now_ts, now_iso) = membership::now();
            State::from_json(&raw, now_ts, &now_iso)
                .map_err(|err| ApiError::Corruption(format!("{:?}: {}", path, err)))?
        } else {
            info!("initializing new catalog at {:?}", path);
            State::default()
        };

        let store = CatalogStore {
            path,
            state: Mutex::new(state),
        };
        // Persist immediately so a freshly initialized catalog exists on disk
        // even if the process crashes before the first write handler runs.
        store.persist_locked(&store.state.lock().unwrap())?;
        Ok(store)
    }

    fn persist_locked(&self, state: &State) -> Result<(), Error> {
        let serialized = serde_json::to_vec_pretty(state).context("unable to serialize catalog")?;
        tools::atomic_write(&self.path, &serialized)
    }

    /// Run `f` against a mutable view of the catalog under the exclusive
    /// lock, persisting afterward iff `f` reports the state changed.
    pub fn with_write<T>(
        &self,
        f: impl FnOnce(&mut State) -> Result<(T, bool), ApiError>,
    ) -> Result<T, ApiError> {
        let mut guard = self.state.lock().unwrap();
        let (result, changed) = f(&mut guard)?;
        if changed {
            self.persist_locked(&guard)
                .map_err(|err| ApiError::Corruption(err.to_string()))?;
        }
        Ok(result)
    }

    /// Run `f` against a read-only view of the catalog under the same lock
    /// writers use, so a read never interleaves with a partial mutation.
    pub fn with_read<T>(&self, f: impl FnOnce(&State) -> Result<T, ApiError>) -> Result<T, ApiError> {
        let guard = self.state.lock().unwrap();
        f(&guard)
    }
}
