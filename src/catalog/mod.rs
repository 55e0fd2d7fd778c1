//! The catalog: files, chunks, and membership, as one durable document.
//!
//! [`State`] is the in-memory, always-normalized shape. The on-disk layout
//! (see [`store`]) may contain legacy membership entries (bare strings
//! instead of objects); those are coerced into [`MembershipEntry`] at load
//! time by [`membership::ensure_schema`] and never seen again downstream.

pub mod membership;
pub mod store;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use membership::{MembershipEntry, NodeStatus};

/// One file: an ordered, possibly-repeating sequence of chunk fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileRecord {
    pub chunks: Vec<String>,
}

/// One chunk: the ordered, duplicate-free set of nodes believed to hold it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChunkRecord {
    pub replicas: Vec<String>,
}

/// The catalog document.
#[derive(Debug, Clone, Serialize)]
pub struct State {
    pub version: u32,
    pub files: HashMap<String, FileRecord>,
    pub chunks: HashMap<String, ChunkRecord>,
    pub membership: HashMap<String, MembershipEntry>,
}

impl Default for State {
    fn default() -> Self {
        State {
            version: 1,
            files: HashMap::new(),
            chunks: HashMap::new(),
            membership: HashMap::new(),
        }
    }
}

/// Raw on-disk shape. `membership` values may be a bare status string
/// (legacy) or a structured entry; both are accepted.
#[derive(Debug, Deserialize)]
struct RawState {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    files: HashMap<String, FileRecord>,
    #[serde(default)]
    chunks: HashMap<String, ChunkRecord>,
    #[serde(default)]
    membership: HashMap<String, serde_json::Value>,
}

fn default_version() -> u32 {
    1
}

impl State {
    /// Parse a catalog document from its on-disk JSON form, coercing any
    /// legacy membership entries to the structured form. `now_ts`/`now_iso`
    /// are used as the heartbeat stamp for entries that carry none.
    pub fn from_json(raw_json: &str, now_ts: f64, now_iso: &str) -> Result<Self, serde_json::Error> {
        let raw: RawState = serde_json::from_str(raw_json)?;

        let membership = raw
            .membership
            .into_iter()
            .map(|(node_id, value)| {
                let entry = membership::coerce_entry(&value, now_ts, now_iso);
                (node_id, entry)
            })
            .collect();

        Ok(State {
            version: raw.version,
            files: raw.files,
            chunks: raw.chunks,
            membership,
        })
    }
}

/// Every fingerprint referenced by any file exists as a chunk key, and every
/// chunk's replica set is duplicate-free. Used by tests; the write paths
/// maintain this by construction so it never needs enforcing at read time.
#[cfg(test)]
pub(crate) fn check_integrity(state: &State) -> Result<(), String> {
    for (name, record) in &state.files {
        for fp in &record.chunks {
            if !state.chunks.contains_key(fp) {
                return Err(format!("file {:?} references unregistered chunk {:?}", name, fp));
            }
        }
    }
    for (fp, record) in &state.chunks {
        let mut seen = std::collections::HashSet::new();
        for node in &record.replicas {
            if !seen.insert(node) {
                return Err(format!("chunk {:?} has duplicate replica {:?}", fp, node));
            }
        }
    }
    Ok(())
}
