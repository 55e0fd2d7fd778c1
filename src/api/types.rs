//! Wire-format request/response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::catalog::membership::MembershipSummary;

#[derive(Debug, Deserialize)]
pub struct ChunkCheckReq {
    pub fingerprint: String,
}

#[derive(Debug, Serialize)]
pub struct ChunkCheckResp {
    pub exists: bool,
    pub locations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkRegisterReq {
    pub fingerprint: String,
}

#[derive(Debug, Serialize)]
pub struct ChunkRegisterResp {
    /// Canonical field name.
    pub assigned_nodes: Vec<String>,
    /// Compatibility alias carrying the same list.
    pub assigned_node: Vec<String>,
}

impl ChunkRegisterResp {
    pub fn new(assigned: Vec<String>) -> Self {
        ChunkRegisterResp {
            assigned_node: assigned.clone(),
            assigned_nodes: assigned,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FileCommitReq {
    pub file_name: String,
    pub chunks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileCommitResp {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FileGetItem {
    pub fingerprint: String,
    pub locations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileGetResp {
    pub chunks: Vec<FileGetItem>,
}

#[derive(Debug, Deserialize)]
pub struct StorageHeartbeatReq {
    pub node_id: String,
}

#[derive(Debug, Serialize)]
pub struct StorageHeartbeatResp {
    pub status: &'static str,
    pub node_id: String,
    pub observed_at: String,
}

#[derive(Debug, Serialize)]
pub struct DebugLeaderResp {
    pub leader: String,
}

#[derive(Debug, Serialize)]
pub struct DebugMembershipResp {
    pub membership: std::collections::HashMap<String, crate::catalog::MembershipEntry>,
    pub summary: MembershipSummary,
}

#[derive(Debug, Serialize)]
pub struct HealthResp {
    pub role: &'static str,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResp {
    pub detail: String,
}
