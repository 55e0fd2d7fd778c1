//! Node-liveness state machine.
//!
//! Liveness is soft state, reconverged by [`sweep`] at the start of every
//! request handler rather than by a background timer: placement is the only
//! consumer of the alive set, and it always sweeps immediately before
//! reading it, so a dedicated timer thread would add complexity without
//! making any decision more correct.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Alive,
    /// Reserved: never produced by this core's transitions. Preserved when
    /// read from legacy data and treated as "not alive" for placement.
    Suspected,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipEntry {
    pub status: NodeStatus,
    pub last_heartbeat_ts: f64,
    pub last_heartbeat_at: String,
}

/// Current wall-clock time, in both forms the catalog stores.
pub fn now() -> (f64, String) {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    (ts, timestamp_to_iso(ts))
}

pub fn timestamp_to_iso(ts: f64) -> String {
    let secs = ts.trunc() as i64;
    let nanos = ((ts.fract()) * 1_000_000_000.0).round() as u32;
    Utc.timestamp(secs, nanos)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_entry(now_ts: f64, now_iso: &str, status: NodeStatus) -> MembershipEntry {
    MembershipEntry {
        status,
        last_heartbeat_ts: now_ts,
        last_heartbeat_at: now_iso.to_string(),
    }
}

fn normalize_status(raw: &str) -> NodeStatus {
    match raw.trim().to_lowercase().as_str() {
        "alive" => NodeStatus::Alive,
        "suspected" => NodeStatus::Suspected,
        "dead" => NodeStatus::Dead,
        // unrecognized values are treated as dead rather than guessed alive
        _ => NodeStatus::Dead,
    }
}

/// Coerce a raw JSON membership value (bare status string, legacy form, or
/// a structured object) into [`MembershipEntry`].
pub fn coerce_entry(raw: &serde_json::Value, now_ts: f64, now_iso: &str) -> MembershipEntry {
    match raw {
        serde_json::Value::String(status) => new_entry(now_ts, now_iso, normalize_status(status)),
        serde_json::Value::Object(map) => {
            let status = map
                .get("status")
                .and_then(|v| v.as_str())
                .map(normalize_status)
                .unwrap_or(NodeStatus::Alive);
            let hb_ts = map
                .get("last_heartbeat_ts")
                .and_then(|v| v.as_f64())
                .unwrap_or(now_ts);
            let hb_at = map
                .get("last_heartbeat_at")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| timestamp_to_iso(hb_ts));
            MembershipEntry {
                status,
                last_heartbeat_ts: hb_ts,
                last_heartbeat_at: hb_at,
            }
        }
        _ => new_entry(now_ts, now_iso, NodeStatus::Alive),
    }
}

/// Materialize a membership entry for every configured node that doesn't
/// have one yet. Returns whether anything changed.
pub fn ensure_schema(state: &mut State, cfg_nodes: &[String], now_ts: f64, now_iso: &str) -> bool {
    let mut changed = false;
    for node_id in cfg_nodes {
        if !state.membership.contains_key(node_id) {
            state
                .membership
                .insert(node_id.clone(), new_entry(now_ts, now_iso, NodeStatus::Alive));
            changed = true;
        }
    }
    changed
}

/// Demote any configured node whose last heartbeat is older than `timeout`.
/// Implies [`ensure_schema`]. Returns whether anything changed.
pub fn sweep(
    state: &mut State,
    cfg_nodes: &[String],
    timeout: Duration,
    now_ts: f64,
    now_iso: &str,
) -> bool {
    let mut changed = ensure_schema(state, cfg_nodes, now_ts, now_iso);

    let timeout_secs = timeout.as_secs_f64();
    for node_id in cfg_nodes {
        if let Some(entry) = state.membership.get_mut(node_id) {
            let elapsed = now_ts - entry.last_heartbeat_ts;
            if matches!(entry.status, NodeStatus::Alive | NodeStatus::Suspected)
                && elapsed > timeout_secs
            {
                entry.status = NodeStatus::Dead;
                changed = true;
            }
        }
    }

    changed
}

/// Mark `node_id` alive with a fresh heartbeat stamp. Returns whether
/// anything changed (i.e. this isn't a no-op re-heartbeat within the same
/// instant).
pub fn mark_heartbeat(state: &mut State, node_id: &str, now_ts: f64, now_iso: &str) -> bool {
    let new = new_entry(now_ts, now_iso, NodeStatus::Alive);
    let changed = state.membership.get(node_id) != Some(&new);
    state.membership.insert(node_id.to_string(), new);
    changed
}

/// Configured nodes currently alive, in `cfg_nodes` order.
pub fn alive_set(state: &State, cfg_nodes: &[String]) -> Vec<String> {
    cfg_nodes
        .iter()
        .filter(|node_id| {
            state
                .membership
                .get(*node_id)
                .map(|e| e.status == NodeStatus::Alive)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MembershipSummary {
    pub alive: usize,
    pub suspected: usize,
    pub dead: usize,
    pub total: usize,
}

pub fn summarize(state: &State) -> MembershipSummary {
    let mut summary = MembershipSummary::default();
    for entry in state.membership.values() {
        match entry.status {
            NodeStatus::Alive => summary.alive += 1,
            NodeStatus::Suspected => summary.suspected += 1,
            NodeStatus::Dead => summary.dead += 1,
        }
        summary.total += 1;
    }
    summary
}
