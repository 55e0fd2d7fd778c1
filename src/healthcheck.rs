//! Optional synchronous `/health` probe against storage nodes.
//!
//! This is layered on top of the membership tracker, not a replacement for
//! it: a node that fails this probe is excluded from the alive set used for
//! *this one* placement decision, but its persisted heartbeat status is
//! untouched. Only a heartbeat timeout demotes a node for real.

use std::time::Duration;

use hyper::client::{Client, HttpConnector};
use hyper::Uri;
use log::warn;

#[derive(Clone)]
pub struct HealthChecker {
    client: Client<HttpConnector>,
    port: u16,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(port: u16, timeout: Duration) -> Self {
        HealthChecker {
            client: Client::new(),
            port,
            timeout,
        }
    }

    /// Filter `candidates` down to those that answered `GET /health` with a
    /// 200 within the configured timeout. Network errors, timeouts, and
    /// non-200 responses all drop the node from the result.
    pub async fn filter_alive(&self, candidates: &[String]) -> Vec<String> {
        let mut alive = Vec::with_capacity(candidates.len());
        for node_id in candidates {
            if self.probe(node_id).await {
                alive.push(node_id.clone());
            }
        }
        alive
    }

    async fn probe(&self, node_id: &str) -> bool {
        let uri: Uri = match format!("http://{}:{}/health", node_id, self.port).parse() {
            Ok(uri) => uri,
            Err(err) => {
                warn!("invalid health-check uri for node {}: {}", node_id, err);
                return false;
            }
        };

        match tokio::time::timeout(self.timeout, self.client.get(uri)).await {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(err)) => {
                warn!("health check for node {} failed: {}", node_id, err);
                false
            }
            Err(_) => {
                warn!("health check for node {} timed out", node_id);
                false
            }
        }
    }
}
