//! Replica selection and repair.
//!
//! These two functions never touch storage-node data; they only decide
//! which nodes the catalog should *believe* hold a chunk's replicas. Moving
//! the actual bytes is the client's job, using whatever set the meta
//! service hands back.

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::error::ApiError;

/// Choose `k` distinct nodes from `alive` uniformly at random.
///
/// Randomness (rather than e.g. round-robin) spreads load across
/// concurrent registrations and keeps a network partition from
/// systematically starving the same subset of nodes.
pub fn choose_replicas(alive: &[String], k: usize) -> Result<Vec<String>, ApiError> {
    if k == 0 {
        return Ok(Vec::new());
    }
    if alive.len() < k {
        return Err(ApiError::Insufficient);
    }
    let mut pool: Vec<String> = alive.to_vec();
    pool.shuffle(&mut thread_rng());
    pool.truncate(k);
    Ok(pool)
}

/// Bring `current`'s replica set up to `k` alive members, preserving as many
/// currently-alive assignments as possible and never moving data.
///
/// 1. `kept` = `current` deduplicated, intersected with `alive`, in the
///    order `current` already had them.
/// 2. If `kept` already has `k` or more, truncate to `k`.
/// 3. Otherwise sample the remainder uniformly from `alive \ kept`.
/// 4. If too few candidates remain, fail with [`ApiError::Insufficient`].
pub fn repair(current: &[String], alive: &[String], k: usize) -> Result<Vec<String>, ApiError> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut kept: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for node in current {
        if seen.insert(node.clone()) && alive.contains(node) {
            kept.push(node.clone());
        }
    }

    if kept.len() >= k {
        kept.truncate(k);
        return Ok(kept);
    }

    let needed = k - kept.len();
    let kept_set: std::collections::HashSet<&String> = kept.iter().collect();
    let mut candidates: Vec<String> = alive
        .iter()
        .filter(|node| !kept_set.contains(node))
        .cloned()
        .collect();

    if candidates.len() < needed {
        return Err(ApiError::Insufficient);
    }

    candidates.shuffle(&mut thread_rng());
    candidates.truncate(needed);
    kept.extend(candidates);
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn choose_replicas_fails_when_not_enough_alive() {
        let err = choose_replicas(&v(&["s1"]), 2).unwrap_err();
        assert!(matches!(err, ApiError::Insufficient));
    }

    #[test]
    fn choose_replicas_zero_is_empty_without_requiring_alive_nodes() {
        assert_eq!(choose_replicas(&[], 0).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn choose_replicas_returns_k_distinct_nodes() {
        let alive = v(&["s1", "s2", "s3"]);
        let chosen = choose_replicas(&alive, 2).unwrap();
        assert_eq!(chosen.len(), 2);
        let unique: std::collections::HashSet<_> = chosen.iter().collect();
        assert_eq!(unique.len(), 2);
        for node in &chosen {
            assert!(alive.contains(node));
        }
    }

    #[test]
    fn repair_keeps_alive_members_and_drops_dead_ones() {
        let current = v(&["s_dead", "s1"]);
        let alive = v(&["s1", "s2"]);
        let repaired = repair(&current, &alive, 2).unwrap();
        assert_eq!(repaired.len(), 2);
        assert!(repaired.contains(&"s1".to_string()));
        assert!(!repaired.contains(&"s_dead".to_string()));
        assert!(repaired.contains(&"s2".to_string()));
    }

    #[test]
    fn repair_truncates_when_already_replicated_enough() {
        let current = v(&["s1", "s2", "s3"]);
        let alive = v(&["s1", "s2", "s3"]);
        let repaired = repair(&current, &alive, 2).unwrap();
        assert_eq!(repaired, v(&["s1", "s2"]));
    }

    #[test]
    fn repair_fails_when_not_enough_alive_candidates() {
        let current = v(&["s_dead"]);
        let alive = v(&["s1"]);
        let err = repair(&current, &alive, 2).unwrap_err();
        assert!(matches!(err, ApiError::Insufficient));
    }

    #[test]
    fn repair_is_idempotent() {
        let current = v(&["s1", "s2", "s3"]);
        let alive = v(&["s1", "s2", "s3", "s4"]);
        let once = repair(&current, &alive, 2).unwrap();
        let twice = repair(&once, &alive, 2).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn repair_dedupes_current() {
        let current = v(&["s1", "s1", "s2"]);
        let alive = v(&["s1", "s2"]);
        let repaired = repair(&current, &alive, 2).unwrap();
        assert_eq!(repaired, v(&["s1", "s2"]));
    }
}
