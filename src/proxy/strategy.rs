//! Endpoint selection strategies

use super::endpoint::ProxyEndpoint;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How the rotator picks the next endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Sequential walk over the active pool
    #[default]
    RoundRobin,
    /// Uniform random pick
    Random,
    /// Highest quality score wins
    QualityRanked,
    /// Restrict candidates to the target country tag
    Geographic,
}

/// Pick one endpoint out of the active candidates.
///
/// `cursor` carries round-robin position across calls; geographic filtering
/// happens before this in the pool, so here Geographic degenerates to
/// round-robin over the already-narrowed candidates.
pub(crate) fn select(
    strategy: RotationStrategy,
    candidates: &[Arc<ProxyEndpoint>],
    cursor: &AtomicUsize,
) -> Option<Arc<ProxyEndpoint>> {
    if candidates.is_empty() {
        return None;
    }

    match strategy {
        RotationStrategy::RoundRobin | RotationStrategy::Geographic => {
            let idx = cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
            Some(candidates[idx].clone())
        }
        RotationStrategy::Random => {
            let mut rng = rand::thread_rng();
            candidates.choose(&mut rng).cloned()
        }
        RotationStrategy::QualityRanked => candidates
            .iter()
            .max_by(|a, b| {
                a.quality()
                    .partial_cmp(&b.quality())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyEndpointConfig;
    use std::time::Duration;

    fn endpoints(n: usize) -> Vec<Arc<ProxyEndpoint>> {
        (0..n)
            .map(|i| {
                Arc::new(ProxyEndpoint::new(ProxyEndpointConfig {
                    url: format!("http://proxy-{}.example.net:8080", i),
                    username: None,
                    password: None,
                    country: "us".to_string(),
                }))
            })
            .collect()
    }

    #[test]
    fn test_round_robin_cycles() {
        let pool = endpoints(3);
        let cursor = AtomicUsize::new(0);

        let picks: Vec<String> = (0..6)
            .map(|_| {
                select(RotationStrategy::RoundRobin, &pool, &cursor)
                    .unwrap()
                    .url()
                    .to_string()
            })
            .collect();

        assert_eq!(picks[0], picks[3]);
        assert_eq!(picks[1], picks[4]);
        assert_ne!(picks[0], picks[1]);
    }

    #[test]
    fn test_quality_ranked_prefers_best() {
        let pool = endpoints(2);
        pool[0].record_failure();
        pool[0].record_failure();
        pool[1].record_success(Duration::from_millis(80));

        let cursor = AtomicUsize::new(0);
        let picked = select(RotationStrategy::QualityRanked, &pool, &cursor).unwrap();
        assert_eq!(picked.url(), pool[1].url());
    }

    #[test]
    fn test_empty_pool_yields_none() {
        let cursor = AtomicUsize::new(0);
        assert!(select(RotationStrategy::Random, &[], &cursor).is_none());
    }
}
