//! Proxy endpoint state and quality scoring

use crate::config::ProxyEndpointConfig;
use serde::Serialize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Latency above this contributes nothing to the quality score
const LATENCY_CEILING_MS: f64 = 5000.0;

/// Rolling statistics for a single endpoint
#[derive(Debug, Clone)]
struct EndpointState {
    consecutive_failures: u32,
    successes: u64,
    failures: u64,
    uptime_checks: u64,
    uptime_ok: u64,
    avg_latency_ms: f64,
    quality: f64,
    quarantined_until: Option<Instant>,
    last_used: Option<Instant>,
}

impl Default for EndpointState {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            successes: 0,
            failures: 0,
            uptime_checks: 0,
            uptime_ok: 0,
            avg_latency_ms: 0.0,
            quality: 1.0,
            quarantined_until: None,
            last_used: None,
        }
    }
}

/// A proxy endpoint with continuously recomputed quality
#[derive(Debug)]
pub struct ProxyEndpoint {
    config: ProxyEndpointConfig,
    state: RwLock<EndpointState>,
}

impl ProxyEndpoint {
    pub fn new(config: ProxyEndpointConfig) -> Self {
        Self {
            config,
            state: RwLock::new(EndpointState::default()),
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn country(&self) -> &str {
        &self.config.country
    }

    pub fn config(&self) -> &ProxyEndpointConfig {
        &self.config
    }

    /// Whether the endpoint is in the active pool
    pub fn is_active(&self) -> bool {
        self.state.read().unwrap().quarantined_until.is_none()
    }

    /// Whether a quarantined endpoint is due its health re-check
    pub fn recheck_due(&self) -> bool {
        match self.state.read().unwrap().quarantined_until {
            Some(until) => Instant::now() >= until,
            None => false,
        }
    }

    /// Current quality score (0-1)
    pub fn quality(&self) -> f64 {
        self.state.read().unwrap().quality
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.read().unwrap().consecutive_failures
    }

    /// Record a successful use; resets the consecutive-failure counter
    pub fn record_success(&self, latency: Duration) {
        let mut state = self.state.write().unwrap();
        let latency_ms = latency.as_secs_f64() * 1000.0;

        state.consecutive_failures = 0;
        state.successes += 1;
        state.uptime_checks += 1;
        state.uptime_ok += 1;
        state.avg_latency_ms = if state.avg_latency_ms == 0.0 {
            latency_ms
        } else {
            // exponentially weighted so recent behavior dominates
            state.avg_latency_ms * 0.8 + latency_ms * 0.2
        };
        state.last_used = Some(Instant::now());
        state.quality = compute_quality(&state);
    }

    /// Record a failed use; returns the new consecutive-failure count
    pub fn record_failure(&self) -> u32 {
        let mut state = self.state.write().unwrap();
        state.consecutive_failures += 1;
        state.failures += 1;
        state.uptime_checks += 1;
        state.last_used = Some(Instant::now());
        state.quality = compute_quality(&state);
        state.consecutive_failures
    }

    /// Remove from the active pool until `recheck_after` has elapsed
    pub fn quarantine(&self, recheck_after: Duration) {
        let mut state = self.state.write().unwrap();
        state.quarantined_until = Some(Instant::now() + recheck_after);
    }

    /// Re-admit after a successful health probe
    pub fn readmit(&self) {
        let mut state = self.state.write().unwrap();
        state.quarantined_until = None;
        state.consecutive_failures = 0;
        state.uptime_checks += 1;
        state.uptime_ok += 1;
        state.quality = compute_quality(&state);
    }

    /// Snapshot for monitoring
    pub fn snapshot(&self) -> ProxyEndpointStatus {
        let state = self.state.read().unwrap();
        ProxyEndpointStatus {
            url: self.config.url.clone(),
            country: self.config.country.clone(),
            active: state.quarantined_until.is_none(),
            quality: state.quality,
            consecutive_failures: state.consecutive_failures,
            successes: state.successes,
            failures: state.failures,
            avg_latency_ms: state.avg_latency_ms,
        }
    }
}

/// `0.4*uptime + 0.3*responseTime + 0.3*successRate`
fn compute_quality(state: &EndpointState) -> f64 {
    let uptime_ratio = if state.uptime_checks == 0 {
        1.0
    } else {
        state.uptime_ok as f64 / state.uptime_checks as f64
    };

    let response_factor = 1.0 - state.avg_latency_ms.min(LATENCY_CEILING_MS) / LATENCY_CEILING_MS;

    let total = state.successes + state.failures;
    let success_ratio = if total == 0 {
        1.0
    } else {
        state.successes as f64 / total as f64
    };

    0.4 * uptime_ratio + 0.3 * response_factor + 0.3 * success_ratio
}

/// Read-only endpoint status for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct ProxyEndpointStatus {
    pub url: String,
    pub country: String,
    pub active: bool,
    pub quality: f64,
    pub consecutive_failures: u32,
    pub successes: u64,
    pub failures: u64,
    pub avg_latency_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(country: &str) -> ProxyEndpoint {
        ProxyEndpoint::new(ProxyEndpointConfig {
            url: "http://proxy.example.net:8080".to_string(),
            username: None,
            password: None,
            country: country.to_string(),
        })
    }

    #[test]
    fn test_fresh_endpoint_is_active_with_full_quality() {
        let ep = endpoint("us");
        assert!(ep.is_active());
        assert!((ep.quality() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let ep = endpoint("us");
        ep.record_failure();
        ep.record_failure();
        assert_eq!(ep.consecutive_failures(), 2);

        ep.record_success(Duration::from_millis(120));
        assert_eq!(ep.consecutive_failures(), 0);
    }

    #[test]
    fn test_failures_drag_quality_down() {
        let ep = endpoint("us");
        let before = ep.quality();
        ep.record_failure();
        ep.record_failure();
        assert!(ep.quality() < before);
    }

    #[test]
    fn test_quarantine_and_readmit() {
        let ep = endpoint("us");
        ep.record_failure();
        ep.quarantine(Duration::from_secs(0));
        assert!(!ep.is_active());
        assert!(ep.recheck_due());

        ep.readmit();
        assert!(ep.is_active());
        assert_eq!(ep.consecutive_failures(), 0);
    }

    #[test]
    fn test_slow_endpoint_scores_below_fast_one() {
        let fast = endpoint("us");
        let slow = endpoint("us");
        fast.record_success(Duration::from_millis(50));
        slow.record_success(Duration::from_millis(4500));
        assert!(fast.quality() > slow.quality());
    }
}
