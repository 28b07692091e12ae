//! Proxy pool with rotation, quarantine, and health re-checks

use super::endpoint::{ProxyEndpoint, ProxyEndpointStatus};
use super::strategy::{select, RotationStrategy};
use crate::config::{OutgoingSettings, ProxySettings};
use crate::network::HttpClient;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Selection failures surfaced to adapters
#[derive(Debug, Error)]
pub enum ProxyPoolError {
    /// No active endpoint qualifies. Adapters treat this as transient:
    /// record, back off, retry later. Never raise past the adapter.
    #[error("proxy pool exhausted")]
    Exhausted,
}

/// Health probe seam, so tests can stub the network away
#[async_trait]
pub trait ProxyProber: Send + Sync {
    /// Returns true when the endpoint responds through the proxy
    async fn probe(&self, endpoint: &ProxyEndpoint) -> bool;
}

/// Production prober: a short GET through the endpoint
pub struct HttpProber {
    probe_url: String,
    outgoing: OutgoingSettings,
}

impl HttpProber {
    pub fn new(probe_url: impl Into<String>, outgoing: OutgoingSettings) -> Self {
        Self {
            probe_url: probe_url.into(),
            outgoing,
        }
    }
}

#[async_trait]
impl ProxyProber for HttpProber {
    async fn probe(&self, endpoint: &ProxyEndpoint) -> bool {
        let client = match HttpClient::with_proxy(&self.outgoing, endpoint.config()) {
            Ok(client) => client,
            Err(_) => return false,
        };

        match client.get(&self.probe_url).await {
            Ok(response) => response.is_success(),
            Err(err) => {
                debug!("health probe failed for {}: {}", endpoint.url(), err);
                false
            }
        }
    }
}

/// Rotating pool of proxy endpoints
pub struct ProxyRotator {
    endpoints: RwLock<Vec<Arc<ProxyEndpoint>>>,
    cursor: AtomicUsize,
    settings: ProxySettings,
    outgoing: OutgoingSettings,
    /// One configured reqwest client per endpoint, built lazily
    clients: Cache<String, HttpClient>,
}

impl ProxyRotator {
    pub fn new(settings: ProxySettings, outgoing: OutgoingSettings) -> Self {
        let endpoints = settings
            .endpoints
            .iter()
            .cloned()
            .map(|config| Arc::new(ProxyEndpoint::new(config)))
            .collect();

        Self {
            endpoints: RwLock::new(endpoints),
            cursor: AtomicUsize::new(0),
            settings,
            outgoing,
            clients: Cache::builder()
                .time_to_idle(Duration::from_secs(600))
                .max_capacity(64)
                .build(),
        }
    }

    /// Add an endpoint discovered at runtime
    pub fn add_endpoint(&self, endpoint: Arc<ProxyEndpoint>) {
        self.endpoints.write().unwrap().push(endpoint);
    }

    /// Number of configured endpoints
    pub fn len(&self) -> usize {
        self.endpoints.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.read().unwrap().is_empty()
    }

    /// Number of endpoints currently in the active pool
    pub fn active_count(&self) -> usize {
        self.endpoints
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.is_active())
            .count()
    }

    /// Pick the next endpoint for the configured strategy
    pub fn next(&self, geography: Option<&str>) -> Result<Arc<ProxyEndpoint>, ProxyPoolError> {
        self.next_with(self.settings.strategy, geography)
    }

    /// Pick the next endpoint for an explicit strategy and geography
    pub fn next_with(
        &self,
        strategy: RotationStrategy,
        geography: Option<&str>,
    ) -> Result<Arc<ProxyEndpoint>, ProxyPoolError> {
        let endpoints = self.endpoints.read().unwrap();
        let active: Vec<Arc<ProxyEndpoint>> = endpoints
            .iter()
            .filter(|e| e.is_active())
            .cloned()
            .collect();
        drop(endpoints);

        if active.is_empty() {
            return Err(ProxyPoolError::Exhausted);
        }

        let candidates = if strategy == RotationStrategy::Geographic {
            let target = geography.unwrap_or(&self.settings.default_geography);
            let tagged: Vec<Arc<ProxyEndpoint>> = active
                .iter()
                .filter(|e| e.country() == target)
                .cloned()
                .collect();
            if tagged.is_empty() {
                debug!("no active endpoint tagged '{}', using whole pool", target);
                active
            } else {
                tagged
            }
        } else {
            active
        };

        select(strategy, &candidates, &self.cursor).ok_or(ProxyPoolError::Exhausted)
    }

    /// Record a successful use
    pub fn mark_succeeded(&self, endpoint: &ProxyEndpoint, latency: Duration) {
        endpoint.record_success(latency);
    }

    /// Record a failed use; quarantines past the failure threshold
    pub fn mark_failed(&self, endpoint: &ProxyEndpoint, error: &str) {
        let failures = endpoint.record_failure();
        debug!(
            "proxy {} failed ({} consecutive): {}",
            endpoint.url(),
            failures,
            error
        );

        if failures >= self.settings.failure_threshold {
            warn!(
                "quarantining proxy {} for {}s",
                endpoint.url(),
                self.settings.recheck_after_secs
            );
            endpoint.quarantine(Duration::from_secs(self.settings.recheck_after_secs));
        }
    }

    /// Probe quarantined endpoints past their re-check deadline and re-admit
    /// the ones that answer. Returns how many came back.
    pub async fn run_health_checks(&self, prober: &dyn ProxyProber) -> usize {
        let due: Vec<Arc<ProxyEndpoint>> = self
            .endpoints
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.recheck_due())
            .cloned()
            .collect();

        let mut readmitted = 0;
        for endpoint in due {
            if prober.probe(&endpoint).await {
                info!("proxy {} healthy again, re-admitting", endpoint.url());
                endpoint.readmit();
                readmitted += 1;
            } else {
                endpoint.quarantine(Duration::from_secs(self.settings.recheck_after_secs));
            }
        }
        readmitted
    }

    /// Get (or build) the HTTP client configured for an endpoint
    pub async fn client_for(&self, endpoint: &ProxyEndpoint) -> anyhow::Result<HttpClient> {
        let outgoing = self.outgoing.clone();
        let config = endpoint.config().clone();
        self.clients
            .try_get_with(endpoint.url().to_string(), async move {
                HttpClient::with_proxy(&outgoing, &config)
            })
            .await
            .map_err(|e| anyhow::anyhow!("failed to build proxy client: {}", e))
    }

    /// Snapshots of every endpoint for monitoring
    pub fn statuses(&self) -> Vec<ProxyEndpointStatus> {
        self.endpoints
            .read()
            .unwrap()
            .iter()
            .map(|e| e.snapshot())
            .collect()
    }
}
