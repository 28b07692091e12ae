//! Adapter contract and shared context

use super::status::StatusHandle;
use crate::config::{AdapterCategory, AdapterConfig, StealthSettings};
use crate::error::ScrapeError;
use crate::network::{HttpClient, RetryPolicy};
use crate::proxy::ProxyRotator;
use crate::results::JobRecord;
use crate::stealth::SessionManager;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Parameters for one adapter search
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// Search keyword
    pub keyword: String,
    /// Location string, often empty or "Remote"
    pub location: String,
    /// Upper bound on records this adapter should return
    pub limit: usize,
    /// Country tag for proxy selection, derived from the location
    pub geography: Option<String>,
    /// Hard deadline for the whole unit; retries must not outlive it
    pub deadline: Option<Instant>,
}

impl FetchParams {
    pub fn new(keyword: impl Into<String>, location: impl Into<String>, limit: usize) -> Self {
        Self {
            keyword: keyword.into(),
            location: location.into(),
            limit,
            geography: None,
            deadline: None,
        }
    }

    pub fn with_geography(mut self, geography: impl Into<String>) -> Self {
        self.geography = Some(geography.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Shared services handed to adapters at construction
#[derive(Clone)]
pub struct AdapterContext {
    /// Direct (proxyless) HTTP client
    pub http: HttpClient,
    /// Proxy rotation service
    pub proxies: Arc<ProxyRotator>,
    /// Session persistence for browser-automated adapters
    pub sessions: Arc<SessionManager>,
    /// Stealth pacing configuration
    pub stealth: StealthSettings,
    /// Shared bounded-retry policy
    pub retry: RetryPolicy,
}

/// Contract every job source adapter implements.
///
/// `search` must not fail for ordinary scraping trouble: it returns an
/// empty list and records the failure on its own status handle. Only
/// `initialize` may surface an error, and only the configuration class.
#[async_trait]
pub trait JobAdapter: Send + Sync {
    /// Unique adapter name
    fn name(&self) -> &str;

    /// How this adapter reaches its source
    fn category(&self) -> AdapterCategory;

    /// The adapter's own status handle
    fn status(&self) -> &StatusHandle;

    /// Acquire adapter-specific resources. Misconfiguration is reported
    /// here and keeps the adapter out of the registry.
    async fn initialize(&self) -> Result<(), ScrapeError> {
        Ok(())
    }

    /// Run one search. Infallible by contract; failures land in status.
    async fn search(&self, params: &FetchParams) -> Vec<JobRecord>;

    /// Release resources. Runs once whether the last search succeeded
    /// or not; must tolerate repeated calls.
    async fn shutdown(&self) {}
}

/// Immutable adapter facts captured at registration
#[derive(Debug, Clone, Serialize)]
pub struct AdapterDescriptor {
    pub name: String,
    pub category: AdapterCategory,
    /// Dispatch and ranking order; lower first
    pub priority: u32,
    pub enabled: bool,
    /// Per-adapter timeout override (seconds)
    pub timeout: Option<f64>,
}

impl AdapterDescriptor {
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            name: config.name.clone(),
            category: config.category,
            priority: config.priority,
            enabled: !config.disabled,
            timeout: config.timeout,
        }
    }

    /// Effective timeout given the per-category default
    pub fn effective_timeout(&self, category_default: f64) -> Duration {
        Duration::from_secs_f64(self.timeout.unwrap_or(category_default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_config() {
        let config = AdapterConfig {
            name: "remoteok".to_string(),
            adapter: "remoteok".to_string(),
            category: AdapterCategory::Api,
            priority: 2,
            disabled: true,
            timeout: Some(7.5),
            ..Default::default()
        };

        let descriptor = AdapterDescriptor::from_config(&config);
        assert_eq!(descriptor.name, "remoteok");
        assert!(!descriptor.enabled);
        assert_eq!(
            descriptor.effective_timeout(10.0),
            Duration::from_secs_f64(7.5)
        );
    }

    #[test]
    fn test_effective_timeout_falls_back_to_category_default() {
        let descriptor = AdapterDescriptor {
            name: "x".to_string(),
            category: AdapterCategory::Browser,
            priority: 1,
            enabled: true,
            timeout: None,
        };
        assert_eq!(descriptor.effective_timeout(30.0), Duration::from_secs(30));
    }
}
