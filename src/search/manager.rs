//! Search execution and orchestration
//!
//! Dispatches a request across the selected adapters concurrently, bounded
//! by a worker-pool semaphore and per-adapter timeouts, then merges the
//! survivors into one deterministic result. A failing adapter costs its
//! own records, never the search.

use super::models::{SearchRequest, SearchResult};
use crate::adapters::{AdapterRegistry, FetchParams, RegistryEntry};
use crate::config::{SearchSettings, Settings};
use crate::error::ErrorKind;
use crate::proxy::target_geography;
use crate::results::{AdapterOutcome, OutcomeError, ResultCollector};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Coordinates searching across the registered adapters
pub struct SearchManager {
    registry: Arc<AdapterRegistry>,
    settings: SearchSettings,
    default_geography: String,
    semaphore: Arc<Semaphore>,
}

impl SearchManager {
    /// Create a manager over an explicit registry
    pub fn new(registry: Arc<AdapterRegistry>, settings: &Settings) -> Self {
        Self {
            registry,
            settings: settings.search.clone(),
            default_geography: settings.proxy.default_geography.clone(),
            semaphore: Arc::new(Semaphore::new(settings.search.max_concurrency.max(1))),
        }
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    /// Run one search. Never fails: adapter trouble shows up as smaller
    /// results plus per-adapter diagnostics.
    pub async fn execute_search(&self, request: &SearchRequest) -> SearchResult {
        let started = Instant::now();
        let entries = self.resolve_adapters(request);
        let limit = request.limit.unwrap_or(self.settings.default_limit);
        let geography = target_geography(&request.location, &self.default_geography);
        let collector = ResultCollector::new();

        info!(
            "Executing search '{}' on {} adapters",
            request.keyword,
            entries.len()
        );

        let futures: Vec<_> = entries
            .iter()
            .map(|entry| self.run_adapter(entry, request, limit, &geography, collector.clone()))
            .collect();

        join_all(futures).await;

        let jobs = collector.finalize(request.experience, limit);
        SearchResult {
            jobs,
            outcomes: collector.outcomes(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Resolve the adapter set: explicit allowlist if given, else all
    /// enabled, ordered by (priority, registration). Offline adapters stay
    /// out until re-enabled or probed healthy.
    fn resolve_adapters(&self, request: &SearchRequest) -> Vec<RegistryEntry> {
        let mut entries = match &request.sources {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let entry = self.registry.get(name);
                    if entry.is_none() {
                        warn!("requested adapter {} is not registered", name);
                    }
                    entry
                })
                .collect::<Vec<_>>(),
            None => self.registry.enabled_by_priority(),
        };

        entries.sort_by_key(|e| (e.descriptor.priority, e.order));
        entries.retain(|e| e.status.is_dispatchable());
        entries
    }

    /// One unit of work: a single adapter search bounded by the semaphore
    /// and its timeout. Timing out drops the future (hard cancellation),
    /// discards partial output, and charges the adapter one failure.
    async fn run_adapter(
        &self,
        entry: &RegistryEntry,
        request: &SearchRequest,
        limit: usize,
        geography: &str,
        collector: ResultCollector,
    ) {
        let permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let name = entry.descriptor.name.clone();
        let budget = entry
            .descriptor
            .effective_timeout(self.settings.timeout_for(entry.descriptor.category));
        let params = FetchParams::new(&request.keyword, &request.location, limit)
            .with_geography(geography)
            .with_deadline(tokio::time::Instant::now() + budget);

        debug!("Dispatching adapter {} with timeout {:?}", name, budget);

        let failures_before = entry.status.total_failures();
        let started = Instant::now();

        match timeout(budget, entry.adapter.search(&params)).await {
            Ok(records) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                let snapshot = entry.status.snapshot();
                let error = if snapshot.total_failures > failures_before {
                    snapshot
                        .last_error_kind
                        .zip(snapshot.last_error)
                        .map(|(kind, message)| OutcomeError { kind, message })
                } else {
                    None
                };

                debug!(
                    "Adapter {} returned {} records in {}ms",
                    name,
                    records.len(),
                    duration_ms
                );
                collector.add_outcome(AdapterOutcome {
                    adapter: name,
                    count: records.len(),
                    duration_ms,
                    error,
                });
                collector.add_batch(entry.descriptor.priority, entry.order, records);
            }
            Err(_) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                warn!("Adapter {} timed out after {:?}", name, budget);
                entry.status.record_error(
                    ErrorKind::ResourceExhausted,
                    format!("timeout after {:?}", budget),
                );
                collector.add_outcome(AdapterOutcome::failure(
                    name,
                    duration_ms,
                    ErrorKind::ResourceExhausted,
                    format!("timeout after {:?}", budget),
                ));
            }
        }

        drop(permit);
    }
}
