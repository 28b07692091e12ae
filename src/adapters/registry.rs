//! Adapter registry
//!
//! The authoritative adapter name -> (descriptor, instance, status) map.
//! An explicit object passed into the manager at construction time; all
//! mutation goes through the interior lock so concurrently running units
//! can touch it safely.

use super::status::{AdapterStatus, StatusHandle};
use super::traits::{AdapterDescriptor, JobAdapter};
use crate::config::AdapterCategory;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// One registered adapter
#[derive(Clone)]
pub struct RegistryEntry {
    pub descriptor: AdapterDescriptor,
    pub adapter: Arc<dyn JobAdapter>,
    pub status: StatusHandle,
    /// Registration index; the tie-break between equal priorities
    pub order: usize,
}

/// Registry of all available adapters
#[derive(Default)]
pub struct AdapterRegistry {
    entries: RwLock<HashMap<String, RegistryEntry>>,
    next_order: AtomicUsize,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its descriptor
    pub fn register(&self, adapter: Arc<dyn JobAdapter>, descriptor: AdapterDescriptor) {
        let name = descriptor.name.clone();
        let status = adapter.status().clone();
        let order = self.next_order.fetch_add(1, Ordering::Relaxed);

        self.entries.write().unwrap().insert(
            name,
            RegistryEntry {
                descriptor,
                adapter,
                status,
                order,
            },
        );
    }

    /// Remove an adapter; returns it so the caller can shut it down
    pub fn unregister(&self, name: &str) -> Option<RegistryEntry> {
        self.entries.write().unwrap().remove(name)
    }

    /// Get an adapter entry by name
    pub fn get(&self, name: &str) -> Option<RegistryEntry> {
        self.entries.read().unwrap().get(name).cloned()
    }

    /// All adapters in a category
    pub fn get_by_category(&self, category: AdapterCategory) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> = self
            .entries
            .read()
            .unwrap()
            .values()
            .filter(|e| e.descriptor.category == category)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.descriptor.priority, e.order));
        entries
    }

    /// Enabled adapters ordered by ascending priority, registration order
    /// breaking ties
    pub fn enabled_by_priority(&self) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> = self
            .entries
            .read()
            .unwrap()
            .values()
            .filter(|e| e.descriptor.enabled)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.descriptor.priority, e.order));
        entries
    }

    /// Flip an adapter's enabled flag. Re-enabling an Offline adapter puts
    /// it on probation rather than straight back to full trust.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(name) {
            Some(entry) => {
                entry.descriptor.enabled = enabled;
                if enabled {
                    entry.status.revive();
                }
                true
            }
            None => false,
        }
    }

    /// Status snapshots for every adapter, sorted by name
    pub fn statuses(&self) -> Vec<AdapterStatus> {
        let mut statuses: Vec<AdapterStatus> = self
            .entries
            .read()
            .unwrap()
            .values()
            .map(|e| e.status.snapshot())
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Adapter counts per lifecycle state
    pub fn aggregate_status(&self) -> HashMap<&'static str, usize> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for entry in self.entries.read().unwrap().values() {
            *counts.entry(entry.status.state().as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Shut down every adapter, releasing adapter-held resources
    pub async fn shutdown_all(&self) {
        let adapters: Vec<Arc<dyn JobAdapter>> = self
            .entries
            .read()
            .unwrap()
            .values()
            .map(|e| e.adapter.clone())
            .collect();
        for adapter in adapters {
            adapter.shutdown().await;
        }
    }

    /// Check if an adapter exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().unwrap().contains_key(name)
    }

    /// All registered adapter names
    pub fn names(&self) -> Vec<String> {
        self.entries.read().unwrap().keys().cloned().collect()
    }

    /// Get number of registered adapters
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FetchParams, LifecycleState};
    use crate::error::ErrorKind;
    use crate::results::JobRecord;
    use async_trait::async_trait;

    struct DummyAdapter {
        name: String,
        category: AdapterCategory,
        status: StatusHandle,
    }

    impl DummyAdapter {
        fn new(name: &str, category: AdapterCategory) -> Self {
            Self {
                name: name.to_string(),
                category,
                status: StatusHandle::new(name, 3, 6),
            }
        }
    }

    #[async_trait]
    impl JobAdapter for DummyAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn category(&self) -> AdapterCategory {
            self.category
        }

        fn status(&self) -> &StatusHandle {
            &self.status
        }

        async fn search(&self, _params: &FetchParams) -> Vec<JobRecord> {
            Vec::new()
        }
    }

    fn descriptor(name: &str, category: AdapterCategory, priority: u32) -> AdapterDescriptor {
        AdapterDescriptor {
            name: name.to_string(),
            category,
            priority,
            enabled: true,
            timeout: None,
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = AdapterRegistry::new();
        registry.register(
            Arc::new(DummyAdapter::new("remoteok", AdapterCategory::Api)),
            descriptor("remoteok", AdapterCategory::Api, 1),
        );

        assert!(registry.contains("remoteok"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("remoteok").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_enabled_by_priority_sorted() {
        let registry = AdapterRegistry::new();
        registry.register(
            Arc::new(DummyAdapter::new("slow", AdapterCategory::Api)),
            descriptor("slow", AdapterCategory::Api, 9),
        );
        registry.register(
            Arc::new(DummyAdapter::new("fast", AdapterCategory::Browser)),
            descriptor("fast", AdapterCategory::Browser, 1),
        );

        let enabled = registry.enabled_by_priority();
        assert_eq!(enabled[0].descriptor.name, "fast");
        assert_eq!(enabled[1].descriptor.name, "slow");
    }

    #[test]
    fn test_set_enabled_excludes_from_listing() {
        let registry = AdapterRegistry::new();
        registry.register(
            Arc::new(DummyAdapter::new("remoteok", AdapterCategory::Api)),
            descriptor("remoteok", AdapterCategory::Api, 1),
        );

        assert!(registry.set_enabled("remoteok", false));
        assert!(registry.enabled_by_priority().is_empty());

        assert!(registry.set_enabled("remoteok", true));
        assert_eq!(registry.enabled_by_priority().len(), 1);
        assert!(!registry.set_enabled("missing", true));
    }

    #[test]
    fn test_reenable_offline_goes_to_probation() {
        let registry = AdapterRegistry::new();
        let adapter = Arc::new(DummyAdapter::new("flaky", AdapterCategory::Api));
        for _ in 0..6 {
            adapter
                .status()
                .record_error(ErrorKind::TransientNetwork, "reset");
        }
        registry.register(adapter, descriptor("flaky", AdapterCategory::Api, 1));

        registry.set_enabled("flaky", true);
        let entry = registry.get("flaky").unwrap();
        assert_eq!(entry.status.state(), LifecycleState::Probation);
    }

    #[test]
    fn test_category_lookup() {
        let registry = AdapterRegistry::new();
        registry.register(
            Arc::new(DummyAdapter::new("indeed", AdapterCategory::Browser)),
            descriptor("indeed", AdapterCategory::Browser, 1),
        );
        registry.register(
            Arc::new(DummyAdapter::new("remoteok", AdapterCategory::Api)),
            descriptor("remoteok", AdapterCategory::Api, 2),
        );

        let browsers = registry.get_by_category(AdapterCategory::Browser);
        assert_eq!(browsers.len(), 1);
        assert_eq!(browsers[0].descriptor.name, "indeed");
    }

    #[test]
    fn test_aggregate_status_counts() {
        let registry = AdapterRegistry::new();
        registry.register(
            Arc::new(DummyAdapter::new("a", AdapterCategory::Api)),
            descriptor("a", AdapterCategory::Api, 1),
        );
        registry.register(
            Arc::new(DummyAdapter::new("b", AdapterCategory::Api)),
            descriptor("b", AdapterCategory::Api, 2),
        );

        let counts = registry.aggregate_status();
        assert_eq!(counts.get("idle"), Some(&2));
    }

    #[test]
    fn test_unregister() {
        let registry = AdapterRegistry::new();
        registry.register(
            Arc::new(DummyAdapter::new("remoteok", AdapterCategory::Api)),
            descriptor("remoteok", AdapterCategory::Api, 1),
        );

        assert!(registry.unregister("remoteok").is_some());
        assert!(registry.is_empty());
    }
}
