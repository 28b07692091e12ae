//! Adapter loader for initializing adapters from configuration
//!
//! An explicit factory map: every adapter type is a match arm, so an
//! unknown name fails at composition time, not at dispatch.

use super::registry::AdapterRegistry;
use super::traits::{AdapterContext, AdapterDescriptor, JobAdapter};
use super::{hackernews, indeed, jsonfeed, remoteok};
use crate::config::{AdapterConfig, Settings};
use crate::error::ScrapeError;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing adapters from configuration
pub struct AdapterLoader;

impl AdapterLoader {
    /// Build and initialize every configured adapter into a fresh registry.
    /// Adapters that fail initialization (the configuration error class)
    /// are skipped and never registered.
    pub async fn load(settings: &Settings, ctx: AdapterContext) -> Result<AdapterRegistry> {
        let registry = AdapterRegistry::new();

        for config in &settings.adapters {
            let adapter = match Self::create_adapter(&config.adapter, config, &ctx, settings) {
                Ok(adapter) => adapter,
                Err(e) => {
                    warn!("Failed to create adapter {}: {}", config.name, e);
                    continue;
                }
            };

            if let Err(e) = adapter.initialize().await {
                warn!("Failed to initialize adapter {}: {}", config.name, e);
                continue;
            }

            info!("Loaded adapter: {} ({})", config.name, config.adapter);
            registry.register(adapter, AdapterDescriptor::from_config(config));
        }

        info!("Loaded {} adapters", registry.len());
        Ok(registry)
    }

    /// Create an adapter instance by factory key
    fn create_adapter(
        adapter_type: &str,
        config: &AdapterConfig,
        ctx: &AdapterContext,
        settings: &Settings,
    ) -> Result<Arc<dyn JobAdapter>, ScrapeError> {
        let adapter: Arc<dyn JobAdapter> = match adapter_type {
            "indeed" => Arc::new(indeed::Indeed::new(config, ctx.clone(), &settings.search)),
            "remoteok" => Arc::new(remoteok::RemoteOk::new(config, ctx.clone(), &settings.search)),
            "hackernews" => Arc::new(hackernews::HackerNews::new(
                config,
                ctx.clone(),
                &settings.search,
            )),
            "jsonfeed" => Arc::new(jsonfeed::JsonFeed::new(config, ctx.clone(), &settings.search)),
            _ => {
                return Err(ScrapeError::Configuration(format!(
                    "unknown adapter type: {}",
                    adapter_type
                )));
            }
        };

        Ok(adapter)
    }

    /// Get list of available adapter types
    pub fn available_adapters() -> Vec<&'static str> {
        vec!["indeed", "remoteok", "hackernews", "jsonfeed"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::test_context;
    use crate::config::AdapterCategory;

    #[tokio::test]
    async fn test_load_registers_known_adapters() {
        let mut settings = Settings::default();
        // jsonfeed stays in the default set but has no feed_url, so it is
        // expected to be skipped at initialize
        settings.adapters.iter_mut().for_each(|a| a.disabled = false);

        let registry = AdapterLoader::load(&settings, test_context()).await.unwrap();

        assert!(registry.contains("indeed"));
        assert!(registry.contains("remoteok"));
        assert!(registry.contains("hackernews"));
        assert!(!registry.contains("jsonfeed"));
    }

    #[tokio::test]
    async fn test_unknown_adapter_type_is_skipped() {
        let settings = Settings {
            adapters: vec![AdapterConfig {
                name: "mystery".to_string(),
                adapter: "mystery".to_string(),
                category: AdapterCategory::Api,
                ..Default::default()
            }],
            ..Default::default()
        };

        let registry = AdapterLoader::load(&settings, test_context()).await.unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_available_adapters() {
        assert!(AdapterLoader::available_adapters().contains(&"remoteok"));
    }
}
