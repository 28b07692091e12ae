//! Settings structures for jobhound configuration

use crate::proxy::RotationStrategy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main settings structure matching jobhound's settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub adapters: Vec<AdapterConfig>,
    pub proxy: ProxySettings,
    pub stealth: StealthSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            adapters: default_adapters(),
            proxy: ProxySettings::default(),
            stealth: StealthSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (JOBHOUND_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("JOBHOUND_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("JOBHOUND_MAX_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                self.search.max_concurrency = n;
            }
        }
        if let Ok(val) = std::env::var("JOBHOUND_PROXY_STRATEGY") {
            if let Ok(strategy) = serde_yaml::from_str(&val) {
                self.proxy.strategy = strategy;
            }
        }
        if let Ok(val) = std::env::var("JOBHOUND_DEFAULT_GEOGRAPHY") {
            self.proxy.default_geography = val;
        }
    }

    /// Get adapter config by name
    pub fn get_adapter(&self, name: &str) -> Option<&AdapterConfig> {
        self.adapters.iter().find(|a| a.name == name)
    }

    /// Get all enabled adapter configs
    pub fn enabled_adapters(&self) -> Vec<&AdapterConfig> {
        self.adapters.iter().filter(|a| !a.disabled).collect()
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug mode
    pub debug: bool,
    /// Instance name used in log output
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "jobhound".to_string(),
        }
    }
}

/// Search orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of adapters searching at once
    pub max_concurrency: usize,
    /// Result limit applied when a request does not specify one
    pub default_limit: usize,
    /// Timeout for browser-automated adapters (seconds)
    pub browser_timeout: f64,
    /// Timeout for API-based and fallback adapters (seconds)
    pub api_timeout: f64,
    /// Consecutive failures before an adapter is marked Degraded
    pub degraded_after: u32,
    /// Consecutive failures before an adapter is taken Offline
    pub offline_after: u32,
    /// Adapter-internal retry attempts for transient failures
    pub max_retries: u32,
    /// First retry delay; doubles per attempt (milliseconds)
    pub retry_initial_delay_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            default_limit: 25,
            browser_timeout: 30.0,
            api_timeout: 10.0,
            degraded_after: 3,
            offline_after: 6,
            max_retries: 2,
            retry_initial_delay_ms: 1000,
        }
    }
}

impl SearchSettings {
    /// Default timeout for an adapter category (seconds)
    pub fn timeout_for(&self, category: AdapterCategory) -> f64 {
        match category {
            AdapterCategory::Browser => self.browser_timeout,
            AdapterCategory::Api | AdapterCategory::Fallback => self.api_timeout,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Extra headers to send on every request
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            pool_maxsize: 20,
            verify_ssl: true,
            extra_headers: HashMap::new(),
        }
    }
}

/// How an adapter reaches its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterCategory {
    /// Drives full-page fetches through the stealth layer
    Browser,
    /// Talks to a public API
    Api,
    /// Last-resort source consulted when others come up dry
    Fallback,
}

impl AdapterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Api => "api",
            Self::Fallback => "fallback",
        }
    }
}

/// Individual adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Adapter name (unique identifier)
    pub name: String,
    /// Adapter factory key to instantiate
    pub adapter: String,
    /// How this adapter reaches its source
    pub category: AdapterCategory,
    /// Dispatch and tie-break order; lower runs and ranks first
    pub priority: u32,
    /// Whether adapter is disabled
    pub disabled: bool,
    /// Custom timeout for this adapter (seconds)
    pub timeout: Option<f64>,
    /// API key if required
    pub api_key: Option<String>,
    /// Additional adapter-specific settings
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            adapter: String::new(),
            category: AdapterCategory::Api,
            priority: 100,
            disabled: false,
            timeout: None,
            api_key: None,
            extra: HashMap::new(),
        }
    }
}

impl AdapterConfig {
    /// Fetch a string value from the adapter-specific settings
    pub fn extra_str(&self, key: &str) -> Option<String> {
        self.extra
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Proxy rotation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Rotation strategy for selecting the next endpoint
    pub strategy: RotationStrategy,
    /// Geography tag used when a location maps to nothing
    pub default_geography: String,
    /// Consecutive failures before an endpoint is quarantined
    pub failure_threshold: u32,
    /// Seconds a quarantined endpoint waits before a health re-check
    pub recheck_after_secs: u64,
    /// URL fetched through an endpoint to probe its health
    pub probe_url: String,
    /// Configured endpoints
    pub endpoints: Vec<ProxyEndpointConfig>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::RoundRobin,
            default_geography: "us".to_string(),
            failure_threshold: 3,
            recheck_after_secs: 300,
            probe_url: "https://www.example.com/".to_string(),
            endpoints: Vec::new(),
        }
    }
}

/// A single proxy endpoint entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyEndpointConfig {
    /// Proxy URL, e.g. `http://proxy.example.net:8080`
    pub url: String,
    /// Credentials, if the endpoint requires them
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Geography tag (ISO country code)
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "us".to_string()
}

/// Stealth behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthSettings {
    /// Minimum inter-action delay (milliseconds)
    pub min_delay_ms: u64,
    /// Maximum inter-action delay (milliseconds)
    pub max_delay_ms: u64,
    /// Outbound requests per minute per browser adapter
    pub requests_per_minute: u32,
    /// Share of sessions using a curated identity instead of a generated one
    pub curated_identity_ratio: f64,
    /// Directory for persisted sessions (defaults under the user cache dir)
    pub session_dir: Option<PathBuf>,
}

impl Default for StealthSettings {
    fn default() -> Self {
        Self {
            min_delay_ms: 250,
            max_delay_ms: 1800,
            requests_per_minute: 30,
            curated_identity_ratio: 0.7,
            session_dir: None,
        }
    }
}

/// Default adapter configurations
fn default_adapters() -> Vec<AdapterConfig> {
    vec![
        AdapterConfig {
            name: "indeed".to_string(),
            adapter: "indeed".to_string(),
            category: AdapterCategory::Browser,
            priority: 1,
            ..Default::default()
        },
        AdapterConfig {
            name: "remoteok".to_string(),
            adapter: "remoteok".to_string(),
            category: AdapterCategory::Api,
            priority: 2,
            ..Default::default()
        },
        AdapterConfig {
            name: "hackernews".to_string(),
            adapter: "hackernews".to_string(),
            category: AdapterCategory::Api,
            priority: 3,
            ..Default::default()
        },
        AdapterConfig {
            name: "jsonfeed".to_string(),
            adapter: "jsonfeed".to_string(),
            category: AdapterCategory::Fallback,
            priority: 10,
            disabled: true,
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.search.max_concurrency, 8);
        assert_eq!(settings.proxy.failure_threshold, 3);
        assert!(!settings.adapters.is_empty());
    }

    #[test]
    fn test_enabled_adapters_skip_disabled() {
        let settings = Settings::default();
        let enabled = settings.enabled_adapters();
        assert!(enabled.iter().all(|a| !a.disabled));
        assert!(enabled.iter().any(|a| a.name == "remoteok"));
        assert!(!enabled.iter().any(|a| a.name == "jsonfeed"));
    }

    #[test]
    fn test_category_timeouts() {
        let search = SearchSettings::default();
        assert_eq!(search.timeout_for(AdapterCategory::Browser), 30.0);
        assert_eq!(search.timeout_for(AdapterCategory::Api), 10.0);
        assert_eq!(search.timeout_for(AdapterCategory::Fallback), 10.0);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
search:
  max_concurrency: 4
adapters:
  - name: remoteok
    adapter: remoteok
    category: api
    priority: 1
proxy:
  strategy: quality_ranked
  endpoints:
    - url: http://proxy-a.example.net:8080
      country: de
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.search.max_concurrency, 4);
        assert_eq!(settings.adapters.len(), 1);
        assert_eq!(settings.proxy.endpoints[0].country, "de");
        assert_eq!(settings.proxy.strategy, RotationStrategy::QualityRanked);
    }

    #[test]
    fn test_extra_str() {
        let yaml = r#"
name: jsonfeed
adapter: jsonfeed
category: fallback
feed_url: https://jobs.example.net/feed.json
"#;
        let config: AdapterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.extra_str("feed_url").as_deref(),
            Some("https://jobs.example.net/feed.json")
        );
        assert!(config.extra_str("missing").is_none());
    }
}
