//! Search request and result models

use crate::results::{AdapterOutcome, ExperienceLevel, JobRecord};
use serde::{Deserialize, Serialize};

/// A search request from the calling application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Search keyword
    pub keyword: String,
    /// Location string ("New York", "Remote", may be empty)
    #[serde(default)]
    pub location: String,
    /// Result limit; the configured default applies when absent
    #[serde(default)]
    pub limit: Option<usize>,
    /// Explicit adapter allowlist; all enabled adapters when absent
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    /// Experience-level filter
    #[serde(default)]
    pub experience: ExperienceLevel,
}

impl SearchRequest {
    pub fn new(keyword: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            location: location.into(),
            limit: None,
            sources: None,
            experience: ExperienceLevel::All,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn with_experience(mut self, level: ExperienceLevel) -> Self {
        self.experience = level;
        self
    }
}

/// The merged, deduplicated answer to one search request
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Deduplicated records in priority order, truncated to the limit
    pub jobs: Vec<JobRecord>,
    /// Per-adapter diagnostics
    pub outcomes: Vec<AdapterOutcome>,
    /// Total wall-clock duration
    pub duration_ms: u64,
}

impl SearchResult {
    /// Outcome entry for a specific adapter
    pub fn outcome(&self, adapter: &str) -> Option<&AdapterOutcome> {
        self.outcomes.iter().find(|o| o.adapter == adapter)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("rust", "berlin")
            .with_limit(5)
            .with_experience(ExperienceLevel::Senior)
            .with_sources(vec!["remoteok".to_string()]);

        assert_eq!(request.limit, Some(5));
        assert_eq!(request.experience, ExperienceLevel::Senior);
        assert_eq!(request.sources.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: SearchRequest = serde_json::from_str(r#"{"keyword": "rust"}"#).unwrap();
        assert_eq!(request.keyword, "rust");
        assert_eq!(request.experience, ExperienceLevel::All);
        assert!(request.sources.is_none());
    }
}
