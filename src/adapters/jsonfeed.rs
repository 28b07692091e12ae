//! Generic JSON feed adapter
//!
//! Fallback category: reads a configured feed of job objects. Useful for
//! internal mirrors and partner feeds that expose a plain JSON array.

use super::status::StatusHandle;
use super::traits::{AdapterContext, FetchParams, JobAdapter};
use crate::config::{AdapterCategory, AdapterConfig, SearchSettings};
use crate::error::ScrapeError;
use crate::network::{accept_json, retry_with_backoff, FetchRequest};
use crate::results::JobRecord;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

/// Adapter over a configured JSON feed URL
pub struct JsonFeed {
    name: String,
    feed_url: Option<String>,
    ctx: AdapterContext,
    status: StatusHandle,
}

impl JsonFeed {
    pub fn new(config: &AdapterConfig, ctx: AdapterContext, search: &SearchSettings) -> Self {
        Self {
            name: config.name.clone(),
            feed_url: config.extra_str("feed_url"),
            status: StatusHandle::new(&config.name, search.degraded_after, search.offline_after),
            ctx,
        }
    }

    fn parse_feed(&self, text: &str, params: &FetchParams) -> Result<Vec<JobRecord>, ScrapeError> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ScrapeError::StructuralMismatch(format!("invalid JSON: {}", e)))?;

        let items = json
            .as_array()
            .ok_or_else(|| ScrapeError::StructuralMismatch("expected a JSON array".into()))?;

        let keyword = params.keyword.to_lowercase();
        let mut records = Vec::new();

        for item in items {
            let title = match item.get("title").and_then(|v| v.as_str()) {
                Some(t) if !t.is_empty() => t,
                _ => continue,
            };
            let company = match item.get("company").and_then(|v| v.as_str()) {
                Some(c) if !c.is_empty() => c,
                _ => continue,
            };
            let description = item
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("");

            if !keyword.is_empty() {
                let haystack = format!("{} {}", title, description).to_lowercase();
                if !haystack.contains(&keyword) {
                    continue;
                }
            }

            let mut record = JobRecord::new(title, company, &self.name)
                .with_location(
                    item.get("location")
                        .and_then(|v| v.as_str())
                        .unwrap_or("Remote"),
                )
                .with_url(item.get("url").and_then(|v| v.as_str()).unwrap_or(""));

            if let Some(salary) = item.get("salary").and_then(|v| v.as_str()) {
                record = record.with_salary(salary);
            }
            if !description.is_empty() {
                record = record.with_snippet(description);
            }
            if let Some(tags) = item.get("tags").and_then(|v| v.as_array()) {
                record = record.with_tags(
                    tags.iter()
                        .filter_map(|t| t.as_str())
                        .map(|t| t.to_string())
                        .collect(),
                );
            }

            records.push(record);
            if records.len() >= params.limit {
                break;
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl JobAdapter for JsonFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> AdapterCategory {
        AdapterCategory::Fallback
    }

    fn status(&self) -> &StatusHandle {
        &self.status
    }

    async fn initialize(&self) -> Result<(), ScrapeError> {
        if self.feed_url.is_none() {
            return Err(ScrapeError::Configuration(format!(
                "adapter {} requires a feed_url setting",
                self.name
            )));
        }
        Ok(())
    }

    async fn search(&self, params: &FetchParams) -> Vec<JobRecord> {
        self.status.begin_run();
        let started = Instant::now();

        // Registration is gated on initialize, so this is always present
        let feed_url = match self.feed_url.as_deref() {
            Some(url) => url,
            None => {
                self.status.record_error(
                    crate::error::ErrorKind::Configuration,
                    "feed_url missing",
                );
                return Vec::new();
            }
        };

        let response = retry_with_backoff(&self.ctx.retry, params.deadline, || {
            let request = FetchRequest::get(feed_url).header("Accept", accept_json());
            async move {
                let response = self
                    .ctx
                    .http
                    .execute(request)
                    .await
                    .map_err(|err| ScrapeError::from_fetch(&err))?;
                if response.is_blocked() {
                    return Err(ScrapeError::AccessBlocked {
                        status: response.status,
                    });
                }
                if !response.is_success() {
                    return Err(ScrapeError::TransientNetwork(format!(
                        "HTTP {}",
                        response.status
                    )));
                }
                Ok(response)
            }
        })
        .await;

        match response.and_then(|r| self.parse_feed(&r.text, params)) {
            Ok(records) => {
                debug!(
                    "{} returned {} records in {:?}",
                    self.name,
                    records.len(),
                    started.elapsed()
                );
                self.status.record_success(records.len(), started.elapsed());
                records
            }
            Err(err) => {
                warn!("{} search failed: {}", self.name, err);
                self.status.record_error(err.kind(), err.to_string());
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::test_context;
    use crate::adapters::LifecycleState;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"[
        {
            "title": "Rust Developer",
            "company": "Gamma",
            "location": "Berlin",
            "url": "https://jobs.example.net/1",
            "salary": "90k EUR",
            "description": "Systems programming role",
            "tags": ["rust", "linux"]
        },
        {"title": "", "company": "Broken"}
    ]"#;

    fn adapter(feed_url: Option<&str>) -> JsonFeed {
        let mut config = AdapterConfig {
            name: "jsonfeed".to_string(),
            adapter: "jsonfeed".to_string(),
            ..Default::default()
        };
        if let Some(url) = feed_url {
            config.extra.insert(
                "feed_url".to_string(),
                serde_yaml::Value::String(url.to_string()),
            );
        }
        JsonFeed::new(&config, test_context(), &SearchSettings::default())
    }

    #[tokio::test]
    async fn test_initialize_requires_feed_url() {
        let err = adapter(None).initialize().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Configuration(_)));

        assert!(adapter(Some("https://jobs.example.net/feed.json"))
            .initialize()
            .await
            .is_ok());
    }

    #[test]
    fn test_parse_feed_skips_incomplete_entries() {
        let adapter = adapter(Some("https://jobs.example.net/feed.json"));
        let params = FetchParams::new("rust", "", 10);
        let records = adapter.parse_feed(FEED, &params).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "Gamma");
        assert_eq!(records[0].salary.as_deref(), Some("90k EUR"));
        assert_eq!(records[0].skill_tags, vec!["rust", "linux"]);
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;

        let adapter = adapter(Some(&format!("{}/feed.json", server.uri())));
        let records = adapter.search(&FetchParams::new("rust", "", 10)).await;

        assert_eq!(records.len(), 1);
        assert_eq!(adapter.status().state(), LifecycleState::Healthy);
    }
}
