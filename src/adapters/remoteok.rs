//! RemoteOK adapter
//!
//! Uses the public JSON API. The feed is not searchable server-side, so
//! keyword and location filtering happen client-side over the full feed.

use super::status::StatusHandle;
use super::traits::{AdapterContext, FetchParams, JobAdapter};
use crate::config::{AdapterCategory, AdapterConfig, SearchSettings};
use crate::error::ScrapeError;
use crate::network::{accept_json, retry_with_backoff, FetchRequest};
use crate::results::JobRecord;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

const DEFAULT_API_URL: &str = "https://remoteok.com/api";

/// RemoteOK job board adapter
pub struct RemoteOk {
    name: String,
    api_url: String,
    ctx: AdapterContext,
    status: StatusHandle,
}

impl RemoteOk {
    pub fn new(config: &AdapterConfig, ctx: AdapterContext, search: &SearchSettings) -> Self {
        Self {
            name: config.name.clone(),
            api_url: config
                .extra_str("api_url")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            status: StatusHandle::new(&config.name, search.degraded_after, search.offline_after),
            ctx,
        }
    }

    fn parse_jobs(&self, text: &str, params: &FetchParams) -> Result<Vec<JobRecord>, ScrapeError> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ScrapeError::StructuralMismatch(format!("invalid JSON: {}", e)))?;

        let items = json
            .as_array()
            .ok_or_else(|| ScrapeError::StructuralMismatch("expected a JSON array".into()))?;

        let keyword = params.keyword.to_lowercase();
        let location = params.location.to_lowercase();
        let mut records = Vec::new();

        for item in items {
            // The feed opens with a legal notice object that has no position
            let title = match item.get("position").and_then(|v| v.as_str()) {
                Some(t) if !t.is_empty() => t,
                _ => continue,
            };
            let company = match item.get("company").and_then(|v| v.as_str()) {
                Some(c) if !c.is_empty() => c,
                _ => continue,
            };

            let tags: Vec<String> = item
                .get("tags")
                .and_then(|v| v.as_array())
                .map(|tags| {
                    tags.iter()
                        .filter_map(|t| t.as_str())
                        .map(|t| t.to_string())
                        .collect()
                })
                .unwrap_or_default();

            let description = item
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let job_location = item
                .get("location")
                .and_then(|v| v.as_str())
                .filter(|l| !l.is_empty())
                .unwrap_or("Remote");

            if !keyword.is_empty() {
                let haystack =
                    format!("{} {} {}", title, tags.join(" "), description).to_lowercase();
                if !haystack.contains(&keyword) {
                    continue;
                }
            }

            // Remote roles match any requested location
            if !location.is_empty() && location != "remote" {
                let loc = job_location.to_lowercase();
                if !loc.contains(&location) && !loc.contains("remote") {
                    continue;
                }
            }

            let url = item
                .get("url")
                .and_then(|v| v.as_str())
                .map(|u| u.to_string())
                .or_else(|| {
                    item.get("id")
                        .and_then(|v| v.as_str())
                        .map(|id| format!("https://remoteok.com/l/{}", id))
                })
                .unwrap_or_default();

            let mut record = JobRecord::new(title, company, &self.name)
                .with_location(job_location)
                .with_url(url)
                .with_tags(tags);

            if let Some(salary) = format_salary(item) {
                record = record.with_salary(salary);
            }
            if !description.is_empty() {
                record = record.with_snippet(truncate(description, 400));
            }

            records.push(record);
            if records.len() >= params.limit {
                break;
            }
        }

        Ok(records)
    }
}

/// Render the salary range fields, when present
fn format_salary(item: &serde_json::Value) -> Option<String> {
    let min = item.get("salary_min").and_then(|v| v.as_u64()).unwrap_or(0);
    let max = item.get("salary_max").and_then(|v| v.as_u64()).unwrap_or(0);
    match (min, max) {
        (0, 0) => None,
        (min, 0) => Some(format!("${}+", min)),
        (min, max) => Some(format!("${} - ${}", min, max)),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl JobAdapter for RemoteOk {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> AdapterCategory {
        AdapterCategory::Api
    }

    fn status(&self) -> &StatusHandle {
        &self.status
    }

    async fn search(&self, params: &FetchParams) -> Vec<JobRecord> {
        self.status.begin_run();
        let started = Instant::now();

        let response = retry_with_backoff(&self.ctx.retry, params.deadline, || {
            let request = FetchRequest::get(&self.api_url).header("Accept", accept_json());
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

        match response.and_then(|r| self.parse_jobs(&r.text, params)) {
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
