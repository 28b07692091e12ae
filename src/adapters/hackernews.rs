//! Hacker News "Who is hiring" adapter
//!
//! Searches job stories through the Algolia API.

use super::status::StatusHandle;
use super::traits::{AdapterContext, FetchParams, JobAdapter};
use crate::config::{AdapterCategory, AdapterConfig, SearchSettings};
use crate::error::ScrapeError;
use crate::network::{accept_json, retry_with_backoff, FetchRequest};
use crate::results::JobRecord;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{debug, warn};

const DEFAULT_API_URL: &str = "https://hn.algolia.com/api/v1/search";

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Hacker News job story adapter
pub struct HackerNews {
    name: String,
    api_url: String,
    ctx: AdapterContext,
    status: StatusHandle,
}

impl HackerNews {
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

    fn parse_hits(&self, text: &str, params: &FetchParams) -> Result<Vec<JobRecord>, ScrapeError> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ScrapeError::StructuralMismatch(format!("invalid JSON: {}", e)))?;

        let hits = json
            .get("hits")
            .and_then(|h| h.as_array())
            .ok_or_else(|| ScrapeError::StructuralMismatch("hits array missing".into()))?;

        let location = params.location.to_lowercase();
        let mut records = Vec::new();

        for hit in hits {
            let title = match hit.get("title").and_then(|v| v.as_str()) {
                Some(t) if !t.is_empty() => t,
                _ => continue,
            };

            let snippet = hit
                .get("story_text")
                .and_then(|v| v.as_str())
                .map(strip_html);

            // Job stories rarely carry a structured location; match loosely
            // over everything we have
            if !location.is_empty() && location != "remote" {
                let haystack = format!("{} {}", title, snippet.as_deref().unwrap_or(""))
                    .to_lowercase();
                if !haystack.contains(&location) && !haystack.contains("remote") {
                    continue;
                }
            }

            let url = hit
                .get("story_url")
                .and_then(|v| v.as_str())
                .filter(|u| !u.is_empty())
                .map(|u| u.to_string())
                .or_else(|| {
                    hit.get("objectID")
                        .and_then(|v| v.as_str())
                        .map(|id| format!("https://news.ycombinator.com/item?id={}", id))
                })
                .unwrap_or_default();

            let company = company_from_title(title);

            let mut record = JobRecord::new(title, company, &self.name)
                .with_location("Remote")
                .with_url(url);
            if let Some(snippet) = snippet {
                record = record.with_snippet(snippet.chars().take(400).collect::<String>());
            }

            records.push(record);
            if records.len() >= params.limit {
                break;
            }
        }

        Ok(records)
    }
}

/// Pull the company name off the front of an "X is hiring ..." title
fn company_from_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    // lowercasing can change byte offsets, so the index may not sit on a
    // char boundary of the original
    let prefix = match lowered.find(" is hiring") {
        Some(idx) => title.get(..idx).unwrap_or(title),
        None => title,
    };

    // Strip a "(YC W21)" style batch tag
    let cleaned = match prefix.find('(') {
        Some(idx) => prefix[..idx].trim(),
        None => prefix.trim(),
    };

    if cleaned.is_empty() {
        title.trim().to_string()
    } else {
        cleaned.to_string()
    }
}

fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, " ").to_string()
}

#[async_trait]
impl JobAdapter for HackerNews {
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
            let request = FetchRequest::get(&self.api_url)
                .header("Accept", accept_json())
                .param("query", params.keyword.clone())
                .param("tags", "job_story")
                .param("hitsPerPage", params.limit.to_string());
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

        match response.and_then(|r| self.parse_hits(&r.text, params)) {
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
