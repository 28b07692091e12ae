//! Indeed adapter
//!
//! Browser-automated category: fetches result pages through a persistent
//! stealth session, paced like a human visitor, optionally behind a rotated
//! proxy endpoint. Selectors live here and are expected to drift with the
//! target; a missing results container is reported as a structural
//! mismatch so the adapter degrades quickly when that happens.

use super::status::StatusHandle;
use super::traits::{AdapterContext, FetchParams, JobAdapter};
use crate::config::{AdapterCategory, AdapterConfig, SearchSettings};
use crate::error::ScrapeError;
use crate::network::{retry_with_backoff, FetchRequest, HttpClient};
use crate::proxy::ProxyEndpoint;
use crate::results::JobRecord;
use crate::stealth::{scroll_plan, BehaviorConfig, StealthSession};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.indeed.com";

/// Markers that distinguish a legitimate empty result page from a page
/// whose structure we no longer understand
const EMPTY_RESULT_MARKERS: &[&str] = &["did not match any jobs", "no results found"];

/// Indeed job search adapter
pub struct Indeed {
    name: String,
    base_url: String,
    ctx: AdapterContext,
    status: StatusHandle,
}

impl Indeed {
    pub fn new(config: &AdapterConfig, ctx: AdapterContext, search: &SearchSettings) -> Self {
        Self {
            name: config.name.clone(),
            base_url: config
                .extra_str("base_url")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            status: StatusHandle::new(&config.name, search.degraded_after, search.offline_after),
            ctx,
        }
    }

    fn search_url(&self, params: &FetchParams) -> String {
        format!(
            "{}/jobs?q={}&l={}",
            self.base_url,
            urlencoding::encode(&params.keyword),
            urlencoding::encode(&params.location)
        )
    }

    fn host(&self) -> String {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| "www.indeed.com".to_string())
    }

    /// Pick a client for this attempt: through the rotation service when a
    /// pool is configured, direct otherwise. Pool exhaustion is transient
    /// by contract, so it flows into the retry path rather than failing.
    async fn acquire_client(
        &self,
        params: &FetchParams,
    ) -> Result<(HttpClient, Option<Arc<ProxyEndpoint>>), ScrapeError> {
        if self.ctx.proxies.is_empty() {
            return Ok((self.ctx.http.clone(), None));
        }

        let endpoint = self
            .ctx
            .proxies
            .next(params.geography.as_deref())
            .map_err(|e| ScrapeError::TransientNetwork(e.to_string()))?;

        let client = self
            .ctx
            .proxies
            .client_for(&endpoint)
            .await
            .map_err(|e| ScrapeError::TransientNetwork(e.to_string()))?;

        Ok((client, Some(endpoint)))
    }

    async fn fetch_page(
        &self,
        session: &mut StealthSession,
        url: &str,
    ) -> Result<String, ScrapeError> {
        let response = session
            .fetch(FetchRequest::get(url))
            .await
            .map_err(|err| ScrapeError::from_fetch(&err))?;

        if response.is_blocked() || response.is_captcha() {
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
        Ok(response.text)
    }

    /// One full attempt: fetch, skim, parse
    async fn attempt(
        &self,
        params: &FetchParams,
        session: &mut StealthSession,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let html = self.fetch_page(session, &self.search_url(params)).await?;

        // Settle over the page the way a person skimming a list would
        let behavior = BehaviorConfig::from_settings(&self.ctx.stealth);
        for _ in scroll_plan(2400, 600) {
            behavior.pause().await;
        }

        self.parse_results(&html, params)
    }

    fn parse_results(
        &self,
        html: &str,
        params: &FetchParams,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let document = Html::parse_document(html);

        let card_selector = Selector::parse("div.job_seen_beacon").unwrap();
        let title_selector = Selector::parse("h2.jobTitle span").unwrap();
        let link_selector = Selector::parse("h2.jobTitle a").unwrap();
        let company_selector =
            Selector::parse("[data-testid='company-name'], span.companyName").unwrap();
        let location_selector =
            Selector::parse("[data-testid='text-location'], div.companyLocation").unwrap();
        let salary_selector =
            Selector::parse("[data-testid='attribute_snippet_testid'], div.salary-snippet")
                .unwrap();
        let snippet_selector = Selector::parse("div.job-snippet").unwrap();

        let mut records = Vec::new();

        for card in document.select(&card_selector) {
            let title = match card.select(&title_selector).next() {
                Some(t) => t.text().collect::<String>().trim().to_string(),
                None => continue,
            };
            if title.is_empty() {
                continue;
            }

            let company = card
                .select(&company_selector)
                .next()
                .map(|c| c.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            if company.is_empty() {
                continue;
            }

            let location = card
                .select(&location_selector)
                .next()
                .map(|l| l.text().collect::<String>().trim().to_string())
                .unwrap_or_else(|| params.location.clone());

            let url = card
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| {
                    Url::parse(&self.base_url)
                        .ok()?
                        .join(href)
                        .ok()
                        .map(|u| u.to_string())
                })
                .unwrap_or_default();

            let mut record = JobRecord::new(title, company, &self.name)
                .with_location(location)
                .with_url(url);

            if let Some(salary) = card
                .select(&salary_selector)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
                .filter(|s| s.chars().any(|c| c.is_ascii_digit()))
            {
                record = record.with_salary(salary);
            }

            if let Some(snippet) = card
                .select(&snippet_selector)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty())
            {
                record = record.with_snippet(snippet);
            }

            records.push(record);
            if records.len() >= params.limit {
                break;
            }
        }

        if records.is_empty() {
            let lowered = html.to_lowercase();
            let legitimately_empty = EMPTY_RESULT_MARKERS
                .iter()
                .any(|marker| lowered.contains(marker));
            if !legitimately_empty {
                return Err(ScrapeError::StructuralMismatch(
                    "job results container missing".into(),
                ));
            }
        }

        Ok(records)
    }

    /// One run: acquire an identity and endpoint, attempt, and on a block
    /// rotate both and try exactly once more.
    async fn run_once(
        &self,
        params: &FetchParams,
        host: &str,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let (client, proxy) = self.acquire_client(params).await?;
        let mut session = StealthSession::open(
            self.ctx.sessions.clone(),
            client,
            &self.name,
            host,
            &self.ctx.stealth,
        );

        let attempt_started = Instant::now();
        match self.attempt(params, &mut session).await {
            Ok(records) => {
                if let Some(ref endpoint) = proxy {
                    self.ctx
                        .proxies
                        .mark_succeeded(endpoint, attempt_started.elapsed());
                }
                Ok(records)
            }
            Err(ScrapeError::AccessBlocked { status }) => {
                warn!(
                    "{} blocked (status {}), rotating identity and endpoint",
                    self.name, status
                );
                if let Some(ref endpoint) = proxy {
                    self.ctx.proxies.mark_failed(endpoint, "access blocked");
                }
                session.rotate_identity();

                let (client, proxy) = self.acquire_client(params).await?;
                let mut session = StealthSession::open(
                    self.ctx.sessions.clone(),
                    client,
                    &self.name,
                    host,
                    &self.ctx.stealth,
                );
                let retry_started = Instant::now();
                let records = self.attempt(params, &mut session).await?;
                if let Some(ref endpoint) = proxy {
                    self.ctx
                        .proxies
                        .mark_succeeded(endpoint, retry_started.elapsed());
                }
                Ok(records)
            }
            Err(err) => {
                if let Some(ref endpoint) = proxy {
                    self.ctx.proxies.mark_failed(endpoint, &err.to_string());
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl JobAdapter for Indeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> AdapterCategory {
        AdapterCategory::Browser
    }

    fn status(&self) -> &StatusHandle {
        &self.status
    }

    async fn search(&self, params: &FetchParams) -> Vec<JobRecord> {
        self.status.begin_run();
        let started = Instant::now();
        let host = self.host();

        let result = retry_with_backoff(&self.ctx.retry, params.deadline, || {
            self.run_once(params, &host)
        })
        .await;

        match result {
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
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"<html><body>
        <div id="mosaic-jobResults">
            <div class="job_seen_beacon">
                <h2 class="jobTitle"><a href="/viewjob?jk=1"><span>Senior Rust Engineer</span></a></h2>
                <span class="companyName">Acme</span>
                <div class="companyLocation">New York, NY</div>
                <div class="salary-snippet">$150,000 - $180,000 a year</div>
                <div class="job-snippet">Build the scraping platform.</div>
            </div>
            <div class="job_seen_beacon">
                <h2 class="jobTitle"><a href="/viewjob?jk=2"><span>Backend Engineer</span></a></h2>
                <span class="companyName">Beta</span>
                <div class="companyLocation">Remote</div>
            </div>
        </div>
    </body></html>"#;

    const EMPTY_PAGE: &str =
        r#"<html><body><p>The search did not match any jobs.</p></body></html>"#;

    fn adapter(base_url: &str) -> Indeed {
        let mut config = AdapterConfig {
            name: "indeed".to_string(),
            adapter: "indeed".to_string(),
            ..Default::default()
        };
        config.extra.insert(
            "base_url".to_string(),
            serde_yaml::Value::String(base_url.to_string()),
        );
        Indeed::new(&config, test_context(), &SearchSettings::default())
    }

    #[test]
    fn test_parse_results() {
        let adapter = adapter(DEFAULT_BASE_URL);
        let params = FetchParams::new("rust", "new york", 10);
        let records = adapter.parse_results(RESULTS_PAGE, &params).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Senior Rust Engineer");
        assert_eq!(records[0].company, "Acme");
        assert_eq!(records[0].salary.as_deref(), Some("$150,000 - $180,000 a year"));
        assert!(records[0].url.contains("viewjob?jk=1"));
        assert_eq!(records[1].company, "Beta");
    }

    #[test]
    fn test_empty_page_is_not_structural() {
        let adapter = adapter(DEFAULT_BASE_URL);
        let params = FetchParams::new("rust", "", 10);
        let records = adapter.parse_results(EMPTY_PAGE, &params).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_unrecognized_page_is_structural() {
        let adapter = adapter(DEFAULT_BASE_URL);
        let params = FetchParams::new("rust", "", 10);
        let err = adapter
            .parse_results("<html><body>redesigned!</body></html>", &params)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::StructuralMismatch(_)));
    }

    #[test]
    fn test_limit_respected() {
        let adapter = adapter(DEFAULT_BASE_URL);
        let params = FetchParams::new("rust", "", 1);
        let records = adapter.parse_results(RESULTS_PAGE, &params).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let adapter = adapter(&server.uri());
        let records = adapter.search(&FetchParams::new("rust", "new york", 10)).await;

        assert_eq!(records.len(), 2);
        assert_eq!(adapter.status().state(), LifecycleState::Healthy);
    }

    #[tokio::test]
    async fn test_block_rotates_and_retries_once() {
        let server = MockServer::start().await;
        // First hit is blocked, the rotated retry succeeds
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(403))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let adapter = adapter(&server.uri());
        let records = adapter.search(&FetchParams::new("rust", "", 10)).await;

        assert_eq!(records.len(), 2);
        assert_eq!(adapter.status().state(), LifecycleState::Healthy);
    }

    #[tokio::test]
    async fn test_persistent_block_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let adapter = adapter(&server.uri());
        let records = adapter.search(&FetchParams::new("rust", "", 10)).await;

        assert!(records.is_empty());
        let snapshot = adapter.status().snapshot();
        assert_eq!(snapshot.last_error_kind, Some(ErrorKind::AccessBlocked));
        assert_eq!(snapshot.total_failures, 1);
    }
}
