//! HTTP client for making requests to job sources

use crate::config::{OutgoingSettings, ProxyEndpointConfig};
use crate::stealth::identity::generate_user_agent;
use anyhow::Result;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP request to be made against a source
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// POST body data
    pub data: Option<RequestBody>,
    /// Cookies to send
    pub cookies: HashMap<String, String>,
}

impl FetchRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
            cookies: HashMap::new(),
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
            cookies: HashMap::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add form data (sets content-type to form-urlencoded)
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(RequestBody::Form(data));
        self
    }

    /// Add JSON body
    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.data = Some(RequestBody::Json(data));
        self
    }

    /// Add a cookie
    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body types
#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(HashMap<String, String>),
    Json(serde_json::Value),
}

/// HTTP response from a source request
#[derive(Debug)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// `Set-Cookie` values, in order
    pub set_cookies: Vec<String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl FetchResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the target refused the request outright
    pub fn is_blocked(&self) -> bool {
        self.status == 403 || self.status == 429
    }

    /// Check if response carries a CAPTCHA challenge
    pub fn is_captcha(&self) -> bool {
        // Common CAPTCHA indicators
        self.text.contains("captcha")
            || self.text.contains("CAPTCHA")
            || self.text.contains("unusual traffic")
            || self.text.contains("verify you are human")
    }
}

/// HTTP client wrapper with jobhound-specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        Self::build(settings, None)
    }

    /// Create a client routing through a proxy endpoint
    pub fn with_proxy(settings: &OutgoingSettings, endpoint: &ProxyEndpointConfig) -> Result<Self> {
        Self::build(settings, Some(endpoint))
    }

    fn build(settings: &OutgoingSettings, proxy: Option<&ProxyEndpointConfig>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(endpoint) = proxy {
            let mut p = reqwest::Proxy::all(&endpoint.url)?;
            if let (Some(user), Some(pass)) = (&endpoint.username, &endpoint.password) {
                p = p.basic_auth(user, pass);
            }
            builder = builder.proxy(p);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            user_agent: generate_user_agent(),
        })
    }

    /// Execute a fetch request
    pub async fn execute(&self, request: FetchRequest) -> Result<FetchResponse> {
        self.execute_with_timeout(request, self.default_timeout)
            .await
    }

    /// Execute a fetch request with custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: FetchRequest,
        timeout: Duration,
    ) -> Result<FetchResponse> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        // Set timeout
        req_builder = req_builder.timeout(timeout);

        // Set default headers; per-request headers below override these
        req_builder = req_builder
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_html())
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("DNT", "1")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1");

        // Add custom headers
        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        // Add query parameters
        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        // Add cookies
        if !request.cookies.is_empty() {
            let cookie_str = request
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            req_builder = req_builder.header("Cookie", cookie_str);
        }

        // Add body
        if let Some(body) = request.data {
            req_builder = match body {
                RequestBody::Form(data) => req_builder.form(&data),
                RequestBody::Json(json) => req_builder.json(&json),
            };
        }

        // Execute request
        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Simple GET request
    pub async fn get(&self, url: &str) -> Result<FetchResponse> {
        let request = FetchRequest::get(url);
        self.execute(request).await
    }

    /// GET request with parameters
    pub async fn get_with_params(
        &self,
        url: &str,
        params: HashMap<String, String>,
    ) -> Result<FetchResponse> {
        let mut request = FetchRequest::get(url);
        request.params = params;
        self.execute(request).await
    }

    /// Parse response into FetchResponse
    async fn parse_response(response: Response) -> Result<FetchResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        let mut set_cookies = Vec::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                if key.as_str() == "set-cookie" {
                    set_cookies.push(v.to_string());
                }
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(FetchResponse {
            status,
            headers,
            set_cookies,
            text,
            url,
        })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Set custom user agent
    pub fn set_user_agent(&mut self, ua: String) {
        self.user_agent = ua;
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP client")
    }
}

/// Standard accept header for HTML requests
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
}

/// Standard accept header for JSON requests
pub fn accept_json() -> &'static str {
    "application/json,text/javascript,*/*;q=0.01"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_blocked_detection() {
        let response = FetchResponse {
            status: 429,
            headers: HashMap::new(),
            set_cookies: vec![],
            text: String::new(),
            url: "https://example.com".to_string(),
        };
        assert!(response.is_blocked());
        assert!(!response.is_success());
    }

    #[test]
    fn test_captcha_detection() {
        let response = FetchResponse {
            status: 200,
            headers: HashMap::new(),
            set_cookies: vec![],
            text: "<html>please verify you are human</html>".to_string(),
            url: "https://example.com".to_string(),
        };
        assert!(response.is_captcha());
    }
}
