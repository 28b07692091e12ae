//! HTTP networking module
//!
//! Provides HTTP client functionality and the shared retry utility used by
//! all adapters.

mod client;
mod retry;

pub use client::{accept_html, accept_json, FetchRequest, FetchResponse, HttpClient, HttpMethod, RequestBody};
pub use retry::{retry_with_backoff, RetryPolicy};
