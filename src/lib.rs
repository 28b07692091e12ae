//! Jobhound: a stealth-capable job posting metasearch engine written in Rust
//!
//! Collects job postings from heterogeneous sources (browser-rendered
//! sites, public APIs, community feeds) concurrently and returns one
//! deduplicated, filtered result set with per-source diagnostics.

pub mod adapters;
pub mod config;
pub mod error;
pub mod network;
pub mod proxy;
pub mod results;
pub mod search;
pub mod stealth;

pub use adapters::{AdapterLoader, AdapterRegistry, JobAdapter};
pub use config::Settings;
pub use results::JobRecord;
pub use search::{SearchManager, SearchRequest, SearchResult};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for API-based adapters in seconds
pub const DEFAULT_API_TIMEOUT: u64 = 10;

/// Default timeout for browser-automated adapters in seconds
pub const DEFAULT_BROWSER_TIMEOUT: u64 = 30;
