//! Search orchestration module
//!
//! Coordinates search execution across the registered adapters, aggregates
//! results, and reports per-adapter outcomes.

mod manager;
mod models;

pub use manager::SearchManager;
pub use models::{SearchRequest, SearchResult};
