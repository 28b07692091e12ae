//! Result types and aggregation
//!
//! Defines the job record model and the collector that merges adapter
//! output into one deterministic result set.

mod collector;
mod types;

pub use collector::{dedupe, ResultCollector};
pub use types::{AdapterOutcome, ExperienceLevel, JobRecord, OutcomeError};
