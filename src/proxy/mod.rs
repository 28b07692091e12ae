//! Proxy rotation service
//!
//! Supplies outbound network identity to adapters that request one, with
//! per-endpoint quality scoring, quarantine on repeated failure, and
//! health-check re-admission.

mod endpoint;
mod geo;
mod pool;
mod strategy;

pub use endpoint::{ProxyEndpoint, ProxyEndpointStatus};
pub use geo::{country_for_location, target_geography};
pub use pool::{HttpProber, ProxyPoolError, ProxyProber, ProxyRotator};
pub use strategy::RotationStrategy;
