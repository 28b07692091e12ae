//! Source adapter module
//!
//! Defines the JobAdapter contract, the status lifecycle, the registry,
//! and the adapter implementations.

mod loader;
mod registry;
mod status;
mod traits;

// Adapter implementations
pub mod hackernews;
pub mod indeed;
pub mod jsonfeed;
pub mod remoteok;

pub use loader::AdapterLoader;
pub use registry::{AdapterRegistry, RegistryEntry};
pub use status::{AdapterStatus, LifecycleState, StatusHandle};
pub use traits::{AdapterContext, AdapterDescriptor, FetchParams, JobAdapter};
