//! Stealth behavior module
//!
//! Composable primitives that keep browser-automated adapters from looking
//! like automation: humanized pacing, rotating identities, fingerprint
//! overrides, and persistent per-target sessions.

mod behavior;
mod fingerprint;
pub mod identity;
mod session;

pub use behavior::{pointer_path, scroll_plan, BehaviorConfig, Point};
pub use fingerprint::FingerprintProfile;
pub use identity::{generate_user_agent, BrowserIdentity, IdentityRotator};
pub use session::{SessionManager, SessionState, StealthSession, StoredCookie};
