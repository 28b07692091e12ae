//! Error taxonomy for scraping failures
//!
//! Every failure an adapter can hit maps onto one of these classes, which
//! decide retry behavior and how fast an adapter degrades.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while scraping a single source
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Connection resets, DNS hiccups, socket timeouts
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// The target actively refused us (403/429, CAPTCHA, bot wall)
    #[error("access blocked by target (status {status})")]
    AccessBlocked { status: u16 },

    /// Expected content markers are gone; the target changed shape
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// The per-adapter timeout budget was spent
    #[error("adapter timeout exceeded")]
    ResourceExhausted,

    /// Missing credentials or descriptor fields. The only class allowed to
    /// escape `initialize` and keep an adapter out of the registry.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ScrapeError {
    /// Classify for status bookkeeping
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransientNetwork(_) => ErrorKind::TransientNetwork,
            Self::AccessBlocked { .. } => ErrorKind::AccessBlocked,
            Self::StructuralMismatch(_) => ErrorKind::StructuralMismatch,
            Self::ResourceExhausted => ErrorKind::ResourceExhausted,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Only transient network failures are worth retrying locally
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Classify a client-layer failure, unwrapping reqwest errors when the
    /// anyhow chain carries one
    pub fn from_fetch(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<reqwest::Error>() {
            Some(req_err) => Self::from_request(req_err),
            None => Self::TransientNetwork(err.to_string()),
        }
    }

    /// Build from a reqwest failure
    pub fn from_request(err: &reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::TransientNetwork(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                403 | 429 => Self::AccessBlocked {
                    status: status.as_u16(),
                },
                _ => Self::TransientNetwork(err.to_string()),
            }
        } else {
            Self::TransientNetwork(err.to_string())
        }
    }
}

/// Lightweight mirror of `ScrapeError` kept in status records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransientNetwork,
    AccessBlocked,
    StructuralMismatch,
    ResourceExhausted,
    Configuration,
}

impl ErrorKind {
    /// How many consecutive-failure slots one occurrence burns.
    /// A structural mismatch means the adapter itself needs maintenance,
    /// so it degrades twice as fast as a flaky network.
    pub fn failure_weight(&self) -> u32 {
        match self {
            Self::StructuralMismatch => 2,
            _ => 1,
        }
    }
}
