//! Adapter lifecycle status tracking
//!
//! Each adapter owns one `StatusHandle`; the registry and manager only read
//! snapshots. Handles are safe to hit from concurrently running units.

use crate::error::ErrorKind;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Trust level of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Registered, never run
    Idle,
    /// A search unit is in flight
    Running,
    /// Recent runs succeeded
    Healthy,
    /// Came back from Offline; one more success promotes to Healthy
    Probation,
    /// Too many consecutive failures; still dispatched, reduced trust
    Degraded,
    /// Excluded from dispatch until re-enabled or a probe succeeds
    Offline,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Healthy => "healthy",
            Self::Probation => "probation",
            Self::Degraded => "degraded",
            Self::Offline => "offline",
        }
    }
}

#[derive(Debug)]
struct StatusInner {
    state: LifecycleState,
    consecutive_failures: u32,
    total_successes: u64,
    total_failures: u64,
    records_total: u64,
    last_latency_ms: Option<u64>,
    last_error: Option<(ErrorKind, String)>,
}

/// Shared, concurrently mutable status for one adapter
#[derive(Debug, Clone)]
pub struct StatusHandle {
    name: String,
    degraded_after: u32,
    offline_after: u32,
    inner: Arc<RwLock<StatusInner>>,
}

impl StatusHandle {
    pub fn new(name: impl Into<String>, degraded_after: u32, offline_after: u32) -> Self {
        Self {
            name: name.into(),
            degraded_after,
            offline_after: offline_after.max(degraded_after),
            inner: Arc::new(RwLock::new(StatusInner {
                state: LifecycleState::Idle,
                consecutive_failures: 0,
                total_successes: 0,
                total_failures: 0,
                records_total: 0,
                last_latency_ms: None,
                last_error: None,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mark a search unit as in flight
    pub fn begin_run(&self) {
        let mut inner = self.inner.write().unwrap();
        if inner.state != LifecycleState::Offline {
            inner.state = LifecycleState::Running;
        }
    }

    /// Record a completed run. Resets the consecutive-failure counter.
    ///
    /// An Offline adapter never jumps straight to Healthy: its first
    /// success counts as the probe and lands it in Probation.
    pub fn record_success(&self, count: usize, latency: Duration) {
        let mut inner = self.inner.write().unwrap();
        inner.consecutive_failures = 0;
        inner.total_successes += 1;
        inner.records_total += count as u64;
        inner.last_latency_ms = Some(latency.as_millis() as u64);
        inner.last_error = None;
        inner.state = match inner.state {
            LifecycleState::Offline => LifecycleState::Probation,
            LifecycleState::Probation => LifecycleState::Healthy,
            _ => LifecycleState::Healthy,
        };
    }

    /// Record a failed run and apply the degradation thresholds
    pub fn record_error(&self, kind: ErrorKind, message: impl Into<String>) {
        let mut inner = self.inner.write().unwrap();
        inner.consecutive_failures += kind.failure_weight();
        inner.total_failures += 1;
        inner.last_error = Some((kind, message.into()));

        inner.state = if inner.state == LifecycleState::Probation {
            // failed its probe, back out
            LifecycleState::Offline
        } else if kind == ErrorKind::Configuration
            || inner.consecutive_failures >= self.offline_after
        {
            LifecycleState::Offline
        } else if inner.consecutive_failures >= self.degraded_after {
            LifecycleState::Degraded
        } else if inner.total_successes > 0 {
            LifecycleState::Healthy
        } else {
            LifecycleState::Idle
        };
    }

    /// Manual re-enable or scheduled probe success: Offline goes to
    /// Probation, never straight to Healthy.
    pub fn revive(&self) {
        let mut inner = self.inner.write().unwrap();
        if inner.state == LifecycleState::Offline {
            inner.state = LifecycleState::Probation;
            inner.consecutive_failures = 0;
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.read().unwrap().state
    }

    /// Offline adapters are excluded from dispatch
    pub fn is_dispatchable(&self) -> bool {
        self.state() != LifecycleState::Offline
    }

    pub fn total_failures(&self) -> u64 {
        self.inner.read().unwrap().total_failures
    }

    /// Read-only copy for monitoring and diagnostics
    pub fn snapshot(&self) -> AdapterStatus {
        let inner = self.inner.read().unwrap();
        AdapterStatus {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            total_successes: inner.total_successes,
            total_failures: inner.total_failures,
            records_total: inner.records_total,
            last_latency_ms: inner.last_latency_ms,
            last_error_kind: inner.last_error.as_ref().map(|(kind, _)| *kind),
            last_error: inner.last_error.as_ref().map(|(_, msg)| msg.clone()),
        }
    }
}

/// Point-in-time adapter status
#[derive(Debug, Clone, Serialize)]
pub struct AdapterStatus {
    pub name: String,
    pub state: LifecycleState,
    pub consecutive_failures: u32,
    pub total_successes: u64,
    pub total_failures: u64,
    pub records_total: u64,
    pub last_latency_ms: Option<u64>,
    pub last_error_kind: Option<ErrorKind>,
    pub last_error: Option<String>,
}
