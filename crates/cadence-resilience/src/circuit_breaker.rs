// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Three-state circuit breaker.
//!
//! CLOSED lets calls through and counts consecutive failures. Reaching the
//! threshold opens the circuit: calls fail with
//! [`CadenceError::CircuitOpen`] without running. Once the recovery timeout
//! has passed since the last failure, the next call runs as a HALF_OPEN
//! trial; success closes the circuit, failure reopens it.
//!
//! The state lock is never held while the guarded operation runs.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use cadence_core::CadenceError;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view of a breaker, for status output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    /// Time since the most recent failure, if any was recorded.
    pub since_last_failure: Option<Duration>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Guards calls to a failing dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `operation` through the breaker.
    ///
    /// Returns [`CadenceError::CircuitOpen`] without invoking `operation`
    /// while the circuit is open. Any error from `operation` is recorded and
    /// returned unchanged.
    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T, CadenceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CadenceError>>,
    {
        self.admit().await?;

        match operation().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Current state. An open circuit past its recovery timeout still reports
    /// `Open` until the next call probes it.
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    pub async fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock().await;
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            failure_threshold: self.failure_threshold,
            since_last_failure: inner.last_failure.map(|at| at.elapsed()),
        }
    }

    async fn admit(&self) -> Result<(), CadenceError> {
        let mut inner = self.inner.lock().await;
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let elapsed = inner
            .last_failure
            .map(|at| at.elapsed())
            .unwrap_or(self.recovery_timeout);
        if elapsed < self.recovery_timeout {
            return Err(CadenceError::CircuitOpen {
                retry_after: self.recovery_timeout - elapsed,
            });
        }

        inner.state = CircuitState::HalfOpen;
        cadence_prometheus::record_breaker_transition("half_open");
        info!(breaker = %self.name, "circuit half-open, probing upstream");
        Ok(())
    }

    async fn on_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                cadence_prometheus::record_breaker_transition("closed");
                info!(breaker = %self.name, "circuit closed, upstream recovered");
            }
            CircuitState::Closed if inner.failure_count > 0 => {
                debug!(
                    breaker = %self.name,
                    failures = inner.failure_count,
                    "failure count reset after success"
                );
                inner.failure_count = 0;
            }
            _ => {}
        }
    }

    async fn on_failure(&self, err: &CadenceError) {
        let mut inner = self.inner.lock().await;
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        if inner.failure_count >= self.failure_threshold && inner.state != CircuitState::Open {
            inner.state = CircuitState::Open;
            cadence_prometheus::record_breaker_transition("open");
            warn!(
                breaker = %self.name,
                failures = inner.failure_count,
                recovery_secs = self.recovery_timeout.as_secs(),
                error = %err,
                "circuit opened after repeated failures"
            );
        } else {
            debug!(
                breaker = %self.name,
                failures = inner.failure_count,
                error = %err,
                "guarded call failed"
            );
        }
    }
}
