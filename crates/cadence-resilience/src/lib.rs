// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives guarding the upstream lookup service.
//!
//! - [`CircuitBreaker`] short-circuits calls while the upstream is failing.
//! - [`BoundedResolutionPool`] caps concurrent blocking lookups and runs each
//!   one on the blocking thread pool.

pub mod circuit_breaker;
pub mod pool;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use pool::{BoundedResolutionPool, PoolStats};
