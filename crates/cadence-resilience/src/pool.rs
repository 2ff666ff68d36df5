// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded pool for blocking upstream lookups.
//!
//! A counting semaphore admits at most `max_concurrent` lookups; further
//! callers wait for a slot. Each admitted call runs on the blocking thread
//! pool so a hanging lookup never stalls the runtime. The permit moves into
//! the blocking task, so the bound holds even if the caller stops waiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use cadence_core::CadenceError;
use cadence_core::traits::LookupAdapter;
use cadence_core::types::{LookupOptions, LookupResponse};

/// Counters describing pool usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub max_concurrent: usize,
    pub active: usize,
    pub total_calls: u64,
    pub failed_calls: u64,
}

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    total: AtomicU64,
    failed: AtomicU64,
}

/// Decrements the active count when the blocking call finishes, panics included.
struct ActiveGuard(Arc<Counters>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let remaining = self.0.active.fetch_sub(1, Ordering::SeqCst) - 1;
        cadence_prometheus::set_active_lookups(remaining);
    }
}

/// Runs upstream lookups with bounded concurrency.
pub struct BoundedResolutionPool {
    lookup: Arc<dyn LookupAdapter>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    counters: Arc<Counters>,
}

impl BoundedResolutionPool {
    pub fn new(lookup: Arc<dyn LookupAdapter>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            lookup,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Run one lookup, waiting for a free slot first.
    pub async fn execute(
        &self,
        options: LookupOptions,
        query: String,
    ) -> Result<LookupResponse, CadenceError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| CadenceError::Internal("lookup pool closed".to_string()))?;

        self.counters.total.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        cadence_prometheus::set_active_lookups(active);
        debug!(query = %query, active, "lookup admitted");

        let lookup = Arc::clone(&self.lookup);
        let guard = ActiveGuard(Arc::clone(&self.counters));
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _guard = guard;
            lookup.extract(&query, &options)
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(join_err) => Err(CadenceError::Lookup {
                message: "lookup worker did not complete".to_string(),
                source: Some(Box::new(join_err)),
            }),
        };

        cadence_prometheus::record_lookup_call(result.is_ok());
        if let Err(err) = &result {
            self.counters.failed.fetch_add(1, Ordering::SeqCst);
            warn!(error = %err, "upstream lookup failed");
        }
        result
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            max_concurrent: self.max_concurrent,
            active: self.counters.active.load(Ordering::SeqCst),
            total_calls: self.counters.total.load(Ordering::SeqCst),
            failed_calls: self.counters.failed.load(Ordering::SeqCst),
        }
    }
}
