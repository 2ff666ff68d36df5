// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight resolution tracking.
//!
//! A key is pending while one caller is resolving it. Other callers for the
//! same key wait for it to clear and then read the cache instead of issuing
//! a second upstream lookup.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::time::Instant;

use crate::cache::normalize_key;

/// Set of keys currently being resolved.
#[derive(Debug, Default, Clone)]
pub struct ResolutionDeduplicator {
    pending: Arc<DashSet<String>>,
}

/// Clears its key when dropped, whether resolution succeeded, failed or was cancelled.
#[derive(Debug)]
pub struct PendingGuard {
    pending: Arc<DashSet<String>>,
    key: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.remove(&self.key);
    }
}

impl ResolutionDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains(&normalize_key(key))
    }

    /// Mark `key` pending. Returns false if it already was.
    pub fn mark_pending(&self, key: &str) -> bool {
        self.pending.insert(normalize_key(key))
    }

    pub fn clear_pending(&self, key: &str) {
        self.pending.remove(&normalize_key(key));
    }

    /// Atomically mark `key` pending and return a guard that clears it,
    /// or `None` if another caller holds it.
    pub fn try_acquire(&self, key: &str) -> Option<PendingGuard> {
        let key = normalize_key(key);
        self.pending.insert(key.clone()).then(|| PendingGuard {
            pending: Arc::clone(&self.pending),
            key,
        })
    }

    /// Poll until `key` is no longer pending.
    ///
    /// Returns false if it was still pending after `max_wait`.
    pub async fn wait_until_clear(&self, key: &str, poll: Duration, max_wait: Duration) -> bool {
        let key = normalize_key(key);
        let deadline = Instant::now() + max_wait;
        while self.pending.contains(&key) {
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(poll).await;
        }
        true
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
