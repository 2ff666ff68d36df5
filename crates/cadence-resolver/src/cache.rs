// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolved-song cache with TTL expiry and least-recently-used eviction.
//!
//! Recency is tracked with a monotonically increasing access tick per entry
//! and an ordered index from tick to key, so both promotion on `get` and
//! eviction on `set` are logarithmic.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use cadence_core::types::ResolvedTrack;

/// Normalize a cache or dedup key: lowercase, surrounding whitespace trimmed.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Cache counters for status output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hits as a percentage of all lookups, 0 when nothing was looked up.
    pub hit_rate: f64,
}

#[derive(Debug)]
struct CacheEntry {
    track: ResolvedTrack,
    stored_at: Instant,
    hit_count: u64,
    tick: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn bump(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.recency.remove(&entry.tick);
        }
    }
}

/// Capacity-bounded cache of resolution results keyed by normalized query.
#[derive(Debug)]
pub struct SongCache {
    max_size: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl SongCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            max_size: max_size.max(1),
            ttl,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Look up `key`. Expired entries are dropped and count as a miss.
    pub async fn get(&self, key: &str) -> Option<ResolvedTrack> {
        let key = normalize_key(key);
        let mut inner = self.inner.lock().await;

        let expired = match inner.entries.get(&key) {
            None => {
                inner.misses += 1;
                cadence_prometheus::record_cache_lookup(false);
                return None;
            }
            Some(entry) => entry.stored_at.elapsed() > self.ttl,
        };

        if expired {
            inner.remove(&key);
            inner.misses += 1;
            cadence_prometheus::record_cache_lookup(false);
            debug!(key = %key, "cache entry expired");
            return None;
        }

        let tick = inner.bump();
        let CacheInner {
            entries, recency, ..
        } = &mut *inner;
        let entry = entries.get_mut(&key)?;
        recency.remove(&entry.tick);
        recency.insert(tick, key.clone());
        entry.tick = tick;
        entry.hit_count += 1;
        let track = entry.track.clone();

        inner.hits += 1;
        cadence_prometheus::record_cache_lookup(true);
        Some(track)
    }

    /// Store `track` under `key`, evicting the least recently used entry if full.
    pub async fn set(&self, key: &str, track: ResolvedTrack) {
        let key = normalize_key(key);
        let mut inner = self.inner.lock().await;
        let tick = inner.bump();

        inner.remove(&key);
        if inner.entries.len() >= self.max_size
            && let Some((_, oldest)) = inner.recency.pop_first()
        {
            inner.entries.remove(&oldest);
            debug!(evicted = %oldest, "cache full, evicted least recently used entry");
        }

        inner.recency.insert(tick, key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                track,
                stored_at: Instant::now(),
                hit_count: 0,
                tick,
            },
        );
    }

    /// Drop every entry. Counters are kept.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.recency.clear();
    }

    /// Hits served by the entry stored under `key` since it was last written.
    pub async fn hit_count(&self, key: &str) -> Option<u64> {
        let key = normalize_key(key);
        self.inner
            .lock()
            .await
            .entries
            .get(&key)
            .map(|entry| entry.hit_count)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        let lookups = inner.hits + inner.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            inner.hits as f64 * 100.0 / lookups as f64
        };
        CacheStats {
            size: inner.entries.len(),
            max_size: self.max_size,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
        }
    }
}
