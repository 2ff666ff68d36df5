// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Autoplay recommendation buffer.
//!
//! Recommendations are fetched from a primary source, falling back to an
//! optional secondary source when the primary yields nothing. Each fetch
//! asks for a whole batch; non-empty batches are cached per seed URL for a
//! limited time and callers get a prefix of the cached batch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use cadence_config::model::AutoplayConfig;
use cadence_core::traits::RecommendationSource;
use cadence_core::types::{Recommendation, Song};

/// Smallest batch requested from a recommendation source.
const MIN_FETCH_BATCH: usize = 25;

struct CachedRecommendations {
    stored_at: Instant,
    items: Vec<Recommendation>,
}

/// Seed-keyed recommendation cache in front of the recommendation sources.
pub struct RecommendationBuffer {
    primary: Arc<dyn RecommendationSource>,
    secondary: Option<Arc<dyn RecommendationSource>>,
    cache: Mutex<HashMap<String, CachedRecommendations>>,
    ttl: Duration,
    capacity: usize,
    fetch_multiplier: usize,
    fetch_batch: usize,
}

impl RecommendationBuffer {
    pub fn new(
        primary: Arc<dyn RecommendationSource>,
        secondary: Option<Arc<dyn RecommendationSource>>,
        config: &AutoplayConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            cache: Mutex::new(HashMap::new()),
            ttl: config.cache_ttl(),
            capacity: config.cache_capacity.max(1),
            fetch_multiplier: config.fetch_multiplier.max(1),
            fetch_batch: config
                .songs_per_batch
                .saturating_mul(config.fetch_multiplier)
                .max(MIN_FETCH_BATCH),
        }
    }

    /// Up to `count` recommendations related to `seed_url`.
    ///
    /// Source failures are logged and treated as empty results.
    pub async fn get_recommendations(&self, seed_url: &str, count: usize) -> Vec<Recommendation> {
        if seed_url.is_empty() || count == 0 {
            return Vec::new();
        }

        {
            let mut cache = self.cache.lock().await;
            match cache.get(seed_url) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    debug!(seed = seed_url, "recommendation cache hit");
                    return entry.items.iter().take(count).cloned().collect();
                }
                Some(_) => {
                    cache.remove(seed_url);
                }
                None => {}
            }
        }

        let batch = count.max(self.fetch_batch);
        let mut items = fetch_from(self.primary.as_ref(), seed_url, batch).await;
        if items.is_empty()
            && let Some(secondary) = &self.secondary
        {
            debug!(seed = seed_url, "primary source empty, trying secondary");
            items = fetch_from(secondary.as_ref(), seed_url, batch).await;
        }

        if !items.is_empty() {
            let mut cache = self.cache.lock().await;
            cache.insert(
                seed_url.to_string(),
                CachedRecommendations {
                    stored_at: Instant::now(),
                    items: items.clone(),
                },
            );
            while cache.len() > self.capacity {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(key) => {
                        cache.remove(&key);
                    }
                    None => break,
                }
            }
        }

        info!(seed = seed_url, fetched = items.len(), "generated recommendations");
        items.truncate(count);
        items
    }

    /// Pick up to `count` new songs for a queue that already holds `existing`.
    ///
    /// Fetches extra candidates so that duplicates of queued songs (same
    /// normalized title or same canonical URL) can be dropped.
    pub async fn top_up(&self, seed_url: &str, existing: &[Song], count: usize) -> Vec<Song> {
        if count == 0 {
            return Vec::new();
        }
        let candidates = self
            .get_recommendations(seed_url, count.saturating_mul(self.fetch_multiplier))
            .await;

        let mut titles: HashSet<String> = existing.iter().map(|s| normalize_title(&s.title)).collect();
        let mut urls: HashSet<String> = existing
            .iter()
            .flat_map(|s| [s.canonical_page_url.clone(), s.original_source_url.clone()])
            .flatten()
            .collect();

        let mut picked = Vec::with_capacity(count);
        for rec in candidates {
            if picked.len() >= count {
                break;
            }
            let title = normalize_title(&rec.title);
            if titles.contains(&title) || urls.contains(&rec.url) {
                debug!(title = %rec.title, "skipping duplicate recommendation");
                continue;
            }
            titles.insert(title);
            urls.insert(rec.url.clone());
            picked.push(rec.into_song());
        }
        picked
    }

    /// Number of cached seeds.
    pub async fn cached_seeds(&self) -> usize {
        self.cache.lock().await.len()
    }
}

async fn fetch_from(source: &dyn RecommendationSource, seed_url: &str, count: usize) -> Vec<Recommendation> {
    match source.related(seed_url, count).await {
        Ok(items) => items,
        Err(e) => {
            warn!(source = source.name(), error = %e, "recommendation source failed");
            Vec::new()
        }
    }
}

fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
