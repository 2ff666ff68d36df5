// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Song resolution pipeline.
//!
//! `resolve` order: already-resolved no-op, cache, in-flight dedup, then each
//! search attempt through the circuit breaker and the bounded pool. An open
//! circuit aborts the whole resolution; any other failure moves on to the
//! next attempt.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use cadence_config::CadenceConfig;
use cadence_core::CadenceError;
use cadence_core::traits::{CatalogSource, LookupAdapter};
use cadence_core::types::{
    CatalogLink, LookupOptions, LookupResponse, ResolvedTrack, Song, UserId, is_http_url,
};
use cadence_resilience::{BoundedResolutionPool, BreakerSnapshot, CircuitBreaker, PoolStats};

use crate::cache::{CacheStats, SongCache};
use crate::dedup::ResolutionDeduplicator;
use crate::strategy::build_attempts;

/// Combined status of the pipeline's components.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub cache: CacheStats,
    pub pool: PoolStats,
    pub breaker: BreakerSnapshot,
    pub pending: usize,
}

/// Resolves lazy songs and turns user queries into queue entries.
pub struct SongResolutionPipeline {
    cache: Arc<SongCache>,
    dedup: ResolutionDeduplicator,
    breaker: Arc<CircuitBreaker>,
    pool: Arc<BoundedResolutionPool>,
    dedup_poll: Duration,
    dedup_max_wait: Duration,
    playlist_limit: usize,
    catalog: Option<Arc<dyn CatalogSource>>,
    catalog_limit: usize,
}

impl SongResolutionPipeline {
    pub fn new(
        cache: Arc<SongCache>,
        breaker: Arc<CircuitBreaker>,
        pool: Arc<BoundedResolutionPool>,
    ) -> Self {
        Self {
            cache,
            dedup: ResolutionDeduplicator::new(),
            breaker,
            pool,
            dedup_poll: Duration::from_millis(50),
            dedup_max_wait: Duration::from_secs(10),
            playlist_limit: 50,
            catalog: None,
            catalog_limit: 100,
        }
    }

    /// Build every component from configuration.
    pub fn from_config(lookup: Arc<dyn LookupAdapter>, config: &CadenceConfig) -> Self {
        let cache = Arc::new(SongCache::new(config.cache.max_size, config.cache.ttl()));
        let breaker = Arc::new(CircuitBreaker::new(
            "lookup",
            config.breaker.failure_threshold,
            config.breaker.recovery_timeout(),
        ));
        let pool = Arc::new(BoundedResolutionPool::new(lookup, config.pool.max_concurrent));
        Self::new(cache, breaker, pool)
            .with_dedup_wait(config.dedup.poll_interval(), config.dedup.max_wait())
            .with_playlist_limit(config.search.playlist_limit)
            .with_catalog_limit(config.search.catalog_limit)
    }

    pub fn with_dedup_wait(mut self, poll: Duration, max_wait: Duration) -> Self {
        self.dedup_poll = poll;
        self.dedup_max_wait = max_wait;
        self
    }

    pub fn with_playlist_limit(mut self, limit: usize) -> Self {
        self.playlist_limit = limit.max(1);
        self
    }

    /// Import catalog links (tracks, playlists, albums) through `catalog`.
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_catalog_limit(mut self, limit: usize) -> Self {
        self.catalog_limit = limit.max(1);
        self
    }

    pub fn cache(&self) -> &SongCache {
        &self.cache
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Resolve `song` in place.
    ///
    /// A no-op for songs that are not lazy. Fails with
    /// [`CadenceError::CircuitOpen`] as soon as the breaker refuses a call,
    /// or with [`CadenceError::Resolution`] once every attempt has failed.
    pub async fn resolve(&self, song: &mut Song) -> Result<(), CadenceError> {
        if !song.is_lazy {
            return Ok(());
        }

        let key = song.resolution_key().to_string();
        if let Some(track) = self.cache.get(&key).await {
            debug!(title = %song.title, "resolved from cache");
            song.apply_resolved(&track);
            return Ok(());
        }

        let _guard = match self.dedup.try_acquire(&key) {
            Some(guard) => Some(guard),
            None => {
                debug!(key = %key, "resolution already in flight, waiting");
                let cleared = self
                    .dedup
                    .wait_until_clear(&key, self.dedup_poll, self.dedup_max_wait)
                    .await;
                if !cleared {
                    warn!(key = %key, "in-flight resolution did not finish, resolving independently");
                }
                self.dedup.try_acquire(&key)
            }
        };

        // Another caller may have finished between the first cache check and the guard.
        if let Some(track) = self.cache.get(&key).await {
            song.apply_resolved(&track);
            return Ok(());
        }

        let started = Instant::now();
        let attempts = build_attempts(song);
        let mut last_error = None;

        for (index, attempt) in attempts.iter().enumerate() {
            let result = self
                .breaker
                .call(|| self.pool.execute(attempt.options.clone(), attempt.query.clone()))
                .await;

            let response = match result {
                Ok(response) => response,
                Err(err) if err.is_circuit_open() => {
                    warn!(title = %song.title, "lookup circuit open, aborting resolution");
                    return Err(err);
                }
                Err(err) => {
                    debug!(
                        title = %song.title,
                        attempt = index + 1,
                        query = %attempt.query,
                        error = %err,
                        "resolution attempt failed"
                    );
                    last_error = Some(err.to_string());
                    continue;
                }
            };

            let Some(track) = response
                .first_playable()
                .and_then(|raw| ResolvedTrack::from_raw(raw, &song.title))
            else {
                debug!(
                    title = %song.title,
                    attempt = index + 1,
                    query = %attempt.query,
                    "attempt returned no playable stream"
                );
                last_error = Some(format!("no playable stream for `{}`", attempt.query));
                continue;
            };

            song.apply_resolved(&track);
            self.cache.set(&key, track).await;
            cadence_prometheus::record_resolution_latency(started.elapsed().as_secs_f64());
            info!(
                title = %song.title,
                attempt = index + 1,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "song resolved"
            );
            return Ok(());
        }

        warn!(
            title = %song.title,
            attempts = attempts.len(),
            last_error = last_error.as_deref().unwrap_or("none"),
            "all resolution attempts failed"
        );
        Err(CadenceError::Resolution {
            title: song.title.clone(),
            attempts: attempts.len(),
            last_error,
        })
    }

    /// Turn a user query into lazy queue entries.
    ///
    /// Catalog links are read through the catalog collaborator and become
    /// lazy songs resolved by search. Direct URLs are extracted as-is; URLs
    /// that look like playlists are expanded (flat, capped at the playlist
    /// limit). Anything else is a single-result search.
    pub async fn search(&self, query: &str, requester: UserId) -> Result<Vec<Song>, CadenceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if query.contains(CatalogLink::HOST) {
            return self.import_catalog(query, requester).await;
        }

        let options = if is_http_url(query) {
            if query.contains("list=") || query.to_lowercase().contains("playlist") {
                LookupOptions::playlist(self.playlist_limit)
            } else {
                LookupOptions::direct()
            }
        } else {
            LookupOptions::search_one()
        };
        let limit = options.playlist_limit.max(1);

        let response = self
            .breaker
            .call(|| self.pool.execute(options.clone(), query.to_string()))
            .await?;

        let songs: Vec<Song> = songs_from_response(response, requester)
            .into_iter()
            .take(limit)
            .collect();
        debug!(query = %query, found = songs.len(), "search finished");
        Ok(songs)
    }

    async fn import_catalog(&self, url: &str, requester: UserId) -> Result<Vec<Song>, CadenceError> {
        let Some(catalog) = self.catalog.as_ref() else {
            return Err(CadenceError::catalog("catalog links are not configured"));
        };
        let Some(link) = CatalogLink::parse(url) else {
            return Err(CadenceError::catalog(format!("unsupported catalog link `{url}`")));
        };

        let tracks = catalog
            .tracks(&link, self.catalog_limit)
            .await
            .inspect_err(|e| warn!(url = %url, kind = %link.kind, error = %e, "catalog import failed"))?;
        let songs: Vec<Song> = tracks
            .into_iter()
            .filter_map(|track| track.into_song(requester))
            .take(self.catalog_limit)
            .collect();
        info!(url = %url, kind = %link.kind, imported = songs.len(), "catalog link imported");
        Ok(songs)
    }

    pub async fn stats(&self) -> PipelineStats {
        PipelineStats {
            cache: self.cache.stats().await,
            pool: self.pool.stats(),
            breaker: self.breaker.snapshot().await,
            pending: self.dedup.pending_count(),
        }
    }
}

/// Lazy songs from a lookup response. Entries without a title or page URL are skipped.
fn songs_from_response(response: LookupResponse, requester: UserId) -> Vec<Song> {
    response
        .into_tracks()
        .into_iter()
        .filter_map(|raw| {
            let page_url = raw.page_url.filter(|url| !url.trim().is_empty());
            let title = raw.title.filter(|t| !t.trim().is_empty());
            if page_url.is_none() && title.is_none() {
                return None;
            }
            let mut song = Song::lazy(
                title.unwrap_or_else(|| "Unknown".to_string()),
                page_url,
                requester,
            );
            song.duration_seconds = raw.duration_seconds;
            song.thumbnail_url = raw.thumbnail_url;
            Some(song)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use cadence_core::traits::PluginAdapter;
    use cadence_core::types::{
        AdapterType, CatalogKind, CatalogTrack, HealthStatus, LookupMode, RawTrack,
    };

    /// Answers from a query table; unknown queries fail.
    #[derive(Default)]
    struct TableLookup {
        answers: HashMap<String, LookupResponse>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, LookupOptions)>>,
        delay: Duration,
    }

    impl TableLookup {
        fn answer(mut self, query: &str, response: LookupResponse) -> Self {
            self.answers.insert(query.to_string(), response);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn queries(&self) -> Vec<String> {
            self.seen
                .lock()
                .map(|seen| seen.iter().map(|(q, _)| q.clone()).collect())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl PluginAdapter for TableLookup {
        fn name(&self) -> &str {
            "table"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Lookup
        }
        async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), CadenceError> {
            Ok(())
        }
    }

    impl LookupAdapter for TableLookup {
        fn extract(
            &self,
            query: &str,
            options: &LookupOptions,
        ) -> Result<LookupResponse, CadenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((query.to_string(), options.clone()));
            }
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            self.answers
                .get(query)
                .cloned()
                .ok_or_else(|| CadenceError::lookup(format!("no result for {query}")))
        }
    }

    fn playable(title: &str, page: &str) -> LookupResponse {
        LookupResponse::Track(RawTrack {
            title: Some(title.to_string()),
            stream_url: Some(format!("https://cdn/{title}")),
            page_url: Some(page.to_string()),
            duration_seconds: Some(180),
            thumbnail_url: None,
        })
    }

    fn pipeline(lookup: Arc<TableLookup>, threshold: u32) -> SongResolutionPipeline {
        SongResolutionPipeline::new(
            Arc::new(SongCache::new(100, Duration::from_secs(3600))),
            Arc::new(CircuitBreaker::new("lookup", threshold, Duration::from_secs(60))),
            Arc::new(BoundedResolutionPool::new(lookup, 5)),
        )
        .with_dedup_wait(Duration::from_millis(5), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn resolved_song_is_noop() {
        let lookup = Arc::new(TableLookup::default());
        let pipeline = pipeline(lookup.clone(), 5);
        let mut song = Song::lazy("x", None, UserId(1));
        song.is_lazy = false;

        pipeline.resolve(&mut song).await.expect("no-op");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_through_to_later_strategy() {
        let lookup = Arc::new(
            TableLookup::default().answer("Artist Song official", playable("Artist Song", "https://v/2")),
        );
        let pipeline = pipeline(lookup.clone(), 10);
        let mut song = Song::lazy("Artist - Song", Some("https://v/1".into()), UserId(1));

        pipeline.resolve(&mut song).await.expect("third attempt succeeds");

        assert!(!song.is_lazy);
        assert_eq!(song.stream_url.as_deref(), Some("https://cdn/Artist Song"));
        assert_eq!(song.canonical_page_url.as_deref(), Some("https://v/2"));
        assert_eq!(song.original_source_url.as_deref(), Some("https://v/2"));
        assert_eq!(
            lookup.queries(),
            vec!["https://v/1", "Artist Song audio", "Artist Song official"]
        );
    }

    #[tokio::test]
    async fn cache_hit_skips_lookup() {
        let lookup = Arc::new(TableLookup::default().answer("https://v/1", playable("T", "https://v/1")));
        let pipeline = pipeline(lookup.clone(), 5);

        let mut first = Song::lazy("T", Some("https://v/1".into()), UserId(1));
        pipeline.resolve(&mut first).await.expect("resolves");
        let mut second = Song::lazy("T", Some("https://v/1".into()), UserId(2));
        pipeline.resolve(&mut second).await.expect("cache hit");

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.stream_url, first.stream_url);
        assert_eq!(pipeline.stats().await.cache.hits, 1);
    }

    #[tokio::test]
    async fn exhausted_attempts_report_count_and_last_error() {
        let lookup = Arc::new(TableLookup::default());
        let pipeline = pipeline(lookup, 100);
        let mut song = Song::lazy("Gone (Deleted)", Some("https://v/9".into()), UserId(1));

        let err = pipeline.resolve(&mut song).await.unwrap_err();
        match err {
            CadenceError::Resolution {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 5);
                assert!(last_error.expect("last error").contains("Gone (Deleted)"));
            }
            other => panic!("expected Resolution, got {other:?}"),
        }
        assert!(song.is_lazy);
    }

    #[tokio::test]
    async fn result_without_stream_counts_as_failed_attempt() {
        let lookup = Arc::new(
            TableLookup::default()
                .answer(
                    "song audio",
                    LookupResponse::Entries(vec![None, Some(RawTrack::default())]),
                )
                .answer("song official", playable("song", "https://v/3")),
        );
        let pipeline = pipeline(lookup, 10);
        let mut song = Song::lazy("song", None, UserId(1));
        pipeline.resolve(&mut song).await.expect("second attempt");
        assert_eq!(song.canonical_page_url.as_deref(), Some("https://v/3"));
    }

    #[tokio::test]
    async fn open_circuit_aborts_remaining_attempts() {
        let lookup = Arc::new(TableLookup::default());
        let pipeline = pipeline(lookup.clone(), 2);
        let mut song = Song::lazy("anything", Some("https://v/0".into()), UserId(1));

        let err = pipeline.resolve(&mut song).await.unwrap_err();
        assert!(err.is_circuit_open());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
        assert!(!pipeline.dedup.is_pending("https://v/0"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolutions_share_one_lookup() {
        let lookup = Arc::new(
            TableLookup::default()
                .answer("https://v/shared", playable("Shared", "https://v/shared"))
                .with_delay(Duration::from_millis(50)),
        );
        let pipeline = Arc::new(pipeline(lookup.clone(), 5));

        let mut handles = Vec::new();
        for requester in 0..8 {
            let pipeline = Arc::clone(&pipeline);
            handles.push(tokio::spawn(async move {
                let mut song = Song::lazy("Shared", Some("https://v/shared".into()), UserId(requester));
                pipeline.resolve(&mut song).await.map(|_| song)
            }));
        }
        for handle in handles {
            let song = handle.await.expect("task").expect("resolved");
            assert_eq!(song.stream_url.as_deref(), Some("https://cdn/Shared"));
        }

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_text_is_single_result() {
        let lookup = Arc::new(TableLookup::default().answer("lofi beats", playable("Lofi", "https://v/l")));
        let pipeline = pipeline(lookup.clone(), 5);

        let songs = pipeline.search("  lofi beats ", UserId(3)).await.expect("search");
        assert_eq!(songs.len(), 1);
        assert!(songs[0].is_lazy);
        assert_eq!(songs[0].title, "Lofi");
        assert_eq!(songs[0].canonical_page_url.as_deref(), Some("https://v/l"));
        assert_eq!(songs[0].requester_id, UserId(3));

        let seen = lookup.seen.lock().expect("seen").clone();
        assert_eq!(seen[0].1.mode, LookupMode::Search { results: 1 });
    }

    #[tokio::test]
    async fn playlist_url_is_flat_and_capped() {
        let url = "https://v/playlist?list=PL1";
        let entries = (0..5)
            .map(|i| {
                Some(RawTrack {
                    title: Some(format!("Track {i}")),
                    page_url: Some(format!("https://v/{i}")),
                    ..Default::default()
                })
            })
            .chain(std::iter::once(None))
            .collect();
        let lookup = Arc::new(TableLookup::default().answer(url, LookupResponse::Entries(entries)));
        let pipeline = pipeline(lookup.clone(), 5).with_playlist_limit(3);

        let songs = pipeline.search(url, UserId(1)).await.expect("playlist");
        assert_eq!(songs.len(), 3);
        assert_eq!(songs[2].title, "Track 2");

        let seen = lookup.seen.lock().expect("seen").clone();
        assert!(seen[0].1.allow_playlist && seen[0].1.flat);
        assert_eq!(seen[0].1.playlist_limit, 3);
    }

    #[tokio::test]
    async fn empty_query_finds_nothing() {
        let lookup = Arc::new(TableLookup::default());
        let pipeline = pipeline(lookup.clone(), 5);
        assert!(pipeline.search("   ", UserId(1)).await.expect("ok").is_empty());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    /// Serves a fixed track list and records the links it was asked for.
    #[derive(Default)]
    struct FixedCatalog {
        tracks: Vec<CatalogTrack>,
        asked: Mutex<Vec<(CatalogKind, usize)>>,
        broken: bool,
    }

    impl FixedCatalog {
        fn with_tracks(names: impl IntoIterator<Item = String>) -> Self {
            Self {
                tracks: names
                    .into_iter()
                    .map(|name| CatalogTrack {
                        name,
                        artists: vec!["The Band".to_string()],
                        duration_ms: Some(200_500),
                    })
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for FixedCatalog {
        fn name(&self) -> &str {
            "fixed-catalog"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Catalog
        }
        async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), CadenceError> {
            Ok(())
        }
    }

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        async fn tracks(
            &self,
            link: &CatalogLink,
            limit: usize,
        ) -> Result<Vec<CatalogTrack>, CadenceError> {
            if let Ok(mut asked) = self.asked.lock() {
                asked.push((link.kind, limit));
            }
            if self.broken {
                return Err(CadenceError::catalog("catalog unreachable"));
            }
            Ok(self.tracks.clone())
        }
    }

    #[tokio::test]
    async fn catalog_track_link_becomes_search_song() {
        let lookup = Arc::new(TableLookup::default());
        let catalog = Arc::new(FixedCatalog::with_tracks(["Neon Lights".to_string()]));
        let pipeline = pipeline(lookup.clone(), 5).with_catalog(catalog.clone());

        let songs = pipeline
            .search("https://open.spotify.com/track/abc123?si=x", UserId(9))
            .await
            .expect("import");

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Neon Lights - The Band");
        assert_eq!(
            songs[0].canonical_page_url.as_deref(),
            Some("Neon Lights The Band official audio")
        );
        assert_eq!(songs[0].duration_seconds, Some(200));
        assert_eq!(songs[0].requester_id, UserId(9));
        assert!(songs[0].is_lazy);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
        assert_eq!(catalog.asked.lock().expect("asked")[0], (CatalogKind::Track, 100));
    }

    #[tokio::test]
    async fn catalog_playlist_is_capped_and_skips_unnamed_tracks() {
        let names = std::iter::once(String::new()).chain((0..150).map(|i| format!("Track {i}")));
        let catalog = Arc::new(FixedCatalog::with_tracks(names));
        let pipeline = pipeline(Arc::new(TableLookup::default()), 5).with_catalog(catalog.clone());

        let songs = pipeline
            .search("https://open.spotify.com/playlist/37i9dQZF", UserId(1))
            .await
            .expect("import");

        assert_eq!(songs.len(), 100);
        assert_eq!(songs[0].title, "Track 0 - The Band");
        assert_eq!(songs[99].title, "Track 99 - The Band");
        assert_eq!(catalog.asked.lock().expect("asked")[0].0, CatalogKind::Playlist);
    }

    #[tokio::test]
    async fn imported_catalog_song_resolves_through_title_search() {
        let lookup = Arc::new(
            TableLookup::default().answer("Neon Lights The Band audio", playable("Neon Lights", "https://v/n")),
        );
        let catalog = Arc::new(FixedCatalog::with_tracks(["Neon Lights".to_string()]));
        let pipeline = pipeline(lookup.clone(), 5).with_catalog(catalog);

        let mut songs = pipeline
            .search("https://open.spotify.com/album/1DFixLWu", UserId(1))
            .await
            .expect("import");
        pipeline.resolve(&mut songs[0]).await.expect("resolves");

        assert_eq!(songs[0].stream_url.as_deref(), Some("https://cdn/Neon Lights"));
        assert_eq!(lookup.queries(), vec!["Neon Lights The Band audio"]);
    }

    #[tokio::test]
    async fn catalog_link_without_catalog_or_with_failure_is_an_error() {
        let lookup = Arc::new(TableLookup::default());
        let unconfigured = pipeline(lookup.clone(), 5);
        let err = unconfigured
            .search("https://open.spotify.com/track/abc", UserId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CadenceError::Catalog { .. }));

        let broken = Arc::new(FixedCatalog {
            broken: true,
            ..Default::default()
        });
        let failing = pipeline(lookup.clone(), 5).with_catalog(broken);
        let err = failing
            .search("https://open.spotify.com/playlist/p", UserId(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("catalog unreachable"));

        let catalog = Arc::new(FixedCatalog::default());
        let artist = pipeline(lookup.clone(), 5).with_catalog(catalog.clone());
        assert!(
            artist
                .search("https://open.spotify.com/artist/0OdUWJ0s", UserId(1))
                .await
                .is_err()
        );
        assert!(catalog.asked.lock().expect("asked").is_empty());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }
}
