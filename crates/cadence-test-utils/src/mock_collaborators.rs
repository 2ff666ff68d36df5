// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock recommendation, history, statistics and notice collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cadence_core::traits::{
    CatalogSource, HistoryAdapter, Notifier, PluginAdapter, RecommendationSource, StatsAdapter,
};
use cadence_core::types::{
    AdapterType, CatalogLink, CatalogTrack, HealthStatus, PlayRecord, PlaybackNotice,
    Recommendation, SessionId, SongPlay,
};
use cadence_core::CadenceError;

macro_rules! mock_plugin_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
                Ok(HealthStatus::Healthy)
            }

            async fn shutdown(&self) -> Result<(), CadenceError> {
                Ok(())
            }
        }
    };
}

/// Poll `check` every few milliseconds until it holds or `timeout` passes.
pub async fn eventually<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Build a recommendation whose URL follows the mock lookup's page URLs.
pub fn recommendation(title: &str) -> Recommendation {
    Recommendation {
        title: title.to_string(),
        url: crate::mock_lookup::page_url_for(title),
        duration_seconds: Some(200),
        thumbnail_url: None,
        relevance_score: 0.9,
    }
}

/// A recommendation source returning a fixed list.
pub struct MockRecommendations {
    items: Mutex<Vec<Recommendation>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    seeds: Mutex<Vec<String>>,
}

impl MockRecommendations {
    pub fn new(titles: &[&str]) -> Self {
        Self {
            items: Mutex::new(titles.iter().map(|t| recommendation(t)).collect()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            seeds: Mutex::new(Vec::new()),
        }
    }

    /// A source that always errors.
    pub fn failing() -> Self {
        let source = Self::new(&[]);
        source.failing.store(true, Ordering::SeqCst);
        source
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Seed URLs requested so far.
    pub async fn seeds(&self) -> Vec<String> {
        self.seeds.lock().await.clone()
    }
}

mock_plugin_adapter!(MockRecommendations, "mock-recommendations", AdapterType::Recommendation);

#[async_trait]
impl RecommendationSource for MockRecommendations {
    async fn related(
        &self,
        seed_url: &str,
        count: usize,
    ) -> Result<Vec<Recommendation>, CadenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seeds.lock().await.push(seed_url.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(CadenceError::Recommendation {
                message: "recommendations unavailable".into(),
                source: None,
            });
        }
        Ok(self.items.lock().await.iter().take(count).cloned().collect())
    }
}

/// A music catalog serving the same tracks for every link.
pub struct MockCatalog {
    tracks: Vec<CatalogTrack>,
    links: Mutex<Vec<CatalogLink>>,
}

impl MockCatalog {
    /// Tracks named `names`, all by `artist`.
    pub fn new(artist: &str, names: &[&str]) -> Self {
        Self {
            tracks: names
                .iter()
                .map(|name| CatalogTrack {
                    name: name.to_string(),
                    artists: vec![artist.to_string()],
                    duration_ms: Some(180_000),
                })
                .collect(),
            links: Mutex::new(Vec::new()),
        }
    }

    /// Links requested so far.
    pub async fn links(&self) -> Vec<CatalogLink> {
        self.links.lock().await.clone()
    }
}

mock_plugin_adapter!(MockCatalog, "mock-catalog", AdapterType::Catalog);

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn tracks(
        &self,
        link: &CatalogLink,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CadenceError> {
        self.links.lock().await.push(link.clone());
        Ok(self.tracks.iter().take(limit).cloned().collect())
    }
}

/// Listening history kept in memory.
#[derive(Default)]
pub struct MockHistory {
    plays: Mutex<Vec<(SessionId, PlayRecord)>>,
    seeded: Mutex<HashMap<SessionId, String>>,
}

impl MockHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `url` was the last thing played in `session`.
    pub async fn seed_last_played(&self, session: SessionId, url: &str) {
        self.seeded.lock().await.insert(session, url.to_string());
    }

    pub async fn plays(&self) -> Vec<(SessionId, PlayRecord)> {
        self.plays.lock().await.clone()
    }

    pub fn play_count(&self) -> usize {
        self.plays.try_lock().map(|plays| plays.len()).unwrap_or(0)
    }
}

mock_plugin_adapter!(MockHistory, "mock-history", AdapterType::History);

#[async_trait]
impl HistoryAdapter for MockHistory {
    async fn record_play(&self, session: SessionId, record: &PlayRecord) -> Result<(), CadenceError> {
        self.plays.lock().await.push((session, record.clone()));
        Ok(())
    }

    async fn last_played_url(&self, session: SessionId) -> Result<Option<String>, CadenceError> {
        let recorded = self
            .plays
            .lock()
            .await
            .iter()
            .rev()
            .find(|(s, _)| *s == session)
            .map(|(_, record)| record.url.clone());
        match recorded {
            Some(url) => Ok(Some(url)),
            None => Ok(self.seeded.lock().await.get(&session).cloned()),
        }
    }
}

/// Statistics sink that records every play.
#[derive(Default)]
pub struct MockStats {
    plays: Mutex<Vec<(SessionId, SongPlay)>>,
    fail: AtomicBool,
}

impl MockStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail.
    pub fn failing() -> Self {
        let stats = Self::default();
        stats.fail.store(true, Ordering::SeqCst);
        stats
    }

    pub async fn plays(&self) -> Vec<(SessionId, SongPlay)> {
        self.plays.lock().await.clone()
    }

    pub fn play_count(&self) -> usize {
        self.plays.try_lock().map(|plays| plays.len()).unwrap_or(0)
    }
}

mock_plugin_adapter!(MockStats, "mock-stats", AdapterType::Stats);

#[async_trait]
impl StatsAdapter for MockStats {
    async fn record_song_play(&self, session: SessionId, play: &SongPlay) -> Result<(), CadenceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CadenceError::Internal("stats store offline".into()));
        }
        self.plays.lock().await.push((session, play.clone()));
        Ok(())
    }
}

/// Notifier that keeps every notice for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: std::sync::Mutex<Vec<(SessionId, PlaybackNotice)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<(SessionId, PlaybackNotice)>> {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Notices sent to `session`, in order.
    pub fn notices(&self, session: SessionId) -> Vec<PlaybackNotice> {
        self.guard()
            .iter()
            .filter(|(s, _)| *s == session)
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    /// Whether any notice sent to `session` satisfies `predicate`.
    pub fn saw(&self, session: SessionId, predicate: impl Fn(&PlaybackNotice) -> bool) -> bool {
        self.guard().iter().any(|(s, notice)| *s == session && predicate(notice))
    }

    pub fn clear(&self) {
        self.guard().clear();
    }
}

mock_plugin_adapter!(RecordingNotifier, "recording-notifier", AdapterType::Notifier);

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, session: SessionId, notice: PlaybackNotice) -> Result<(), CadenceError> {
        self.guard().push((session, notice));
        Ok(())
    }
}
