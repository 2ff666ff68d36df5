// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete playback stack (queue store,
//! resolution pipeline, orchestrator and its event loop) on top of mock
//! collaborators.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use cadence_config::CadenceConfig;
use cadence_core::types::{ChannelId, SessionId, UserId};
use cadence_core::CadenceError;
use cadence_player::{
    Collaborators, EnqueueOutcome, PlaybackOrchestrator, RecommendationBuffer,
};
use cadence_queue::{GuildQueueStore, QueueSettings};
use cadence_resolver::SongResolutionPipeline;

use crate::mock_collaborators::{
    MockCatalog, MockHistory, MockRecommendations, MockStats, RecordingNotifier,
};
use crate::mock_lookup::MockLookup;
use crate::mock_transport::{MockTransport, MockVoice};

/// Requester id used by [`TestHarness::enqueue`].
pub const TEST_USER: UserId = UserId(42);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: CadenceConfig,
    lookup: MockLookup,
    transport: MockTransport,
    stats: MockStats,
    recommendations: Option<MockRecommendations>,
    secondary: Option<MockRecommendations>,
    catalog: Option<MockCatalog>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = CadenceConfig::default();
        config.player.retry_backoff_ms = 1;
        config.dedup.poll_interval_ms = 5;
        config.dedup.max_wait_ms = 2_000;
        Self {
            config,
            lookup: MockLookup::new(),
            transport: MockTransport::new(),
            stats: MockStats::new(),
            recommendations: None,
            secondary: None,
            catalog: None,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: CadenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Adjust the configuration in place.
    pub fn configure(mut self, edit: impl FnOnce(&mut CadenceConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn with_lookup(mut self, lookup: MockLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_stats(mut self, stats: MockStats) -> Self {
        self.stats = stats;
        self
    }

    /// Enable the autoplay buffer with a primary recommendation source.
    pub fn with_recommendations(mut self, source: MockRecommendations) -> Self {
        self.recommendations = Some(source);
        self
    }

    /// Add a secondary recommendation source.
    pub fn with_secondary_recommendations(mut self, source: MockRecommendations) -> Self {
        self.secondary = Some(source);
        self
    }

    /// Import catalog links through `catalog`.
    pub fn with_catalog(mut self, catalog: MockCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Build the stack and start the orchestrator's event loop.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self) -> TestHarness {
        let config = self.config;
        let lookup = Arc::new(self.lookup);
        let transport = Arc::new(self.transport);
        let history = Arc::new(MockHistory::new());
        let stats = Arc::new(self.stats);
        let notifier = Arc::new(RecordingNotifier::new());
        let recommendations = self.recommendations.map(Arc::new);
        let secondary = self.secondary.map(Arc::new);
        let catalog = self.catalog.map(Arc::new);

        let buffer = recommendations.as_ref().map(|primary| {
            RecommendationBuffer::new(
                primary.clone(),
                secondary
                    .clone()
                    .map(|s| s as Arc<dyn cadence_core::traits::RecommendationSource>),
                &config.autoplay,
            )
        });

        let store = Arc::new(GuildQueueStore::new(QueueSettings::from_config(&config)));
        let mut pipeline = SongResolutionPipeline::from_config(lookup.clone(), &config);
        if let Some(catalog) = catalog.clone() {
            pipeline = pipeline.with_catalog(catalog);
        }
        let pipeline = Arc::new(pipeline);
        let (orchestrator, events) = PlaybackOrchestrator::new(
            &config,
            store,
            pipeline,
            Collaborators {
                transport: transport.clone(),
                notifier: notifier.clone(),
                history: Some(history.clone()),
                stats: Some(stats.clone()),
                recommendations: buffer,
            },
        );

        let cancel = CancellationToken::new();
        let loop_handle = tokio::spawn(Arc::clone(&orchestrator).run(events, cancel.clone()));

        TestHarness {
            orchestrator,
            lookup,
            transport,
            history,
            stats,
            notifier,
            recommendations,
            catalog,
            config,
            cancel,
            loop_handle: Some(loop_handle),
        }
    }
}

/// A complete playback environment with mock collaborators.
pub struct TestHarness {
    pub orchestrator: Arc<PlaybackOrchestrator>,
    pub lookup: Arc<MockLookup>,
    pub transport: Arc<MockTransport>,
    pub history: Arc<MockHistory>,
    pub stats: Arc<MockStats>,
    pub notifier: Arc<RecordingNotifier>,
    pub recommendations: Option<Arc<MockRecommendations>>,
    pub catalog: Option<Arc<MockCatalog>>,
    pub config: CadenceConfig,
    cancel: CancellationToken,
    loop_handle: Option<JoinHandle<()>>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Join the voice channel numbered like the session.
    pub async fn join(&self, session: SessionId) -> Result<(), CadenceError> {
        self.orchestrator.join(session, ChannelId(session.0)).await
    }

    /// Enqueue `query` as [`TEST_USER`].
    pub async fn enqueue(&self, session: SessionId, query: &str) -> Result<EnqueueOutcome, CadenceError> {
        self.orchestrator.enqueue(session, query, TEST_USER).await
    }

    /// The session's current mock voice connection.
    pub fn voice(&self, session: SessionId) -> Option<Arc<MockVoice>> {
        self.transport.voice(session)
    }

    /// Title of the session's current song.
    pub fn current_title(&self, session: SessionId) -> Option<String> {
        self.orchestrator
            .store()
            .current_song(session)
            .map(|song| song.title)
    }

    /// Stop the event loop and wait for it to drain.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.loop_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
