// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service assembly for embedding the playback core.
//!
//! The transport and lookup collaborators are provided by the embedding
//! application. [`PlaybackService`] wires them to the queue store, the
//! resolution pipeline and the orchestrator, then runs the event loop until
//! cancelled.

use std::sync::Arc;
use std::time::Duration;

use cadence_config::CadenceConfig;
use cadence_core::CadenceError;
use cadence_core::traits::{
    CatalogSource, HistoryAdapter, LookupAdapter, Notifier, RecommendationSource, StatsAdapter, TransportAdapter,
};
use cadence_player::{Collaborators, PlaybackOrchestrator, RecommendationBuffer, shutdown};
use cadence_prometheus::PrometheusAdapter;
use cadence_queue::{GuildQueueStore, QueueSettings};
use cadence_resolver::SongResolutionPipeline;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long shutdown waits for sessions to disconnect.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// How often the session gauge is refreshed.
const GAUGE_INTERVAL: Duration = Duration::from_secs(5);

/// External collaborators supplied by the embedder.
pub struct ServiceParts {
    pub lookup: Arc<dyn LookupAdapter>,
    pub transport: Arc<dyn TransportAdapter>,
    pub notifier: Arc<dyn Notifier>,
    pub history: Option<Arc<dyn HistoryAdapter>>,
    pub stats: Option<Arc<dyn StatsAdapter>>,
    pub recommendations: Option<Arc<dyn RecommendationSource>>,
    pub secondary_recommendations: Option<Arc<dyn RecommendationSource>>,
    pub catalog: Option<Arc<dyn CatalogSource>>,
}

impl ServiceParts {
    /// The three collaborators playback cannot run without.
    pub fn new(
        lookup: Arc<dyn LookupAdapter>,
        transport: Arc<dyn TransportAdapter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            lookup,
            transport,
            notifier,
            history: None,
            stats: None,
            recommendations: None,
            secondary_recommendations: None,
            catalog: None,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryAdapter>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsAdapter>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Enable autoplay with a primary and an optional fallback source.
    pub fn with_recommendations(
        mut self,
        primary: Arc<dyn RecommendationSource>,
        secondary: Option<Arc<dyn RecommendationSource>>,
    ) -> Self {
        self.recommendations = Some(primary);
        self.secondary_recommendations = secondary;
        self
    }

    /// Accept catalog links (tracks, playlists, albums) in search queries.
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }
}

/// A running playback core.
pub struct PlaybackService {
    orchestrator: Arc<PlaybackOrchestrator>,
    cancel: CancellationToken,
    event_loop: JoinHandle<()>,
    gauge: JoinHandle<()>,
}

impl PlaybackService {
    /// Build the playback stack and spawn its event loop.
    ///
    /// Must be called inside a Tokio runtime. The loop stops and drains
    /// every session once `cancel` fires.
    pub fn start(config: &CadenceConfig, parts: ServiceParts, cancel: CancellationToken) -> Self {
        let store = Arc::new(GuildQueueStore::new(QueueSettings::from_config(config)));
        let mut pipeline = SongResolutionPipeline::from_config(parts.lookup, config);
        match parts.catalog {
            Some(catalog) => pipeline = pipeline.with_catalog(catalog),
            None => debug!("no catalog source configured, catalog links are rejected"),
        }
        let pipeline = Arc::new(pipeline);

        let recommendations = parts.recommendations.map(|primary| {
            RecommendationBuffer::new(primary, parts.secondary_recommendations, &config.autoplay)
        });
        if recommendations.is_none() {
            debug!("no recommendation source configured, autoplay cannot refill");
        }

        let (orchestrator, events) = PlaybackOrchestrator::new(
            config,
            store,
            pipeline,
            Collaborators {
                transport: parts.transport,
                notifier: parts.notifier,
                history: parts.history,
                stats: parts.stats,
                recommendations,
            },
        );

        let event_loop = tokio::spawn(Arc::clone(&orchestrator).run(events, cancel.clone()));
        let gauge = tokio::spawn(session_gauge(Arc::clone(&orchestrator), cancel.clone()));

        info!(
            max_retries = config.player.max_retries,
            cache_size = config.cache.max_size,
            max_concurrent = config.pool.max_concurrent,
            "playback service started"
        );

        Self {
            orchestrator,
            cancel,
            event_loop,
            gauge,
        }
    }

    /// The orchestrator commands are issued against.
    pub fn orchestrator(&self) -> &Arc<PlaybackOrchestrator> {
        &self.orchestrator
    }

    /// Wait for the event loop to finish after cancellation.
    pub async fn wait(self) -> Result<(), CadenceError> {
        let result = self.event_loop.await;
        self.gauge.abort();
        result.map_err(|e| CadenceError::Internal(format!("playback loop panicked: {e}")))
    }

    /// Cancel the loop and wait up to the shutdown timeout for it to drain.
    ///
    /// Returns `false` if the drain did not finish in time.
    pub async fn shutdown(self) -> bool {
        self.cancel.cancel();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "playback loop ended abnormally");
                false
            }
            Err(_) => {
                warn!(
                    timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                    "playback loop did not drain in time"
                );
                false
            }
        }
    }
}

/// Run the playback core until SIGTERM or Ctrl+C.
///
/// When no statistics sink is supplied, the Prometheus recorder is installed
/// and used as one.
pub async fn run_until_signal(config: CadenceConfig, mut parts: ServiceParts) -> Result<(), CadenceError> {
    info!("starting cadence playback core");

    if parts.stats.is_none() {
        match PrometheusAdapter::new() {
            Ok(adapter) => {
                info!("prometheus metrics enabled");
                parts.stats = Some(Arc::new(adapter));
            }
            Err(e) => warn!(error = %e, "prometheus metrics unavailable"),
        }
    }

    let cancel = shutdown::install_signal_handler();
    let service = PlaybackService::start(&config, parts, cancel);
    service.wait().await?;

    info!("cadence playback core shut down");
    Ok(())
}

/// Refresh the active-session gauge until cancelled.
async fn session_gauge(orchestrator: Arc<PlaybackOrchestrator>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(GAUGE_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                cadence_prometheus::set_active_sessions(orchestrator.store().session_count());
            }
            _ = cancel.cancelled() => {
                debug!("session gauge shutting down");
                break;
            }
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set. Calling this twice is harmless.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cadence={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
