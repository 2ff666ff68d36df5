// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for the Cadence playback core.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. The adapter also
//! serves as a statistics collaborator, counting completed plays.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use cadence_core::traits::{PluginAdapter, StatsAdapter};
use cadence_core::types::{AdapterType, HealthStatus, SessionId, SongPlay, UserId};
use cadence_core::CadenceError;

pub use recording::{
    record_autoplay_added, record_breaker_transition, record_cache_lookup, record_lookup_call,
    record_resolution_latency, record_song_failed, record_song_play, record_song_started,
    register_metrics, set_active_lookups, set_active_sessions,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Create a new PrometheusAdapter.
    ///
    /// Installs the Prometheus recorder globally. Only one recorder can be
    /// installed per process. Returns an error if a recorder is already installed.
    pub fn new() -> Result<Self, CadenceError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            CadenceError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wrap an existing handle without installing a global recorder.
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Stats
    }

    async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CadenceError> {
        Ok(())
    }
}

#[async_trait]
impl StatsAdapter for PrometheusAdapter {
    async fn record_song_play(
        &self,
        session: SessionId,
        play: &SongPlay,
    ) -> Result<(), CadenceError> {
        tracing::trace!(session_id = %session, title = %play.title, "song play recorded");
        recording::record_song_play(play.requester_id == UserId::AUTOPLAY);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_adapter() -> PrometheusAdapter {
        let recorder = PrometheusBuilder::new().build_recorder();
        PrometheusAdapter::from_handle(recorder.handle())
    }

    #[tokio::test]
    async fn adapter_identity() {
        let adapter = local_adapter();
        assert_eq!(adapter.name(), "prometheus");
        assert_eq!(adapter.adapter_type(), AdapterType::Stats);
        assert_eq!(
            adapter.health_check().await.expect("health"),
            HealthStatus::Healthy
        );
    }

    #[tokio::test]
    async fn record_song_play_succeeds_without_global_recorder() {
        let adapter = local_adapter();
        let play = SongPlay {
            title: "Song".into(),
            requester_id: UserId(4),
            duration_seconds: Some(100),
            requester_name: None,
        };
        adapter
            .record_song_play(SessionId(1), &play)
            .await
            .expect("recording never fails");
    }

    #[test]
    fn song_plays_split_by_requester_kind() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            recording::record_song_play(true);
            recording::record_song_play(false);
            recording::record_song_play(false);
        });
        let rendered = handle.render();
        assert!(rendered.contains(r#"cadence_song_plays_total{requester="user"} 2"#));
        assert!(rendered.contains(r#"cadence_song_plays_total{requester="autoplay"} 1"#));
    }
}
