// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport adapter and voice connection.
//!
//! `MockVoice` records every stream request and holds the pending
//! end-of-stream handle until the test finishes the song with
//! [`MockVoice::finish`], which signals from a plain OS thread the way a real
//! audio thread would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;

use cadence_core::traits::{EndOfStream, PluginAdapter, TransportAdapter, VoiceConnection};
use cadence_core::types::{AdapterType, ChannelId, HealthStatus, SessionId, StreamRequest};
use cadence_core::CadenceError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct VoiceState {
    active: bool,
    pending: Option<EndOfStream>,
    played: Vec<StreamRequest>,
    stops: usize,
    disconnected: bool,
}

/// A voice connection that never produces audio.
pub struct MockVoice {
    channel: ChannelId,
    failing: Vec<String>,
    state: Mutex<VoiceState>,
}

impl MockVoice {
    fn new(channel: ChannelId, failing: Vec<String>) -> Self {
        Self {
            channel,
            failing,
            state: Mutex::new(VoiceState::default()),
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Every stream request accepted so far.
    pub fn played(&self) -> Vec<StreamRequest> {
        lock(&self.state).played.clone()
    }

    /// Stream URL of the most recent request.
    pub fn last_stream_url(&self) -> Option<String> {
        lock(&self.state).played.last().map(|r| r.stream_url.clone())
    }

    pub fn play_count(&self) -> usize {
        lock(&self.state).played.len()
    }

    pub fn stop_count(&self) -> usize {
        lock(&self.state).stops
    }

    pub fn is_disconnected(&self) -> bool {
        lock(&self.state).disconnected
    }

    /// End the current stream naturally and wait until the end-of-stream
    /// event has been handled. Returns `false` if nothing was playing.
    pub async fn finish(&self) -> bool {
        self.finish_with(None).await
    }

    /// End the current stream with a transport error.
    pub async fn fail(&self, error: &str) -> bool {
        self.finish_with(Some(error.to_string())).await
    }

    async fn finish_with(&self, error: Option<String>) -> bool {
        let pending = {
            let mut state = lock(&self.state);
            state.active = false;
            state.pending.take()
        };
        let Some(end) = pending else {
            return false;
        };

        let (done_tx, done_rx) = oneshot::channel();
        std::thread::spawn(move || {
            end.signal(error);
            let _ = done_tx.send(());
        });
        done_rx.await.is_ok()
    }
}

#[async_trait]
impl VoiceConnection for MockVoice {
    fn play(&self, request: StreamRequest, on_end: EndOfStream) -> Result<(), CadenceError> {
        if self.failing.iter().any(|p| request.stream_url.contains(p.as_str())) {
            return Err(CadenceError::playback(format!(
                "cannot open stream {}",
                request.stream_url
            )));
        }
        let mut state = lock(&self.state);
        state.active = true;
        state.pending = Some(on_end);
        state.played.push(request);
        Ok(())
    }

    fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    fn stop(&self) {
        let pending = {
            let mut state = lock(&self.state);
            state.active = false;
            state.stops += 1;
            state.pending.take()
        };
        if let Some(end) = pending {
            end.signal(None);
        }
    }

    async fn disconnect(&self) -> Result<(), CadenceError> {
        lock(&self.state).disconnected = true;
        Ok(())
    }
}

/// A transport that hands out [`MockVoice`] connections.
#[derive(Default)]
pub struct MockTransport {
    voices: Mutex<HashMap<SessionId, Arc<MockVoice>>>,
    failing_streams: Mutex<Vec<String>>,
    refuse_connect: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `connect` fail.
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }

    /// Connections opened after this call refuse stream URLs containing `pattern`.
    pub fn fail_streams_matching(&self, pattern: &str) {
        lock(&self.failing_streams).push(pattern.to_string());
    }

    /// The most recent connection for `session`.
    pub fn voice(&self, session: SessionId) -> Option<Arc<MockVoice>> {
        lock(&self.voices).get(&session).cloned()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CadenceError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for MockTransport {
    async fn connect(
        &self,
        session: SessionId,
        channel: ChannelId,
    ) -> Result<Arc<dyn VoiceConnection>, CadenceError> {
        if self.refuse_connect {
            return Err(CadenceError::transport("voice gateway unreachable"));
        }
        let failing = lock(&self.failing_streams).clone();
        let voice = Arc::new(MockVoice::new(channel, failing));
        lock(&self.voices).insert(session, Arc::clone(&voice));
        Ok(voice)
    }
}
