// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport (voice) layer contracts and the end-of-stream handoff.
//!
//! The transport reports "track finished" from its own threads. It never
//! touches queue state: [`EndOfStream::signal`] enqueues a
//! [`TransportEvent::SongEnded`] for the coordination loop and waits until the
//! loop acknowledges it, so consecutive end events for one session are
//! processed strictly in order.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::CadenceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelId, SessionId, StreamRequest};

/// Events handed from transport threads to the coordination loop.
#[derive(Debug)]
pub enum TransportEvent {
    SongEnded {
        session: SessionId,
        error: Option<String>,
        ack: oneshot::Sender<()>,
    },
}

/// One-shot completion handle given to [`VoiceConnection::play`].
#[derive(Debug)]
pub struct EndOfStream {
    session: SessionId,
    events: mpsc::Sender<TransportEvent>,
}

impl EndOfStream {
    pub fn new(session: SessionId, events: mpsc::Sender<TransportEvent>) -> Self {
        Self { session, events }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Report that the stream finished and wait for the coordination loop to
    /// finish handling it.
    ///
    /// Blocks the calling thread when called from outside the async runtime.
    /// From inside the runtime the handoff is spawned instead, since blocking a
    /// runtime worker on the loop could deadlock it.
    pub fn signal(self, error: Option<String>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.signal_async(error));
            }
            Err(_) => {
                let session = self.session;
                let (ack_tx, ack_rx) = oneshot::channel();
                let event = TransportEvent::SongEnded {
                    session,
                    error,
                    ack: ack_tx,
                };
                if self.events.blocking_send(event).is_err() {
                    warn!(session_id = %session, "coordination loop closed, dropping end-of-stream");
                    return;
                }
                if ack_rx.blocking_recv().is_err() {
                    debug!(session_id = %session, "end-of-stream dropped without acknowledgement");
                }
            }
        }
    }

    /// Async form of [`signal`](Self::signal).
    pub async fn signal_async(self, error: Option<String>) {
        let session = self.session;
        let (ack_tx, ack_rx) = oneshot::channel();
        let event = TransportEvent::SongEnded {
            session,
            error,
            ack: ack_tx,
        };
        if self.events.send(event).await.is_err() {
            warn!(session_id = %session, "coordination loop closed, dropping end-of-stream");
            return;
        }
        if ack_rx.await.is_err() {
            debug!(session_id = %session, "end-of-stream dropped without acknowledgement");
        }
    }
}

/// A live voice connection for one session.
#[async_trait]
pub trait VoiceConnection: Send + Sync + 'static {
    /// Start streaming. `on_end` must be signalled exactly once when the
    /// stream finishes or is stopped.
    fn play(&self, request: StreamRequest, on_end: EndOfStream) -> Result<(), CadenceError>;

    /// Whether a stream is currently playing (or paused).
    fn is_active(&self) -> bool;

    /// Stop the current stream. The pending `on_end` fires as usual.
    fn stop(&self);

    /// Leave the voice channel.
    async fn disconnect(&self) -> Result<(), CadenceError>;
}

/// Adapter that opens voice connections.
#[async_trait]
pub trait TransportAdapter: PluginAdapter {
    async fn connect(
        &self,
        session: SessionId,
        channel: ChannelId,
    ) -> Result<Arc<dyn VoiceConnection>, CadenceError>;
}
