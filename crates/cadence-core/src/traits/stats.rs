// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statistics collaborator.

use async_trait::async_trait;

use crate::error::CadenceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SessionId, SongPlay};

/// Fire-and-forget play statistics. Failures are logged by the caller, never propagated.
#[async_trait]
pub trait StatsAdapter: PluginAdapter {
    async fn record_song_play(&self, session: SessionId, play: &SongPlay)
        -> Result<(), CadenceError>;
}
