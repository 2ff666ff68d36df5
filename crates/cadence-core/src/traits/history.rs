// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listening history collaborator.

use async_trait::async_trait;

use crate::error::CadenceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{PlayRecord, SessionId};

/// Per-session record of recently played songs.
#[async_trait]
pub trait HistoryAdapter: PluginAdapter {
    /// Record that a song started playing.
    async fn record_play(&self, session: SessionId, record: &PlayRecord)
        -> Result<(), CadenceError>;

    /// URL of the most recently played song, if any.
    async fn last_played_url(&self, session: SessionId) -> Result<Option<String>, CadenceError>;
}
