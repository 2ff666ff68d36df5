// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of user-visible playback notices.

use async_trait::async_trait;

use crate::error::CadenceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{PlaybackNotice, SessionId};

/// Presents playback notices to the people in a session.
///
/// Formatting and delivery failures are the notifier's concern; the core logs
/// a returned error and moves on.
#[async_trait]
pub trait Notifier: PluginAdapter {
    async fn notify(&self, session: SessionId, notice: PlaybackNotice)
        -> Result<(), CadenceError>;
}
