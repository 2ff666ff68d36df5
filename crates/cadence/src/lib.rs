// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cadence playback core.
//!
//! Re-exports the building blocks and the [`serve::PlaybackService`] that
//! wires them together for an embedding application.

pub mod serve;

pub use cadence_config::CadenceConfig;
pub use cadence_core::{CadenceError, PlaybackNotice, SessionId, Song};
pub use cadence_player::{EnqueueOutcome, PlayOutcome, PlaybackOrchestrator};
pub use serve::{PlaybackService, ServiceParts, init_tracing, run_until_signal};
