// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback coordination for the Cadence playback core.
//!
//! The [`PlaybackOrchestrator`] is the central coordinator that:
//! - Starts the current song, skipping unplayable ones within a retry budget
//! - Advances the queue when the transport reports end-of-stream
//! - Tops the queue up from the autoplay [`RecommendationBuffer`]
//! - Runs per-session idle and alone timers
//! - Drains every session on shutdown

pub mod autoplay;
pub mod orchestrator;
pub mod shutdown;
pub mod timers;

pub use autoplay::RecommendationBuffer;
pub use orchestrator::{Collaborators, EnqueueOutcome, PlayOutcome, PlaybackOrchestrator};
pub use shutdown::{drain_sessions, install_signal_handler};
pub use timers::{TimerKind, TimerRegistry};
