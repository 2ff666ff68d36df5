// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Song resolution for the Cadence playback core.
//!
//! Turns lazy queue entries into playable songs: a TTL+LRU cache in front of
//! an in-flight dedup guard, then an ordered list of search strategies run
//! through the circuit breaker and the bounded lookup pool.

pub mod cache;
pub mod dedup;
pub mod pipeline;
pub mod strategy;

pub use cache::{CacheStats, SongCache, normalize_key};
pub use dedup::{PendingGuard, ResolutionDeduplicator};
pub use pipeline::{PipelineStats, SongResolutionPipeline};
pub use strategy::{SearchAttempt, build_attempts, clean_title};
