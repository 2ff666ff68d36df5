// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cadence playback core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Cadence configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CadenceConfig {
    /// Playback behavior: volume bounds, retries, timers.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Resolved-song cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream lookup circuit breaker.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Bounded lookup pool.
    #[serde(default)]
    pub pool: PoolConfig,

    /// In-flight resolution dedup.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Autoplay recommendation buffer.
    #[serde(default)]
    pub autoplay: AutoplayConfig,

    /// Query search.
    #[serde(default)]
    pub search: SearchConfig,
}

/// Playback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Volume for newly created sessions.
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    #[serde(default = "default_min_volume")]
    pub min_volume: f32,

    #[serde(default = "default_max_volume")]
    pub max_volume: f32,

    /// Consecutive failed songs tolerated before playback gives up.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Pause between failed songs, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Disconnect after this long with nothing playing.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Disconnect after this long alone in the voice channel.
    #[serde(default = "default_alone_timeout_secs")]
    pub alone_timeout_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_volume: default_volume(),
            min_volume: default_min_volume(),
            max_volume: default_max_volume(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            alone_timeout_secs: default_alone_timeout_secs(),
        }
    }
}

impl PlayerConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn alone_timeout(&self) -> Duration {
        Duration::from_secs(self.alone_timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_volume() -> f32 {
    0.5
}

fn default_min_volume() -> f32 {
    0.1
}

fn default_max_volume() -> f32 {
    2.0
}

fn default_max_retries() -> usize {
    5
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_alone_timeout_secs() -> u64 {
    60
}

/// Song cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of resolved songs kept.
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,

    /// Entry lifetime in seconds. Stream URLs expire upstream after a few hours.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_cache_max_size() -> usize {
    500
}

fn default_cache_ttl_secs() -> u64 {
    6 * 60 * 60
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a probe is allowed.
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
        }
    }
}

impl BreakerConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout_secs() -> u64 {
    60
}

/// Lookup pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Maximum number of concurrent upstream lookups.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    5
}

/// Dedup wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// How often a waiter re-checks the cache, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting on another resolver after this long, in milliseconds.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

impl DedupConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_max_wait_ms() -> u64 {
    10_000
}

/// Autoplay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoplayConfig {
    /// Whether new sessions start with autoplay on.
    #[serde(default)]
    pub enabled_by_default: bool,

    /// Songs appended per top-up.
    #[serde(default = "default_songs_per_batch")]
    pub songs_per_batch: usize,

    /// Top up when this many or fewer songs remain after the current one.
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Candidates fetched per wanted song, to survive duplicate filtering.
    #[serde(default = "default_fetch_multiplier")]
    pub fetch_multiplier: usize,

    /// Lifetime of cached recommendation lists, in seconds.
    #[serde(default = "default_autoplay_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached recommendation lists.
    #[serde(default = "default_autoplay_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: false,
            songs_per_batch: default_songs_per_batch(),
            low_water_mark: default_low_water_mark(),
            fetch_multiplier: default_fetch_multiplier(),
            cache_ttl_secs: default_autoplay_cache_ttl_secs(),
            cache_capacity: default_autoplay_cache_capacity(),
        }
    }
}

impl AutoplayConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_songs_per_batch() -> usize {
    5
}

fn default_low_water_mark() -> usize {
    2
}

fn default_fetch_multiplier() -> usize {
    3
}

fn default_autoplay_cache_ttl_secs() -> u64 {
    60 * 60
}

fn default_autoplay_cache_capacity() -> usize {
    50
}

/// Query search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Maximum entries taken from one playlist URL.
    #[serde(default = "default_playlist_limit")]
    pub playlist_limit: usize,

    /// Maximum tracks imported from one catalog playlist or album link.
    #[serde(default = "default_catalog_limit")]
    pub catalog_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            playlist_limit: default_playlist_limit(),
            catalog_limit: default_catalog_limit(),
        }
    }
}

fn default_playlist_limit() -> usize {
    50
}

fn default_catalog_limit() -> usize {
    100
}
