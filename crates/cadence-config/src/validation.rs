// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as ordered volume bounds and non-zero capacities.

use crate::diagnostic::ConfigError;
use crate::model::CadenceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CadenceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let player = &config.player;

    if !LOG_LEVELS.contains(&player.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "player.log_level `{}` must be one of {}",
                player.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if player.min_volume <= 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "player.min_volume must be greater than 0, got {}",
                player.min_volume
            ),
        });
    }

    if player.min_volume > player.max_volume {
        errors.push(ConfigError::Validation {
            message: format!(
                "player.min_volume ({}) must not exceed player.max_volume ({})",
                player.min_volume, player.max_volume
            ),
        });
    } else if !(player.min_volume..=player.max_volume).contains(&player.default_volume) {
        errors.push(ConfigError::Validation {
            message: format!(
                "player.default_volume ({}) must lie within [{}, {}]",
                player.default_volume, player.min_volume, player.max_volume
            ),
        });
    }

    let non_zero = [
        ("player.max_retries", player.max_retries as u64),
        ("cache.max_size", config.cache.max_size as u64),
        ("cache.ttl_secs", config.cache.ttl_secs),
        (
            "breaker.failure_threshold",
            u64::from(config.breaker.failure_threshold),
        ),
        ("pool.max_concurrent", config.pool.max_concurrent as u64),
        ("dedup.poll_interval_ms", config.dedup.poll_interval_ms),
        ("autoplay.songs_per_batch", config.autoplay.songs_per_batch as u64),
        ("autoplay.fetch_multiplier", config.autoplay.fetch_multiplier as u64),
        ("autoplay.cache_capacity", config.autoplay.cache_capacity as u64),
        ("search.playlist_limit", config.search.playlist_limit as u64),
        ("search.catalog_limit", config.search.catalog_limit as u64),
    ];
    for (key, value) in non_zero {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than 0"),
            });
        }
    }

    if config.dedup.max_wait_ms < config.dedup.poll_interval_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "dedup.max_wait_ms ({}) must be at least dedup.poll_interval_ms ({})",
                config.dedup.max_wait_ms, config.dedup.poll_interval_ms
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
