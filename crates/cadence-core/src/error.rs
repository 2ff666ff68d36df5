// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cadence playback core.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Cadence adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CadenceError {
    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// No playable stream was found after exhausting every search strategy.
    #[error("failed to resolve `{title}` after {attempts} attempts{}", last_error_suffix(.last_error.as_deref()))]
    Resolution {
        title: String,
        attempts: usize,
        last_error: Option<String>,
    },

    /// The upstream lookup service is degraded and calls are short-circuited.
    #[error("upstream lookup temporarily unavailable, retry in {retry_after:?}")]
    CircuitOpen { retry_after: Duration },

    /// There is nothing in the queue to act on.
    #[error("queue is empty")]
    QueueEmpty,

    /// A queue position outside the current queue bounds.
    #[error("index {index} is out of range for a queue of {len} songs")]
    InvalidIndex { index: usize, len: usize },

    /// The cursor is already at the first song.
    #[error("no previous song")]
    NoPreviousSong,

    /// The transport could not create a playable stream.
    #[error("playback creation failed: {message}")]
    PlaybackCreation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Upstream lookup (extraction) failure for a single call.
    #[error("lookup failed: {message}")]
    Lookup {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport layer errors (connect, disconnect).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Music catalog link import failure.
    #[error("catalog error: {message}")]
    Catalog {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Recommendation source errors.
    #[error("recommendation error: {message}")]
    Recommendation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The session has no active transport connection.
    #[error("session {session} is not connected")]
    NotConnected { session: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

fn last_error_suffix(last_error: Option<&str>) -> String {
    match last_error {
        Some(err) => format!(" (last error: {err})"),
        None => String::new(),
    }
}

impl CadenceError {
    /// Build a lookup error from a message.
    pub fn lookup(message: impl Into<String>) -> Self {
        CadenceError::Lookup {
            message: message.into(),
            source: None,
        }
    }

    /// Build a playback creation error from a message.
    pub fn playback(message: impl Into<String>) -> Self {
        CadenceError::PlaybackCreation {
            message: message.into(),
            source: None,
        }
    }

    /// Build a transport error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        CadenceError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Build a catalog error from a message.
    pub fn catalog(message: impl Into<String>) -> Self {
        CadenceError::Catalog {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for the circuit-open short-circuit.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CadenceError::CircuitOpen { .. })
    }

    /// Short text suitable for showing to the person who issued the command.
    pub fn user_message(&self) -> String {
        match self {
            CadenceError::Resolution { title, attempts, .. } => {
                format!("Could not find a playable stream for **{title}** after {attempts} attempts.")
            }
            CadenceError::CircuitOpen { .. } => {
                "The music lookup service is having trouble. Try again shortly.".to_string()
            }
            CadenceError::QueueEmpty => "The queue is empty.".to_string(),
            CadenceError::InvalidIndex { len, .. } => {
                format!("That position is out of range (queue has {len} songs).")
            }
            CadenceError::NoPreviousSong => "No previous song available.".to_string(),
            CadenceError::PlaybackCreation { .. } => "Could not start that song.".to_string(),
            CadenceError::Catalog { .. } => "Couldn't read any tracks from that link.".to_string(),
            CadenceError::NotConnected { .. } => "I'm not in a voice channel.".to_string(),
            _ => "Something went wrong.".to_string(),
        }
    }
}
