// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session playback queues.
//!
//! [`GuildQueueState`] holds one session's songs, cursor and flags and owns
//! all cursor arithmetic. [`GuildQueueStore`] maps session ids to states.
//!
//! The cursor always satisfies `0 <= cursor <= len`. `cursor == len` means
//! the queue is exhausted and waiting for more songs; the next song added
//! becomes current without a jump.

pub mod state;
pub mod store;

pub use state::{GuildQueueState, QueueSnapshot, is_unavailable_title};
pub use store::{GuildQueueStore, QueueSettings};
