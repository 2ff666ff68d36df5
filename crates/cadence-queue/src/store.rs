// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-keyed queue store.
//!
//! Every operation runs a closure against one session's state while holding
//! that map shard's lock, and never suspends while doing so.

use dashmap::DashMap;
use tracing::debug;

use cadence_config::CadenceConfig;
use cadence_core::CadenceError;
use cadence_core::types::{SessionId, Song, SongId};

use crate::state::{GuildQueueState, QueueSnapshot};

/// Defaults applied to newly created session queues.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueSettings {
    pub default_volume: f32,
    pub min_volume: f32,
    pub max_volume: f32,
    pub autoplay_by_default: bool,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            min_volume: 0.1,
            max_volume: 2.0,
            autoplay_by_default: false,
        }
    }
}

impl QueueSettings {
    pub fn from_config(config: &CadenceConfig) -> Self {
        Self {
            default_volume: config.player.default_volume,
            min_volume: config.player.min_volume,
            max_volume: config.player.max_volume,
            autoplay_by_default: config.autoplay.enabled_by_default,
        }
    }
}

/// One [`GuildQueueState`] per session, created on first write.
#[derive(Debug, Default)]
pub struct GuildQueueStore {
    sessions: DashMap<SessionId, GuildQueueState>,
    settings: QueueSettings,
}

impl GuildQueueStore {
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            sessions: DashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    /// Run `f` against the session's queue, creating it if needed.
    pub fn with_queue<R>(&self, session: SessionId, f: impl FnOnce(&mut GuildQueueState) -> R) -> R {
        let mut created = false;
        let result = {
            let mut entry = self.sessions.entry(session).or_insert_with(|| {
                created = true;
                GuildQueueState::new(
                    self.settings.default_volume.clamp(self.settings.min_volume, self.settings.max_volume),
                    self.settings.autoplay_by_default,
                )
            });
            f(entry.value_mut())
        };
        if created {
            debug!(session_id = %session, "queue created");
            cadence_prometheus::set_active_sessions(self.sessions.len());
        }
        result
    }

    /// Run `f` against the session's queue if it exists.
    pub fn read<R>(&self, session: SessionId, f: impl FnOnce(&GuildQueueState) -> R) -> Option<R> {
        self.sessions.get(&session).map(|queue| f(queue.value()))
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.sessions.contains_key(&session)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Append songs and return the queue length before the append.
    pub fn add_songs(&self, session: SessionId, songs: Vec<Song>) -> usize {
        self.with_queue(session, |queue| queue.add_songs(songs))
    }

    pub fn current_song(&self, session: SessionId) -> Option<Song> {
        self.read(session, |queue| queue.current().cloned()).flatten()
    }

    pub fn remove_song(&self, session: SessionId, index: usize) -> Result<Song, CadenceError> {
        self.with_queue(session, |queue| queue.remove_song(index))
    }

    pub fn remove_current(&self, session: SessionId) -> Option<Song> {
        self.with_queue(session, |queue| queue.remove_current())
    }

    pub fn move_song(&self, session: SessionId, from: usize, to: usize) -> Result<(), CadenceError> {
        self.with_queue(session, |queue| queue.move_song(from, to))
    }

    pub fn shuffle(&self, session: SessionId) -> bool {
        self.with_queue(session, |queue| queue.shuffle())
    }

    pub fn jump_to(&self, session: SessionId, index: usize) -> Result<(), CadenceError> {
        self.with_queue(session, |queue| queue.jump_to(index))
    }

    pub fn next_song(&self, session: SessionId) -> bool {
        self.with_queue(session, |queue| queue.next_song())
    }

    pub fn previous_song(&self, session: SessionId) -> bool {
        self.with_queue(session, |queue| queue.previous_song())
    }

    pub fn clear(&self, session: SessionId) {
        self.with_queue(session, |queue| queue.clear());
    }

    pub fn upcoming_count(&self, session: SessionId) -> usize {
        self.read(session, |queue| queue.upcoming_count()).unwrap_or(0)
    }

    /// Song following the current one, if any.
    pub fn peek_next(&self, session: SessionId) -> Option<Song> {
        self.read(session, |queue| queue.remaining().get(1).cloned())
            .flatten()
    }

    /// Write a resolved song back into whichever slot still holds `id`.
    pub fn apply_resolution(&self, session: SessionId, id: SongId, song: &Song) -> bool {
        self.sessions
            .get_mut(&session)
            .is_some_and(|mut queue| queue.replace_song(id, song))
    }

    pub fn prune_unavailable(&self, session: SessionId, max_check: usize) -> usize {
        self.sessions
            .get_mut(&session)
            .map(|mut queue| queue.prune_unavailable(max_check))
            .unwrap_or(0)
    }

    pub fn volume(&self, session: SessionId) -> f32 {
        self.read(session, |queue| queue.volume())
            .unwrap_or(self.settings.default_volume)
    }

    /// Set the session volume, clamped to the configured bounds.
    pub fn set_volume(&self, session: SessionId, volume: f32) -> f32 {
        let (min, max) = (self.settings.min_volume, self.settings.max_volume);
        self.with_queue(session, |queue| queue.set_volume(volume, min, max))
    }

    pub fn is_repeat(&self, session: SessionId) -> bool {
        self.read(session, |queue| queue.repeat()).unwrap_or(false)
    }

    pub fn set_repeat(&self, session: SessionId, repeat: bool) {
        self.with_queue(session, |queue| queue.set_repeat(repeat));
    }

    pub fn is_autoplay_enabled(&self, session: SessionId) -> bool {
        self.read(session, |queue| queue.autoplay_enabled())
            .unwrap_or(self.settings.autoplay_by_default)
    }

    pub fn enable_autoplay(&self, session: SessionId) {
        self.with_queue(session, |queue| queue.set_autoplay(true));
    }

    pub fn disable_autoplay(&self, session: SessionId) {
        self.with_queue(session, |queue| queue.set_autoplay(false));
    }

    pub fn snapshot(&self, session: SessionId) -> Option<QueueSnapshot> {
        self.read(session, |queue| queue.snapshot())
    }

    /// Drop all state for a session. Returns false if there was none.
    pub fn remove_session(&self, session: SessionId) -> bool {
        let removed = self.sessions.remove(&session).is_some();
        if removed {
            debug!(session_id = %session, "queue destroyed");
            cadence_prometheus::set_active_sessions(self.sessions.len());
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
