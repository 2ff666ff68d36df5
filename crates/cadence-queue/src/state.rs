// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One session's queue and the cursor rules that go with it.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use cadence_core::CadenceError;
use cadence_core::types::{Song, SongId};

/// Titles the upstream service uses for entries that can no longer be played.
pub fn is_unavailable_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    title.is_empty()
        || matches!(title.as_str(), "deleted video" | "private video" | "unavailable")
        || title.contains("deleted")
        || title.contains("private")
}

/// Read-only copy of a queue for presentation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub songs: Vec<Song>,
    pub cursor: usize,
    pub volume: f32,
    pub repeat: bool,
    pub autoplay_enabled: bool,
}

/// Songs, cursor and playback flags for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildQueueState {
    songs: Vec<Song>,
    cursor: usize,
    volume: f32,
    repeat: bool,
    autoplay_enabled: bool,
}

impl GuildQueueState {
    pub fn new(volume: f32, autoplay_enabled: bool) -> Self {
        Self {
            songs: Vec::new(),
            cursor: 0,
            volume,
            repeat: false,
            autoplay_enabled,
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Append songs and return the previous length.
    pub fn add_songs(&mut self, songs: impl IntoIterator<Item = Song>) -> usize {
        let previous = self.songs.len();
        if previous == 0 {
            self.cursor = 0;
        }
        self.songs.extend(songs);
        previous
    }

    /// Remove the song at `index`. Removing at or before the cursor shifts it left.
    pub fn remove_song(&mut self, index: usize) -> Result<Song, CadenceError> {
        self.check_index(index)?;
        let removed = self.songs.remove(index);
        if index <= self.cursor && self.cursor > 0 {
            self.cursor -= 1;
        }
        Ok(removed)
    }

    /// Remove the current song, leaving the cursor on the song that followed it.
    pub fn remove_current(&mut self) -> Option<Song> {
        (self.cursor < self.songs.len()).then(|| self.songs.remove(self.cursor))
    }

    /// Move a song from `from` to `to`, keeping the cursor on the same song.
    pub fn move_song(&mut self, from: usize, to: usize) -> Result<(), CadenceError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let song = self.songs.remove(from);
        self.songs.insert(to, song);

        if from == self.cursor {
            self.cursor = to;
        } else if from < self.cursor && self.cursor <= to {
            self.cursor -= 1;
        } else if to <= self.cursor && self.cursor < from {
            self.cursor += 1;
        }
        Ok(())
    }

    /// Shuffle with the thread-local RNG. See [`shuffle_with`](Self::shuffle_with).
    pub fn shuffle(&mut self) -> bool {
        self.shuffle_with(&mut rand::thread_rng())
    }

    /// Randomize the order, keeping the current song first and current.
    ///
    /// Returns false (and does nothing) for queues of one song or fewer, or
    /// when there is no current song.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.songs.len() <= 1 || self.cursor >= self.songs.len() {
            return false;
        }
        let current = self.songs.remove(self.cursor);
        self.songs.shuffle(rng);
        self.songs.insert(0, current);
        self.cursor = 0;
        true
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), CadenceError> {
        self.check_index(index)?;
        self.cursor = index;
        Ok(())
    }

    /// Advance the cursor, at most to `len`. Returns whether a song is now current.
    pub fn next_song(&mut self) -> bool {
        if self.cursor < self.songs.len() {
            self.cursor += 1;
        }
        self.cursor < self.songs.len()
    }

    /// Step the cursor back. Returns false when already at the start.
    pub fn previous_song(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn clear(&mut self) {
        self.songs.clear();
        self.cursor = 0;
    }

    pub fn current(&self) -> Option<&Song> {
        self.songs.get(self.cursor)
    }

    /// Songs queued after the current one.
    pub fn upcoming_count(&self) -> usize {
        self.songs.len().saturating_sub(self.cursor + 1)
    }

    /// Songs from the cursor onward (current included).
    pub fn remaining(&self) -> &[Song] {
        self.songs.get(self.cursor..).unwrap_or(&[])
    }

    /// Replace the song with id `id`. Returns false if it is no longer queued.
    pub fn replace_song(&mut self, id: SongId, song: &Song) -> bool {
        match self.songs.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                *slot = song.clone();
                true
            }
            None => false,
        }
    }

    /// Remove unplayable entries among the first `max_check`, never the current one.
    pub fn prune_unavailable(&mut self, max_check: usize) -> usize {
        let doomed: Vec<usize> = self
            .songs
            .iter()
            .enumerate()
            .take(max_check)
            .filter(|(i, song)| *i != self.cursor && is_unavailable_title(&song.title))
            .map(|(i, _)| i)
            .collect();

        for &index in doomed.iter().rev() {
            self.songs.remove(index);
            if index < self.cursor {
                self.cursor -= 1;
            }
        }
        doomed.len()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the volume clamped to `[min, max]` and return the stored value.
    pub fn set_volume(&mut self, volume: f32, min: f32, max: f32) -> f32 {
        self.volume = volume.clamp(min, max);
        self.volume
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay_enabled
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay_enabled = enabled;
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            songs: self.songs.clone(),
            cursor: self.cursor,
            volume: self.volume,
            repeat: self.repeat,
            autoplay_enabled: self.autoplay_enabled,
        }
    }

    fn check_index(&self, index: usize) -> Result<(), CadenceError> {
        if index < self.songs.len() {
            Ok(())
        } else {
            Err(CadenceError::InvalidIndex {
                index,
                len: self.songs.len(),
            })
        }
    }
}
