// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue behavior through the public store API.

use cadence_core::types::{SessionId, Song, UserId};
use cadence_queue::{GuildQueueStore, QueueSettings};

const SESSION: SessionId = SessionId(1);

fn song(title: &str) -> Song {
    Song::lazy(title, None, UserId(9))
}

/// A finished queue waits one past the end; the next addition becomes current.
#[test]
fn exhausted_queue_resumes_with_next_addition() {
    let store = GuildQueueStore::new(QueueSettings::default());
    assert_eq!(store.add_songs(SESSION, vec![song("A")]), 0);
    assert_eq!(
        store.current_song(SESSION).map(|s| s.title),
        Some("A".to_string())
    );

    assert!(!store.next_song(SESSION));
    assert_eq!(store.snapshot(SESSION).map(|s| s.cursor), Some(1));
    assert!(store.current_song(SESSION).is_none());

    assert_eq!(store.add_songs(SESSION, vec![song("B")]), 1);
    assert_eq!(
        store.current_song(SESSION).map(|s| s.title),
        Some("B".to_string())
    );
}

/// Clearing resets the cursor so the next batch starts from the top.
#[test]
fn clear_then_add_starts_at_zero() {
    let store = GuildQueueStore::new(QueueSettings::default());
    store.add_songs(SESSION, vec![song("a"), song("b"), song("c")]);
    store.jump_to(SESSION, 2).expect("in range");
    store.clear(SESSION);

    assert_eq!(store.add_songs(SESSION, vec![song("x")]), 0);
    assert_eq!(store.snapshot(SESSION).map(|s| s.cursor), Some(0));
}

/// Out-of-range indices are reported, never applied.
#[test]
fn invalid_indices_leave_queue_untouched() {
    let store = GuildQueueStore::new(QueueSettings::default());
    store.add_songs(SESSION, vec![song("a"), song("b")]);

    assert!(store.jump_to(SESSION, 2).is_err());
    assert!(store.move_song(SESSION, 0, 5).is_err());
    assert!(store.remove_song(SESSION, 9).is_err());

    let snapshot = store.snapshot(SESSION).expect("queue");
    assert_eq!(snapshot.cursor, 0);
    assert_eq!(snapshot.songs.len(), 2);
}

/// Pruning walks only the first entries and keeps the playing song.
#[test]
fn prune_respects_max_check() {
    let store = GuildQueueStore::new(QueueSettings::default());
    store.add_songs(
        SESSION,
        vec![song("Private video"), song("fine"), song("Deleted video")],
    );
    store.jump_to(SESSION, 1).expect("in range");

    assert_eq!(store.prune_unavailable(SESSION, 2), 1);
    let snapshot = store.snapshot(SESSION).expect("queue");
    assert_eq!(snapshot.songs.len(), 2);
    assert_eq!(snapshot.cursor, 0);
    assert_eq!(snapshot.songs[0].title, "fine");
}
