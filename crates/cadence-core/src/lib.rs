// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cadence playback core.
//!
//! This crate provides the error taxonomy, the domain types (songs, lookup
//! results, recommendations, notices), and the trait contracts of every
//! external collaborator: transport, upstream lookup, recommendation sources,
//! listening history, statistics, and notice delivery.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CadenceError;
pub use types::{
    AdapterType, CatalogKind, CatalogLink, CatalogTrack, ChannelId, HealthStatus, LookupOptions, LookupResponse, PlaybackNotice, RawTrack,
    Recommendation, ResolvedTrack, SessionId, Song, SongId, UserId,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    CatalogSource, EndOfStream, HistoryAdapter, LookupAdapter, Notifier, PluginAdapter, RecommendationSource,
    StatsAdapter, TransportAdapter, TransportEvent, VoiceConnection,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::is_http_url;

    #[test]
    fn cadence_error_user_messages() {
        let open = CadenceError::CircuitOpen {
            retry_after: std::time::Duration::from_secs(30),
        };
        assert!(open.is_circuit_open());
        assert!(open.user_message().contains("Try again shortly"));

        let resolution = CadenceError::Resolution {
            title: "Song".into(),
            attempts: 5,
            last_error: Some("boom".into()),
        };
        assert!(!resolution.is_circuit_open());
        assert!(resolution.to_string().contains("after 5 attempts (last error: boom)"));
        assert!(resolution.user_message().contains("5 attempts"));

        let index = CadenceError::InvalidIndex { index: 9, len: 3 };
        assert_eq!(
            index.to_string(),
            "index 9 is out of range for a queue of 3 songs"
        );
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Transport,
            AdapterType::Lookup,
            AdapterType::Recommendation,
            AdapterType::History,
            AdapterType::Stats,
            AdapterType::Notifier,
            AdapterType::Catalog,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }

        let json = serde_json::to_string(&AdapterType::Lookup).expect("should serialize");
        let parsed: AdapterType = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(parsed, AdapterType::Lookup);
    }

    #[test]
    fn catalog_links_by_kind() {
        let track = CatalogLink::parse(" https://open.spotify.com/track/4uLU6hMC ").unwrap();
        assert_eq!(track.kind, CatalogKind::Track);
        assert_eq!(track.url, "https://open.spotify.com/track/4uLU6hMC");
        assert_eq!(
            CatalogLink::parse("https://open.spotify.com/playlist/37i9dQ").unwrap().kind,
            CatalogKind::Playlist
        );
        assert_eq!(
            CatalogLink::parse("https://open.spotify.com/album/1DFixLWu").unwrap().kind,
            CatalogKind::Album
        );
        assert!(CatalogLink::parse("https://open.spotify.com/artist/0OdUWJ0s").is_none());
        assert!(CatalogLink::parse("https://www.youtube.com/watch?v=track").is_none());
        assert!(CatalogLink::parse("never gonna give you up").is_none());
    }

    #[test]
    fn catalog_track_becomes_lazy_search_song() {
        let track = CatalogTrack {
            name: "Bohemian Rhapsody".into(),
            artists: vec!["Queen".into(), "Someone Else".into()],
            duration_ms: Some(354_947),
        };
        let song = track.into_song(UserId(4)).unwrap();
        assert!(song.is_lazy);
        assert_eq!(song.title, "Bohemian Rhapsody - Queen");
        assert_eq!(song.resolution_key(), "Bohemian Rhapsody Queen official audio");
        assert_eq!(song.source_url(), None);
        assert_eq!(song.duration_seconds, Some(354));
        assert_eq!(song.requester_id, UserId(4));

        let unnamed = CatalogTrack {
            name: "  ".into(),
            artists: vec!["Queen".into()],
            duration_ms: None,
        };
        assert!(unnamed.into_song(UserId(4)).is_none());
    }

    #[test]
    fn format_duration_variants() {
        let mut song = Song::lazy("x", None, UserId(1));
        assert_eq!(song.format_duration(), "?");
        song.duration_seconds = Some(65);
        assert_eq!(song.format_duration(), "1:05");
        song.duration_seconds = Some(3_725);
        assert_eq!(song.format_duration(), "1:02:05");
    }

    #[test]
    fn resolution_key_prefers_page_url() {
        let song = Song::lazy("Title", Some("https://example.com/a".into()), UserId(1));
        assert_eq!(song.resolution_key(), "https://example.com/a");
        let song = Song::lazy("Title", None, UserId(1));
        assert_eq!(song.resolution_key(), "Title");
    }

    #[test]
    fn apply_resolved_preserves_original_source() {
        let mut song = Song::lazy("query text", Some("https://site/watch?v=1".into()), UserId(7));
        let track = ResolvedTrack {
            title: "Real Title".into(),
            stream_url: "https://cdn/stream1".into(),
            page_url: Some("https://site/watch?v=2".into()),
            duration_seconds: Some(200),
            thumbnail_url: None,
        };
        song.apply_resolved(&track);

        assert!(!song.is_lazy);
        assert_eq!(song.title, "Real Title");
        assert_eq!(song.stream_url.as_deref(), Some("https://cdn/stream1"));
        assert_eq!(song.original_source_url.as_deref(), Some("https://site/watch?v=2"));
        assert_eq!(song.canonical_page_url.as_deref(), Some("https://site/watch?v=2"));

        // A later resolution moves the page URL but keeps the original.
        let again = ResolvedTrack {
            page_url: Some("https://mirror/3".into()),
            ..track
        };
        song.apply_resolved(&again);
        assert_eq!(song.original_source_url.as_deref(), Some("https://site/watch?v=2"));
        assert_eq!(song.canonical_page_url.as_deref(), Some("https://mirror/3"));
    }

    #[test]
    fn resolved_track_requires_stream_url() {
        let raw = RawTrack {
            title: None,
            stream_url: Some("  ".into()),
            ..Default::default()
        };
        assert!(ResolvedTrack::from_raw(raw, "fallback").is_none());

        let raw = RawTrack {
            title: None,
            stream_url: Some("https://cdn/s".into()),
            ..Default::default()
        };
        let track = ResolvedTrack::from_raw(raw, "fallback").expect("usable");
        assert_eq!(track.title, "fallback");
    }

    #[test]
    fn first_playable_skips_missing_entries() {
        let response = LookupResponse::Entries(vec![
            None,
            Some(RawTrack::default()),
            Some(RawTrack {
                stream_url: Some("https://cdn/ok".into()),
                ..Default::default()
            }),
        ]);
        let raw = response.first_playable().expect("third entry is playable");
        assert_eq!(raw.stream_url.as_deref(), Some("https://cdn/ok"));
        assert!(is_http_url("https://x") && !is_http_url("ytsearch:x"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn end_of_stream_waits_for_acknowledgement() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let end = EndOfStream::new(SessionId(3), tx);

        let loop_task = tokio::spawn(async move {
            let Some(TransportEvent::SongEnded { session, ack, .. }) = rx.recv().await else {
                panic!("expected an event");
            };
            ack.send(()).expect("signaller waiting");
            session
        });

        // A plain OS thread has no runtime context, like a transport audio thread.
        let signaller = std::thread::spawn(move || end.signal(None));
        assert_eq!(loop_task.await.expect("loop task"), SessionId(3));
        signaller.join().expect("signal thread");
    }
}
