// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Cadence core.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Identifier of a playback session (one per guild / voice server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user who requested a song. `0` marks autoplay additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    /// Requester used for songs added by autoplay.
    pub const AUTOPLAY: UserId = UserId(0);
}

/// Identifier of a voice channel the transport connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

/// Stable identity of a queue entry, used to write resolution results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongId(pub Uuid);

impl SongId {
    pub fn new() -> Self {
        SongId(Uuid::new_v4())
    }
}

impl Default for SongId {
    fn default() -> Self {
        Self::new()
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Lookup,
    Recommendation,
    History,
    Stats,
    Notifier,
    Catalog,
}

/// Returns true when `url` is a direct http(s) URL.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// A queue entry.
///
/// Lazy songs carry metadata but no confirmed stream URL. Resolution fills in
/// the stream URL and flips `is_lazy` to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub stream_url: Option<String>,
    /// Page URL (or search text) the song was discovered from.
    pub canonical_page_url: Option<String>,
    /// The first real page URL seen for this song; seeds recommendations.
    pub original_source_url: Option<String>,
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub requester_id: UserId,
    pub is_lazy: bool,
    pub added_at: DateTime<Utc>,
}

impl Song {
    /// Create a lazy song awaiting resolution.
    pub fn lazy(
        title: impl Into<String>,
        canonical_page_url: Option<String>,
        requester_id: UserId,
    ) -> Self {
        Self {
            id: SongId::new(),
            title: title.into(),
            stream_url: None,
            canonical_page_url,
            original_source_url: None,
            duration_seconds: None,
            thumbnail_url: None,
            requester_id,
            is_lazy: true,
            added_at: Utc::now(),
        }
    }

    /// Key used for the song cache and the dedup guard.
    pub fn resolution_key(&self) -> &str {
        self.canonical_page_url.as_deref().unwrap_or(&self.title)
    }

    /// URL identifying where this song came from, preferring the preserved original.
    pub fn source_url(&self) -> Option<&str> {
        self.original_source_url
            .as_deref()
            .or(self.canonical_page_url.as_deref())
            .filter(|url| is_http_url(url))
    }

    /// Merge a validated resolution result into this song.
    ///
    /// The first real page URL is kept in `original_source_url`; later
    /// resolutions only move `canonical_page_url`.
    pub fn apply_resolved(&mut self, track: &ResolvedTrack) {
        if !track.title.trim().is_empty() {
            self.title = track.title.clone();
        }

        if self.original_source_url.is_none() {
            self.original_source_url = track
                .page_url
                .clone()
                .filter(|url| is_http_url(url))
                .or_else(|| self.canonical_page_url.clone().filter(|url| is_http_url(url)));
        }

        if let Some(page_url) = &track.page_url {
            self.canonical_page_url = Some(page_url.clone());
        }

        self.stream_url = Some(track.stream_url.clone());
        self.duration_seconds = track.duration_seconds.or(self.duration_seconds);
        self.thumbnail_url = track.thumbnail_url.clone().or(self.thumbnail_url.take());
        self.is_lazy = false;
    }

    /// Duration as `M:SS` or `H:MM:SS`, `?` when unknown.
    pub fn format_duration(&self) -> String {
        match self.duration_seconds {
            None | Some(0) => "?".to_string(),
            Some(total) => {
                let (minutes, seconds) = (total / 60, total % 60);
                let (hours, minutes) = (minutes / 60, minutes % 60);
                if hours > 0 {
                    format!("{hours}:{minutes:02}:{seconds:02}")
                } else {
                    format!("{minutes}:{seconds:02}")
                }
            }
        }
    }
}

/// Loosely-typed record returned by the upstream lookup service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    pub title: Option<String>,
    pub stream_url: Option<String>,
    pub page_url: Option<String>,
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
}

/// Upstream lookup output: a single track or a list of (possibly missing) entries.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResponse {
    Track(RawTrack),
    Entries(Vec<Option<RawTrack>>),
}

impl LookupResponse {
    /// The first record carrying a non-empty stream URL.
    pub fn first_playable(self) -> Option<RawTrack> {
        let has_stream = |raw: &RawTrack| raw.stream_url.as_deref().is_some_and(|u| !u.is_empty());
        match self {
            LookupResponse::Track(raw) => Some(raw).filter(has_stream),
            LookupResponse::Entries(entries) => entries.into_iter().flatten().find(has_stream),
        }
    }

    /// All present records, in order.
    pub fn into_tracks(self) -> Vec<RawTrack> {
        match self {
            LookupResponse::Track(raw) => vec![raw],
            LookupResponse::Entries(entries) => entries.into_iter().flatten().collect(),
        }
    }
}

/// Strongly-typed resolution result, validated at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub title: String,
    pub stream_url: String,
    pub page_url: Option<String>,
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
}

impl ResolvedTrack {
    /// Validate a raw lookup record. Returns `None` without a usable stream URL.
    pub fn from_raw(raw: RawTrack, fallback_title: &str) -> Option<Self> {
        let stream_url = raw.stream_url.filter(|url| !url.trim().is_empty())?;
        Some(Self {
            title: raw
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| fallback_title.to_string()),
            stream_url,
            page_url: raw.page_url.filter(|url| !url.trim().is_empty()),
            duration_seconds: raw.duration_seconds,
            thumbnail_url: raw.thumbnail_url,
        })
    }
}

/// How the lookup service should interpret a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// The query is a URL to extract directly.
    Direct,
    /// The query is search text; return at most `results` entries.
    Search { results: usize },
}

/// Options passed to the upstream lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOptions {
    pub mode: LookupMode,
    /// Expand playlists instead of taking the single referenced item.
    pub allow_playlist: bool,
    /// Return entry metadata only, without resolving stream URLs.
    pub flat: bool,
    /// Maximum number of playlist entries to return.
    pub playlist_limit: usize,
}

impl LookupOptions {
    pub fn direct() -> Self {
        Self {
            mode: LookupMode::Direct,
            allow_playlist: false,
            flat: false,
            playlist_limit: 1,
        }
    }

    pub fn search_one() -> Self {
        Self {
            mode: LookupMode::Search { results: 1 },
            allow_playlist: false,
            flat: false,
            playlist_limit: 1,
        }
    }

    pub fn playlist(limit: usize) -> Self {
        Self {
            mode: LookupMode::Direct,
            allow_playlist: true,
            flat: true,
            playlist_limit: limit,
        }
    }
}

/// A related song suggested by a recommendation source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub url: String,
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub relevance_score: f32,
}

impl Recommendation {
    /// Convert into a lazy queue entry requested by autoplay.
    pub fn into_song(self) -> Song {
        let mut song = Song::lazy(self.title, Some(self.url), UserId::AUTOPLAY);
        song.duration_seconds = self.duration_seconds;
        song.thumbnail_url = self.thumbnail_url;
        song
    }
}

/// What a music catalog link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CatalogKind {
    Track,
    Playlist,
    Album,
}

/// A link into an external music catalog (e.g. `open.spotify.com`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLink {
    pub kind: CatalogKind,
    pub url: String,
}

impl CatalogLink {
    /// Host whose links are imported through the catalog collaborator.
    pub const HOST: &'static str = "open.spotify.com";

    /// Recognize a catalog link. Returns `None` for other text, and for
    /// catalog links that are not a track, playlist or album.
    pub fn parse(text: &str) -> Option<Self> {
        let url = text.trim();
        if !url.contains(Self::HOST) {
            return None;
        }
        let kind = if url.contains("track") {
            CatalogKind::Track
        } else if url.contains("playlist") {
            CatalogKind::Playlist
        } else if url.contains("album") {
            CatalogKind::Album
        } else {
            return None;
        };
        Some(Self {
            kind,
            url: url.to_string(),
        })
    }
}

/// Track metadata read from a music catalog. Carries no playable URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub name: String,
    pub artists: Vec<String>,
    pub duration_ms: Option<u64>,
}

impl CatalogTrack {
    /// Convert into a lazy song found by searching for the official audio.
    ///
    /// Returns `None` for tracks without a name.
    pub fn into_song(self, requester_id: UserId) -> Option<Song> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let artist = self.artists.first().map(|a| a.trim()).unwrap_or_default();
        let (title, search) = if artist.is_empty() {
            (name.to_string(), format!("{name} official audio"))
        } else {
            (format!("{name} - {artist}"), format!("{name} {artist} official audio"))
        };
        let mut song = Song::lazy(title, Some(search), requester_id);
        song.duration_seconds = self.duration_ms.map(|ms| ms / 1000);
        Some(song)
    }
}

/// What the transport needs to start streaming.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub stream_url: String,
    pub volume: f32,
}

/// A play reported to the history collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRecord {
    pub title: String,
    pub url: String,
    pub requester_id: UserId,
    pub duration_seconds: Option<u64>,
}

/// A play reported to the stats collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct SongPlay {
    pub title: String,
    pub requester_id: UserId,
    pub duration_seconds: Option<u64>,
    pub requester_name: Option<String>,
}

/// User-visible playback notices handed to the notifier collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackNotice {
    NowPlaying { title: String },
    /// `position` is 1-based.
    Queued { title: String, position: usize },
    /// First failure in a skip-retry sequence.
    FailedTryingNext { title: String },
    /// Later failures, reported tersely.
    SkippedUnplayable { title: String },
    /// Warning emitted once several songs in a row failed.
    MultipleFailures,
    /// Terminal message after the retry budget is spent.
    RetriesExhausted { failures: usize },
    UpstreamUnavailable,
    NothingToPlay,
    QueueFinished { idle_timeout_secs: u64 },
    AutoplayAdded { count: usize },
    IdleDisconnect,
    AloneDisconnect,
}

impl fmt::Display for PlaybackNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackNotice::NowPlaying { title } => write!(f, "Now playing: **{title}**"),
            PlaybackNotice::Queued { title, position } => {
                write!(f, "Queued at position {position}: **{title}**")
            }
            PlaybackNotice::FailedTryingNext { title } => {
                write!(f, "Failed to play **{title}**. Trying next song...")
            }
            PlaybackNotice::SkippedUnplayable { title } => {
                write!(f, "Skipping unplayable song: **{title}**")
            }
            PlaybackNotice::MultipleFailures => {
                write!(f, "Multiple songs failed to play. Checking remaining queue...")
            }
            PlaybackNotice::RetriesExhausted { failures } => write!(
                f,
                "{failures} songs in a row failed to play. This is usually caused by \
                 region-blocked content, deleted or unavailable videos, or playlist issues. \
                 Try adding individual songs or a different playlist."
            ),
            PlaybackNotice::UpstreamUnavailable => {
                write!(f, "The music lookup service is having trouble. Try again shortly.")
            }
            PlaybackNotice::NothingToPlay => write!(f, "No more songs to play!"),
            PlaybackNotice::QueueFinished { idle_timeout_secs } => write!(
                f,
                "Queue finished! Add more songs or I'll leave after {} minutes of inactivity.",
                idle_timeout_secs / 60
            ),
            PlaybackNotice::AutoplayAdded { count } => {
                write!(f, "Autoplay added {count} related songs")
            }
            PlaybackNotice::IdleDisconnect => write!(f, "Disconnecting due to inactivity."),
            PlaybackNotice::AloneDisconnect => {
                write!(f, "Everyone left the channel, so I'm leaving too.")
            }
        }
    }
}
