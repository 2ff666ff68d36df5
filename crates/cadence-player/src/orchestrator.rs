// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback orchestration for every session.
//!
//! The orchestrator owns the transition from "a song is current" to "the
//! transport is streaming it": resolving lazy songs, skipping unplayable ones
//! within a bounded retry budget, advancing on end-of-stream, topping up the
//! queue from autoplay, and running the idle and alone timers.
//!
//! End-of-stream events from the transport arrive on an mpsc channel and are
//! handled one at a time by [`PlaybackOrchestrator::run`].

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use futures::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use cadence_config::CadenceConfig;
use cadence_core::CadenceError;
use cadence_core::traits::{
    EndOfStream, HistoryAdapter, Notifier, StatsAdapter, TransportAdapter, TransportEvent,
    VoiceConnection,
};
use cadence_core::types::{
    ChannelId, PlayRecord, PlaybackNotice, SessionId, Song, SongId, SongPlay, StreamRequest,
    UserId,
};
use cadence_queue::GuildQueueStore;
use cadence_resolver::SongResolutionPipeline;

use crate::autoplay::RecommendationBuffer;
use crate::timers::{TimerKind, TimerRegistry};

/// Capacity of the end-of-stream event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// External collaborators the orchestrator drives.
pub struct Collaborators {
    pub transport: Arc<dyn TransportAdapter>,
    pub notifier: Arc<dyn Notifier>,
    pub history: Option<Arc<dyn HistoryAdapter>>,
    pub stats: Option<Arc<dyn StatsAdapter>>,
    pub recommendations: Option<RecommendationBuffer>,
}

/// Result of one [`PlaybackOrchestrator::play_current`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The transport is now streaming this song.
    Started { title: String },
    /// Something is already streaming; nothing was started.
    AlreadyActive,
    /// There is no current song.
    NothingToPlay,
    /// The session has no voice connection.
    NotConnected,
    /// Upstream lookups are short-circuited; playback stopped without skipping.
    UpstreamUnavailable,
    /// Too many consecutive songs failed.
    RetriesExhausted { failures: usize },
}

/// Result of [`PlaybackOrchestrator::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// Number of songs appended.
    pub added: usize,
    /// 1-based queue position of the first appended song.
    pub position: usize,
    /// Whether the first appended song started playing right away.
    pub now_playing: bool,
}

#[derive(Debug, Clone, Copy)]
struct PlayerSettings {
    max_retries: usize,
    retry_backoff: Duration,
    idle_timeout: Duration,
    alone_timeout: Duration,
    songs_per_batch: usize,
    low_water_mark: usize,
}

/// Coordinates queue, resolver, transport and timers for all sessions.
pub struct PlaybackOrchestrator {
    settings: PlayerSettings,
    store: Arc<GuildQueueStore>,
    pipeline: Arc<SongResolutionPipeline>,
    transport: Arc<dyn TransportAdapter>,
    notifier: Arc<dyn Notifier>,
    history: Option<Arc<dyn HistoryAdapter>>,
    stats: Option<Arc<dyn StatsAdapter>>,
    recommendations: Option<RecommendationBuffer>,
    connections: DashMap<SessionId, Arc<dyn VoiceConnection>>,
    play_locks: DashMap<SessionId, Arc<Mutex<()>>>,
    /// Sessions whose next end-of-stream comes from an explicit stop.
    stopping: DashSet<SessionId>,
    autoplay_in_flight: DashSet<SessionId>,
    timers: TimerRegistry,
    events: mpsc::Sender<TransportEvent>,
    weak_self: Weak<PlaybackOrchestrator>,
}

impl PlaybackOrchestrator {
    /// Build the orchestrator and the receiving end of its event channel.
    ///
    /// Pass the receiver to [`run`](Self::run).
    pub fn new(
        config: &CadenceConfig,
        store: Arc<GuildQueueStore>,
        pipeline: Arc<SongResolutionPipeline>,
        collaborators: Collaborators,
    ) -> (Arc<Self>, mpsc::Receiver<TransportEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let settings = PlayerSettings {
            max_retries: config.player.max_retries.max(1),
            retry_backoff: config.player.retry_backoff(),
            idle_timeout: config.player.idle_timeout(),
            alone_timeout: config.player.alone_timeout(),
            songs_per_batch: config.autoplay.songs_per_batch,
            low_water_mark: config.autoplay.low_water_mark,
        };

        let orchestrator = Arc::new_cyclic(|weak_self| Self {
            settings,
            store,
            pipeline,
            transport: collaborators.transport,
            notifier: collaborators.notifier,
            history: collaborators.history,
            stats: collaborators.stats,
            recommendations: collaborators.recommendations,
            connections: DashMap::new(),
            play_locks: DashMap::new(),
            stopping: DashSet::new(),
            autoplay_in_flight: DashSet::new(),
            timers: TimerRegistry::new(),
            events,
            weak_self: weak_self.clone(),
        });
        info!(
            max_retries = settings.max_retries,
            autoplay = orchestrator.recommendations.is_some(),
            "playback orchestrator initialized"
        );
        (orchestrator, rx)
    }

    pub fn store(&self) -> &Arc<GuildQueueStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &Arc<SongResolutionPipeline> {
        &self.pipeline
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    pub fn is_connected(&self, session: SessionId) -> bool {
        self.connections.contains_key(&session)
    }

    /// Whether the session's transport is streaming.
    pub fn is_playing(&self, session: SessionId) -> bool {
        self.connection(session).is_some_and(|conn| conn.is_active())
    }

    fn connection(&self, session: SessionId) -> Option<Arc<dyn VoiceConnection>> {
        self.connections.get(&session).map(|conn| Arc::clone(conn.value()))
    }

    fn play_lock(&self, session: SessionId) -> Arc<Mutex<()>> {
        Arc::clone(self.play_locks.entry(session).or_default().value())
    }

    async fn notify(&self, session: SessionId, notice: PlaybackNotice) {
        if let Err(e) = self.notifier.notify(session, notice).await {
            warn!(session_id = %session, error = %e, "failed to deliver notice");
        }
    }

    // --- Session lifecycle ---

    /// Connect the session to a voice channel. A no-op when already connected.
    pub async fn join(&self, session: SessionId, channel: ChannelId) -> Result<(), CadenceError> {
        if self.is_connected(session) {
            return Ok(());
        }
        let conn = self.transport.connect(session, channel).await?;
        self.connections.insert(session, conn);
        info!(session_id = %session, channel_id = channel.0, "joined voice channel");
        Ok(())
    }

    /// Stop playback, disconnect, cancel timers and drop the session's queue.
    ///
    /// Returns whether the session was connected.
    pub async fn leave(&self, session: SessionId) -> Result<bool, CadenceError> {
        self.timers.cancel_all(session);
        self.stopping.remove(&session);
        self.autoplay_in_flight.remove(&session);
        let removed = self.connections.remove(&session);
        self.store.remove_session(session);
        self.play_locks.remove(&session);

        let Some((_, conn)) = removed else {
            return Ok(false);
        };
        if conn.is_active() {
            conn.stop();
        }
        conn.disconnect().await?;
        info!(session_id = %session, "left voice channel");
        Ok(true)
    }

    /// Search for `query`, append the results and start playback if idle.
    pub async fn enqueue(
        &self,
        session: SessionId,
        query: &str,
        requester: UserId,
    ) -> Result<EnqueueOutcome, CadenceError> {
        let songs = self.pipeline.search(query, requester).await?;
        let Some(first_title) = songs.first().map(|s| s.title.clone()) else {
            return Err(CadenceError::Resolution {
                title: query.to_string(),
                attempts: 1,
                last_error: Some("no results".to_string()),
            });
        };
        let added = songs.len();
        let previous_len = self.store.add_songs(session, songs);
        let position = previous_len + 1;
        debug!(session_id = %session, added, position, "songs enqueued");

        if self.is_playing(session) {
            self.notify(
                session,
                PlaybackNotice::Queued {
                    title: first_title,
                    position,
                },
            )
            .await;
            return Ok(EnqueueOutcome {
                added,
                position,
                now_playing: false,
            });
        }

        let outcome = self.play_current(session).await;
        Ok(EnqueueOutcome {
            added,
            position,
            now_playing: matches!(outcome, PlayOutcome::Started { .. }),
        })
    }

    /// Stop the current song; the end-of-stream path advances the queue.
    pub fn skip(&self, session: SessionId) -> Result<(), CadenceError> {
        let conn = self.connection(session).ok_or_else(|| CadenceError::NotConnected {
            session: session.to_string(),
        })?;
        if !conn.is_active() {
            return Err(CadenceError::QueueEmpty);
        }
        conn.stop();
        info!(session_id = %session, "skipped current song");
        Ok(())
    }

    /// Clear the queue and stop playback without advancing.
    pub fn stop(&self, session: SessionId) -> Result<(), CadenceError> {
        let conn = self.connection(session).ok_or_else(|| CadenceError::NotConnected {
            session: session.to_string(),
        })?;
        self.store.clear(session);
        self.halt(session, conn.as_ref());
        self.start_idle_timer(session);
        info!(session_id = %session, "playback stopped");
        Ok(())
    }

    /// Move the cursor to `index` and start that song.
    pub async fn jump_to(&self, session: SessionId, index: usize) -> Result<PlayOutcome, CadenceError> {
        let conn = self.connection(session).ok_or_else(|| CadenceError::NotConnected {
            session: session.to_string(),
        })?;
        self.store.jump_to(session, index)?;
        self.halt(session, conn.as_ref());
        info!(session_id = %session, index, "jumped to song");
        Ok(self.play_current(session).await)
    }

    /// Step the cursor back one song and start it.
    ///
    /// Fails with [`CadenceError::NoPreviousSong`] at the start of the queue.
    pub async fn previous(&self, session: SessionId) -> Result<PlayOutcome, CadenceError> {
        let conn = self.connection(session).ok_or_else(|| CadenceError::NotConnected {
            session: session.to_string(),
        })?;
        if !self.store.previous_song(session) {
            return Err(CadenceError::NoPreviousSong);
        }
        self.halt(session, conn.as_ref());
        info!(session_id = %session, "returned to previous song");
        Ok(self.play_current(session).await)
    }

    // --- Playback ---

    /// Start streaming the current song, skipping songs that fail.
    ///
    /// A failed song is removed at the cursor so the following song becomes
    /// current. Gives up after the configured number of consecutive failures.
    /// A short-circuited upstream stops the attempt without removing anything.
    pub async fn play_current(&self, session: SessionId) -> PlayOutcome {
        let lock = self.play_lock(session);
        let _guard = lock.lock().await;

        let mut failures = 0;
        while failures < self.settings.max_retries {
            let Some(conn) = self.connection(session) else {
                debug!(session_id = %session, "play requested without a connection");
                return PlayOutcome::NotConnected;
            };
            let Some(mut song) = self.store.current_song(session) else {
                self.notify(session, PlaybackNotice::NothingToPlay).await;
                return PlayOutcome::NothingToPlay;
            };
            if conn.is_active() {
                debug!(session_id = %session, "transport already active");
                return PlayOutcome::AlreadyActive;
            }

            match self.start_song(session, &conn, &mut song).await {
                Ok(true) => {
                    self.on_song_started(session, &song).await;
                    return PlayOutcome::Started { title: song.title };
                }
                Ok(false) => {
                    debug!(session_id = %session, title = %song.title, "queue changed while starting");
                }
                Err(e) if e.is_circuit_open() => {
                    warn!(session_id = %session, error = %e, "upstream unavailable, not skipping");
                    self.notify(session, PlaybackNotice::UpstreamUnavailable).await;
                    return PlayOutcome::UpstreamUnavailable;
                }
                Err(e) => {
                    failures += 1;
                    cadence_prometheus::record_song_failed();
                    warn!(
                        session_id = %session,
                        title = %song.title,
                        attempt = failures,
                        error = %e,
                        "song failed to start, skipping"
                    );
                    self.store.with_queue(session, |queue| {
                        if queue.current().is_some_and(|current| current.id == song.id) {
                            queue.remove_current();
                        }
                    });

                    let notice = match failures {
                        1 => Some(PlaybackNotice::FailedTryingNext { title: song.title }),
                        2..=3 => Some(PlaybackNotice::SkippedUnplayable { title: song.title }),
                        4 => Some(PlaybackNotice::MultipleFailures),
                        _ => None,
                    };
                    if let Some(notice) = notice {
                        self.notify(session, notice).await;
                    }
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
            }
        }

        error!(session_id = %session, failures, "giving up after consecutive failures");
        self.notify(session, PlaybackNotice::RetriesExhausted { failures }).await;
        PlayOutcome::RetriesExhausted { failures }
    }

    /// Resolve and stream `song` if it is still the session's current song.
    ///
    /// Returns `Ok(false)` when the queue or the connection changed while the
    /// song was resolving; nothing is left playing in that case.
    async fn start_song(
        &self,
        session: SessionId,
        conn: &Arc<dyn VoiceConnection>,
        song: &mut Song,
    ) -> Result<bool, CadenceError> {
        if song.is_lazy {
            self.pipeline.resolve(song).await?;
            if !self.store.apply_resolution(session, song.id, song) {
                return Ok(false);
            }
        }
        if !self.still_current(session, conn, song.id) {
            return Ok(false);
        }
        let stream_url = song
            .stream_url
            .clone()
            .ok_or_else(|| CadenceError::playback(format!("`{}` has no stream URL", song.title)))?;
        let request = StreamRequest {
            stream_url,
            volume: self.store.volume(session),
        };
        conn.play(request, EndOfStream::new(session, self.events.clone()))?;

        // A stop or leave may have landed between the check and the play.
        if !self.still_current(session, conn, song.id) {
            if self.owns(session, conn) {
                self.halt(session, conn.as_ref());
            } else if conn.is_active() {
                conn.stop();
            }
            return Ok(false);
        }
        Ok(true)
    }

    fn owns(&self, session: SessionId, conn: &Arc<dyn VoiceConnection>) -> bool {
        self.connections
            .get(&session)
            .is_some_and(|held| Arc::ptr_eq(held.value(), conn))
    }

    fn still_current(&self, session: SessionId, conn: &Arc<dyn VoiceConnection>, id: SongId) -> bool {
        self.owns(session, conn)
            && self
                .store
                .read(session, |queue| queue.current().map(|song| song.id))
                .flatten()
                == Some(id)
    }

    /// Stop the transport without letting its end-of-stream advance the queue.
    fn halt(&self, session: SessionId, conn: &dyn VoiceConnection) {
        if conn.is_active() {
            self.stopping.insert(session);
            conn.stop();
        }
    }

    async fn on_song_started(&self, session: SessionId, song: &Song) {
        self.timers.cancel(session, TimerKind::Idle);
        cadence_prometheus::record_song_started();
        info!(session_id = %session, title = %song.title, "now playing");
        self.notify(
            session,
            PlaybackNotice::NowPlaying {
                title: song.title.clone(),
            },
        )
        .await;

        if let Some(stats) = &self.stats {
            let stats = Arc::clone(stats);
            let play = SongPlay {
                title: song.title.clone(),
                requester_id: song.requester_id,
                duration_seconds: song.duration_seconds,
                requester_name: None,
            };
            tokio::spawn(async move {
                if let Err(e) = stats.record_song_play(session, &play).await {
                    warn!(session_id = %session, error = %e, "failed to record song play");
                }
            });
        }

        if let Some(history) = &self.history {
            let history = Arc::clone(history);
            let record = PlayRecord {
                title: song.title.clone(),
                url: song
                    .source_url()
                    .or(song.stream_url.as_deref())
                    .unwrap_or_default()
                    .to_string(),
                requester_id: song.requester_id,
                duration_seconds: song.duration_seconds,
            };
            tokio::spawn(async move {
                if let Err(e) = history.record_play(session, &record).await {
                    warn!(session_id = %session, error = %e, "failed to record history");
                }
            });
        }
    }

    /// React to the current song finishing.
    ///
    /// Replays on repeat, otherwise advances. When the queue runs out,
    /// autoplay tops it up or the idle timer starts.
    pub async fn handle_song_end(&self, session: SessionId) {
        if self.stopping.remove(&session).is_some() {
            debug!(session_id = %session, "end-of-stream after explicit stop");
            return;
        }
        if !self.is_connected(session) {
            debug!(session_id = %session, "end-of-stream for a disconnected session");
            return;
        }

        if self.store.is_repeat(session) {
            self.play_current(session).await;
            return;
        }

        if self.store.next_song(session) {
            self.preload_current(session);
            if self.store.is_autoplay_enabled(session)
                && self.store.upcoming_count(session) <= self.settings.low_water_mark
            {
                self.spawn_autoplay_top_up(session);
            }
            self.play_current(session).await;
            return;
        }

        if self.store.is_autoplay_enabled(session) && self.autoplay_top_up(session).await > 0 {
            self.play_current(session).await;
            return;
        }

        info!(session_id = %session, "queue finished");
        self.notify(
            session,
            PlaybackNotice::QueueFinished {
                idle_timeout_secs: self.settings.idle_timeout.as_secs(),
            },
        )
        .await;
        self.start_idle_timer(session);
    }

    /// Resolve the current song in the background so playback finds it cached.
    fn preload_current(&self, session: SessionId) {
        let Some(mut song) = self.store.current_song(session).filter(|song| song.is_lazy) else {
            return;
        };
        let pipeline = Arc::clone(&self.pipeline);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match pipeline.resolve(&mut song).await {
                Ok(()) => {
                    store.apply_resolution(session, song.id, &song);
                }
                Err(e) => debug!(session_id = %session, error = %e, "preload failed"),
            }
        });
    }

    // --- Autoplay ---

    pub fn is_autoplay_enabled(&self, session: SessionId) -> bool {
        self.store.is_autoplay_enabled(session)
    }

    pub fn enable_autoplay(&self, session: SessionId) {
        self.store.enable_autoplay(session);
        info!(session_id = %session, "autoplay enabled");
    }

    pub fn disable_autoplay(&self, session: SessionId) {
        self.store.disable_autoplay(session);
        info!(session_id = %session, "autoplay disabled");
    }

    /// Seed URL for recommendations: the last recorded play, else the
    /// current (or most recently queued) song's source.
    pub async fn recommendation_seed(&self, session: SessionId) -> Option<String> {
        if let Some(history) = &self.history {
            match history.last_played_url(session).await {
                Ok(Some(url)) if !url.is_empty() => return Some(url),
                Ok(_) => {}
                Err(e) => warn!(session_id = %session, error = %e, "history lookup failed"),
            }
        }
        self.store
            .read(session, |queue| {
                queue
                    .current()
                    .or_else(|| queue.songs().last())
                    .and_then(|song| song.source_url().map(str::to_string))
            })
            .flatten()
    }

    /// Append autoplay recommendations. Returns how many songs were added.
    ///
    /// Returns 0 without fetching while another top-up for the session runs.
    pub async fn autoplay_top_up(&self, session: SessionId) -> usize {
        let Some(buffer) = &self.recommendations else {
            return 0;
        };
        if !self.autoplay_in_flight.insert(session) {
            debug!(session_id = %session, "autoplay top-up already running");
            return 0;
        }

        let added = match self.recommendation_seed(session).await {
            Some(seed) => {
                let existing = self
                    .store
                    .read(session, |queue| queue.songs().to_vec())
                    .unwrap_or_default();
                let songs = buffer
                    .top_up(&seed, &existing, self.settings.songs_per_batch)
                    .await;
                let count = songs.len();
                if count > 0 && self.is_connected(session) {
                    self.store.add_songs(session, songs);
                    count
                } else {
                    0
                }
            }
            None => {
                warn!(session_id = %session, "no seed available for autoplay");
                0
            }
        };
        self.autoplay_in_flight.remove(&session);

        if added > 0 {
            cadence_prometheus::record_autoplay_added(added);
            info!(session_id = %session, added, "autoplay added songs");
            self.notify(session, PlaybackNotice::AutoplayAdded { count: added }).await;
        }
        added
    }

    fn spawn_autoplay_top_up(&self, session: SessionId) {
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if this.autoplay_top_up(session).await > 0
                && !this.is_playing(session)
                && this.store.current_song(session).is_some()
            {
                this.play_current(session).await;
            }
        });
    }

    // --- Timers ---

    fn start_idle_timer(&self, session: SessionId) {
        let weak = self.weak_self.clone();
        self.timers
            .start(session, TimerKind::Idle, self.settings.idle_timeout, move || async move {
                if let Some(this) = weak.upgrade() {
                    this.idle_expired(session).await;
                }
            });
    }

    async fn idle_expired(&self, session: SessionId) {
        let Some(conn) = self.connection(session) else {
            return;
        };
        if conn.is_active() || self.store.current_song(session).is_some() {
            debug!(session_id = %session, "idle timer expired while busy");
            return;
        }
        info!(session_id = %session, "disconnecting after idle timeout");
        self.notify(session, PlaybackNotice::IdleDisconnect).await;
        if let Err(e) = self.leave(session).await {
            warn!(session_id = %session, error = %e, "idle disconnect failed");
        }
    }

    /// Track whether the bot is alone in its voice channel.
    ///
    /// Being alone starts the alone timer; company cancels it.
    pub fn update_presence(&self, session: SessionId, alone: bool) {
        if !alone {
            if self.timers.cancel(session, TimerKind::Alone) {
                debug!(session_id = %session, "alone timer cancelled");
            }
            return;
        }
        if !self.is_connected(session) {
            return;
        }
        let weak = self.weak_self.clone();
        self.timers
            .start(session, TimerKind::Alone, self.settings.alone_timeout, move || async move {
                if let Some(this) = weak.upgrade() {
                    this.alone_expired(session).await;
                }
            });
    }

    async fn alone_expired(&self, session: SessionId) {
        if !self.is_connected(session) {
            return;
        }
        info!(session_id = %session, "disconnecting after being alone");
        self.notify(session, PlaybackNotice::AloneDisconnect).await;
        if let Err(e) = self.leave(session).await {
            warn!(session_id = %session, error = %e, "alone disconnect failed");
        }
    }

    // --- Event loop ---

    /// Handle end-of-stream events until cancelled or the channel closes,
    /// then drain every session.
    ///
    /// Each event is acknowledged only after it has been fully handled.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<TransportEvent>,
        cancel: CancellationToken,
    ) {
        info!("playback loop running");
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("event channel closed");
                        break;
                    };
                    match event {
                        TransportEvent::SongEnded { session, error, ack } => {
                            if let Some(error) = error {
                                warn!(session_id = %session, error = %error, "stream ended with error");
                            }
                            self.handle_song_end(session).await;
                            let _ = ack.send(());
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping playback loop");
                    break;
                }
            }
        }
        self.drain().await;
        info!("playback loop stopped");
    }

    /// Disconnect every session and cancel every timer.
    pub async fn drain(&self) {
        self.timers.shutdown();
        let sessions: Vec<SessionId> = self.connections.iter().map(|entry| *entry.key()).collect();
        if sessions.is_empty() {
            info!("no active sessions to drain");
            return;
        }
        info!(count = sessions.len(), "draining active sessions");
        let results = join_all(sessions.iter().map(|&session| self.leave(session))).await;
        for (session, result) in sessions.into_iter().zip(results) {
            if let Err(e) = result {
                warn!(session_id = %session, error = %e, "failed to leave during drain");
            }
        }
    }
}
