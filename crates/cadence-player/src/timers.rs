// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable per-session timers.
//!
//! At most one timer of each [`TimerKind`] is outstanding per session:
//! starting a timer replaces (and cancels) any existing one of the same kind
//! in a single map operation.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cadence_core::types::SessionId;

/// The kinds of session timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TimerKind {
    /// Nothing has been playing for a while.
    Idle,
    /// Nobody else is left in the voice channel.
    Alone,
}

struct TimerSlot {
    generation: u64,
    token: CancellationToken,
}

/// Registry of running timers keyed by (session, kind).
#[derive(Clone, Default)]
pub struct TimerRegistry {
    slots: Arc<DashMap<(SessionId, TimerKind), TimerSlot>>,
    generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("pending", &self.slots.len())
            .finish()
    }
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_expire` after `delay` unless cancelled first.
    ///
    /// Any existing timer of the same kind for `session` is cancelled.
    pub fn start<F, Fut>(&self, session: SessionId, kind: TimerKind, delay: Duration, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let slot = TimerSlot {
            generation,
            token: token.clone(),
        };
        if let Some(previous) = self.slots.insert((session, kind), slot) {
            previous.token.cancel();
            debug!(session_id = %session, timer = %kind, "replaced running timer");
        }

        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(session_id = %session, timer = %kind, "timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    // A replacement timer owns the slot now; leave it alone.
                    slots.remove_if(&(session, kind), |_, slot| slot.generation == generation);
                    debug!(session_id = %session, timer = %kind, "timer expired");
                    on_expire().await;
                }
            }
        });
    }

    /// Cancel one timer. Returns whether a timer was pending.
    pub fn cancel(&self, session: SessionId, kind: TimerKind) -> bool {
        match self.slots.remove(&(session, kind)) {
            Some((_, slot)) => {
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every timer of `session`.
    pub fn cancel_all(&self, session: SessionId) {
        for kind in [TimerKind::Idle, TimerKind::Alone] {
            self.cancel(session, kind);
        }
    }

    /// Cancel every timer of every session.
    pub fn shutdown(&self) {
        self.slots.retain(|_, slot| {
            slot.token.cancel();
            false
        });
    }

    pub fn is_pending(&self, session: SessionId, kind: TimerKind) -> bool {
        self.slots.contains_key(&(session, kind))
    }

    pub fn pending_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type Expiry = std::pin::Pin<Box<dyn Future<Output = ()> + Send>>;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Expiry + Clone + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&fired);
        let make = move || -> Expiry {
            let handle = Arc::clone(&handle);
            Box::pin(async move {
                handle.fetch_add(1, Ordering::SeqCst);
            })
        };
        (fired, make)
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_delay() {
        let timers = TimerRegistry::new();
        let (fired, make) = counter();
        timers.start(SessionId(1), TimerKind::Idle, Duration::from_secs(300), make);
        assert!(timers.is_pending(SessionId(1), TimerKind::Idle));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timers.is_pending(SessionId(1), TimerKind::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_cancels_the_previous_timer() {
        let timers = TimerRegistry::new();
        let (fired, make) = counter();

        timers.start(SessionId(1), TimerKind::Alone, Duration::from_secs(60), make.clone());
        tokio::time::sleep(Duration::from_secs(30)).await;
        timers.start(SessionId(1), TimerKind::Alone, Duration::from_secs(60), make);
        assert_eq!(timers.pending_count(), 1);

        // The first timer's deadline passes without firing.
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn kinds_and_sessions_are_independent() {
        let timers = TimerRegistry::new();
        let (fired, make) = counter();

        timers.start(SessionId(1), TimerKind::Idle, Duration::from_secs(10), make.clone());
        timers.start(SessionId(1), TimerKind::Alone, Duration::from_secs(10), make.clone());
        timers.start(SessionId(2), TimerKind::Idle, Duration::from_secs(10), make);
        assert_eq!(timers.pending_count(), 3);

        assert!(timers.cancel(SessionId(1), TimerKind::Idle));
        assert!(!timers.cancel(SessionId(1), TimerKind::Idle));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_and_shutdown_stop_everything() {
        let timers = TimerRegistry::new();
        let (fired, make) = counter();

        timers.start(SessionId(1), TimerKind::Idle, Duration::from_secs(5), make.clone());
        timers.start(SessionId(1), TimerKind::Alone, Duration::from_secs(5), make.clone());
        timers.start(SessionId(2), TimerKind::Idle, Duration::from_secs(5), make);

        timers.cancel_all(SessionId(1));
        assert_eq!(timers.pending_count(), 1);
        timers.shutdown();
        assert_eq!(timers.pending_count(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
