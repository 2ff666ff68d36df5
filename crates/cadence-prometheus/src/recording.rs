// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Cadence metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "cadence_cache_lookups_total",
        "Song cache lookups by result (hit, miss)"
    );
    describe_counter!(
        "cadence_lookup_calls_total",
        "Upstream lookup calls by outcome (ok, error)"
    );
    describe_gauge!(
        "cadence_lookup_active",
        "Upstream lookups currently running"
    );
    describe_counter!(
        "cadence_breaker_transitions_total",
        "Circuit breaker state transitions by target state"
    );
    describe_histogram!(
        "cadence_resolution_latency_seconds",
        "Time to resolve a lazy song, including every strategy tried"
    );
    describe_counter!("cadence_songs_started_total", "Songs handed to the transport");
    describe_counter!(
        "cadence_songs_failed_total",
        "Songs removed from a queue because they could not be played"
    );
    describe_counter!(
        "cadence_autoplay_songs_total",
        "Songs appended by autoplay"
    );
    describe_counter!(
        "cadence_song_plays_total",
        "Completed play reports by requester kind"
    );
    describe_gauge!("cadence_active_sessions", "Sessions with queue state");
}

/// Record a song cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("cadence_cache_lookups_total", "result" => result).increment(1);
}

/// Record the outcome of one upstream lookup call.
pub fn record_lookup_call(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("cadence_lookup_calls_total", "outcome" => outcome).increment(1);
}

/// Set the number of lookups currently running.
pub fn set_active_lookups(count: usize) {
    metrics::gauge!("cadence_lookup_active").set(count as f64);
}

/// Record a circuit breaker transition into `state`.
pub fn record_breaker_transition(state: &'static str) {
    metrics::counter!("cadence_breaker_transitions_total", "state" => state).increment(1);
}

/// Record how long a resolution took.
pub fn record_resolution_latency(seconds: f64) {
    metrics::histogram!("cadence_resolution_latency_seconds").record(seconds);
}

/// Record a song handed to the transport.
pub fn record_song_started() {
    metrics::counter!("cadence_songs_started_total").increment(1);
}

/// Record a song dropped as unplayable.
pub fn record_song_failed() {
    metrics::counter!("cadence_songs_failed_total").increment(1);
}

/// Record songs appended by autoplay.
pub fn record_autoplay_added(count: usize) {
    metrics::counter!("cadence_autoplay_songs_total").increment(count as u64);
}

/// Record a completed play report.
pub fn record_song_play(autoplay: bool) {
    let requester = if autoplay { "autoplay" } else { "user" };
    metrics::counter!("cadence_song_plays_total", "requester" => requester).increment(1);
}

/// Set the number of sessions holding queue state.
pub fn set_active_sessions(count: usize) {
    metrics::gauge!("cadence_active_sessions").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn counters_render_with_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            record_cache_lookup(true);
            record_cache_lookup(true);
            record_cache_lookup(false);
            record_lookup_call(false);
            record_breaker_transition("open");
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"cadence_cache_lookups_total{result="hit"} 2"#));
        assert!(rendered.contains(r#"cadence_cache_lookups_total{result="miss"} 1"#));
        assert!(rendered.contains(r#"cadence_lookup_calls_total{outcome="error"} 1"#));
        assert!(rendered.contains(r#"cadence_breaker_transitions_total{state="open"} 1"#));
    }

    #[test]
    fn gauges_track_latest_value() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            set_active_lookups(3);
            set_active_lookups(1);
            record_autoplay_added(4);
        });

        let rendered = handle.render();
        assert!(rendered.contains("cadence_lookup_active 1"));
        assert!(rendered.contains("cadence_autoplay_songs_total 4"));
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_song_started();
        record_song_failed();
        record_resolution_latency(0.25);
    }
}
