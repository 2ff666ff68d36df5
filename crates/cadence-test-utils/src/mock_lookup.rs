// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock upstream lookup adapter for deterministic testing.
//!
//! `MockLookup` answers every query with a synthetic track unless the query
//! matches a configured failure or "no stream" pattern. Patterns are matched
//! on slugs, so `"Bad Song"` also matches `https://video.test/bad-song`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use cadence_core::traits::{LookupAdapter, PluginAdapter};
use cadence_core::types::{
    AdapterType, HealthStatus, LookupOptions, LookupResponse, RawTrack, is_http_url,
};
use cadence_core::CadenceError;

/// Base URL of the synthetic page URLs handed out by [`MockLookup`].
pub const PAGE_BASE: &str = "https://video.test/";

/// Base URL of the synthetic stream URLs handed out by [`MockLookup`].
pub const STREAM_BASE: &str = "https://stream.test/";

/// Lowercase, alphanumeric runs joined by `-`.
pub fn slug(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Page URL [`MockLookup`] assigns to a search for `title`.
pub fn page_url_for(title: &str) -> String {
    format!("{PAGE_BASE}{}", slug(title))
}

#[derive(Default)]
struct LookupState {
    failing: Vec<String>,
    unplayable: Vec<String>,
    responses: HashMap<String, LookupResponse>,
    titles: HashMap<String, String>,
    calls: Vec<(String, LookupOptions)>,
}

/// A mock lookup service with scripted failures.
#[derive(Default)]
pub struct MockLookup {
    state: Mutex<LookupState>,
    delay: Duration,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every query whose slug contains the slug of `pattern`.
    pub fn fail_matching(self, pattern: &str) -> Self {
        self.state().failing.push(slug(pattern));
        self
    }

    /// Answer matching queries with a track that has no stream URL.
    pub fn unplayable_matching(self, pattern: &str) -> Self {
        self.state().unplayable.push(slug(pattern));
        self
    }

    /// Answer exactly `query` with `response`.
    pub fn respond(self, query: &str, response: LookupResponse) -> Self {
        self.state().responses.insert(query.to_string(), response);
        self
    }

    /// Start failing every query from now on.
    pub fn fail_everything(&self) {
        self.state().failing.push(String::new());
    }

    /// Stop failing.
    pub fn recover(&self) {
        self.state().failing.clear();
    }

    /// Queries received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.iter().map(|(query, _)| query.clone()).collect()
    }

    /// Queries with the options they were made with.
    pub fn calls_with_options(&self) -> Vec<(String, LookupOptions)> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    fn state(&self) -> MutexGuard<'_, LookupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PluginAdapter for MockLookup {
    fn name(&self) -> &str {
        "mock-lookup"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Lookup
    }

    async fn health_check(&self) -> Result<HealthStatus, CadenceError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CadenceError> {
        Ok(())
    }
}

impl LookupAdapter for MockLookup {
    fn extract(&self, query: &str, options: &LookupOptions) -> Result<LookupResponse, CadenceError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let mut state = self.state();
        state.calls.push((query.to_string(), options.clone()));

        if let Some(response) = state.responses.get(query) {
            return Ok(response.clone());
        }

        let query_slug = slug(query);
        if state.failing.iter().any(|p| query_slug.contains(p.as_str())) {
            return Err(CadenceError::lookup(format!("video unavailable: {query}")));
        }

        let (title, page_url) = if is_http_url(query) {
            let title = state
                .titles
                .get(query)
                .cloned()
                .unwrap_or_else(|| query.rsplit('/').next().unwrap_or(query).to_string());
            (title, query.to_string())
        } else {
            let page_url = page_url_for(query);
            state.titles.insert(page_url.clone(), query.to_string());
            (query.to_string(), page_url)
        };

        let stream_url = if state.unplayable.iter().any(|p| query_slug.contains(p.as_str())) {
            None
        } else {
            Some(format!("{STREAM_BASE}{}", slug(&title)))
        };

        Ok(LookupResponse::Track(RawTrack {
            title: Some(title),
            stream_url,
            page_url: Some(page_url),
            duration_seconds: Some(180),
            thumbnail_url: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_then_direct_lookup_keeps_title() {
        let lookup = MockLookup::new();
        let found = lookup
            .extract("Song A", &LookupOptions::search_one())
            .unwrap()
            .first_playable()
            .unwrap();
        assert_eq!(found.page_url.as_deref(), Some("https://video.test/song-a"));

        let direct = lookup
            .extract("https://video.test/song-a", &LookupOptions::direct())
            .unwrap()
            .first_playable()
            .unwrap();
        assert_eq!(direct.title.as_deref(), Some("Song A"));
        assert_eq!(direct.stream_url.as_deref(), Some("https://stream.test/song-a"));
        assert_eq!(lookup.call_count(), 2);
    }

    #[test]
    fn failure_patterns_match_urls_and_titles() {
        let lookup = MockLookup::new().fail_matching("Bad Song");
        assert!(lookup.extract("Bad Song audio", &LookupOptions::search_one()).is_err());
        assert!(lookup.extract("https://video.test/bad-song", &LookupOptions::direct()).is_err());
        assert!(lookup.extract("Good Song", &LookupOptions::search_one()).is_ok());

        lookup.fail_everything();
        assert!(lookup.extract("Good Song", &LookupOptions::search_one()).is_err());
        lookup.recover();
        assert!(lookup.extract("Good Song", &LookupOptions::search_one()).is_ok());
    }

    #[test]
    fn unplayable_tracks_have_no_stream() {
        let lookup = MockLookup::new().unplayable_matching("silent");
        let response = lookup.extract("Silent Track", &LookupOptions::search_one()).unwrap();
        assert!(response.first_playable().is_none());
    }
}
