// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cadence integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockLookup`] - Upstream lookup with scripted failures
//! - [`MockTransport`] / [`MockVoice`] - Voice transport with manual end-of-stream
//! - [`MockRecommendations`], [`MockHistory`], [`MockStats`], [`RecordingNotifier`]
//! - [`MockCatalog`] - Catalog link import with a fixed track list
//! - [`TestHarness`] - A full playback stack wired to the mocks

pub mod harness;
pub mod mock_collaborators;
pub mod mock_lookup;
pub mod mock_transport;

pub use harness::{TEST_USER, TestHarness, TestHarnessBuilder};
pub use mock_collaborators::{
    MockCatalog, MockHistory, MockRecommendations, MockStats, RecordingNotifier, eventually, recommendation,
};
pub use mock_lookup::{MockLookup, page_url_for, slug};
pub use mock_transport::{MockTransport, MockVoice};
