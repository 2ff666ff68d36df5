// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the collaborators the playback core depends on.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod catalog;
pub mod history;
pub mod lookup;
pub mod notifier;
pub mod recommendation;
pub mod stats;
pub mod transport;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use catalog::CatalogSource;
pub use history::HistoryAdapter;
pub use lookup::LookupAdapter;
pub use notifier::Notifier;
pub use recommendation::RecommendationSource;
pub use stats::StatsAdapter;
pub use transport::{EndOfStream, TransportAdapter, TransportEvent, VoiceConnection};
