// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Related-song sources used by autoplay.

use async_trait::async_trait;

use crate::error::CadenceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Recommendation;

/// A source of songs related to a seed URL.
#[async_trait]
pub trait RecommendationSource: PluginAdapter {
    /// Returns up to `count` songs related to `seed_url`, most relevant first.
    async fn related(
        &self,
        seed_url: &str,
        count: usize,
    ) -> Result<Vec<Recommendation>, CadenceError>;
}
