// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Music catalog import (track, playlist and album links).

use async_trait::async_trait;

use crate::error::CadenceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CatalogLink, CatalogTrack};

/// Reads track metadata behind a catalog link.
///
/// Implementations page through playlists and albums themselves and stop
/// once `limit` tracks have been collected.
#[async_trait]
pub trait CatalogSource: PluginAdapter {
    async fn tracks(
        &self,
        link: &CatalogLink,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, CadenceError>;
}
