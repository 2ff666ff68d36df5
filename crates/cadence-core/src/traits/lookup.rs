// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upstream lookup service (stream extraction / search).

use crate::error::CadenceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{LookupOptions, LookupResponse};

/// Adapter for the upstream lookup service.
///
/// `extract` is a blocking call. Callers must run it off the coordination
/// threads (see the bounded resolution pool).
pub trait LookupAdapter: PluginAdapter {
    /// Extract track information for a URL or search query.
    fn extract(&self, query: &str, options: &LookupOptions) -> Result<LookupResponse, CadenceError>;
}
