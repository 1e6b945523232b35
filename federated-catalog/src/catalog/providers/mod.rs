// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Built-in source providers
//!
//! Backend crates register their own source types on a `SourceRegistry`;
//! this module only carries the ones shipped with the catalog.

use super::registry::SourceRegistry;

pub mod memory;

/// Register every built-in source type
///
/// To add a source type, add a line like:
/// ```ignore
/// registry.register("mysource", mysource::factory);
/// ```
pub fn register_builtin_sources(registry: &mut SourceRegistry) {
    registry.register("memory", memory::memory_source_factory);

    log::info!("Built-in source registration complete");
}
