// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Source registry implementation
//!
//! This module provides the `SourceRegistry`, which maps a source type
//! (`ConfigSource.type`) to a factory that builds the backend `Source`, and
//! builds the schema tree described by a `CatalogConfig`.

use super::config::{CatalogConfig, ConfigSource};
use super::error::{CatalogError, CatalogResult};
use super::manager::{Catalog, SchemaId};
use super::providers;
use super::traits::Source;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a backend source from its configuration
pub type SourceFactory =
    Box<dyn Fn(&ConfigSource) -> CatalogResult<Arc<dyn Source>> + Send + Sync>;

/// Registry of source types
pub struct SourceRegistry {
    /// Map of source type to factory
    factories: HashMap<String, SourceFactory>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Create a registry with every built-in source type registered
    pub fn new() -> Self {
        let mut registry = Self::empty();
        providers::register_builtin_sources(&mut registry);
        registry
    }

    /// Create a registry with no source types
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a source type
    ///
    /// Registering an existing type replaces its factory.
    ///
    /// # Arguments
    /// * `source_type` - Name used in `ConfigSource.type`
    /// * `factory` - Builds the source for one config block
    pub fn register<F>(&mut self, source_type: &str, factory: F)
    where
        F: Fn(&ConfigSource) -> CatalogResult<Arc<dyn Source>> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(source_type.to_string(), Box::new(factory))
            .is_some()
        {
            log::warn!("Replaced factory for source type: {}", source_type);
        }
        log::info!("Registered source type: {}", source_type);
    }

    /// Check if a source type is registered
    pub fn has_source_type(&self, source_type: &str) -> bool {
        self.factories.contains_key(source_type)
    }

    /// Sorted list of registered source types
    pub fn source_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Build the source described by `conf`
    ///
    /// # Returns
    /// * `Ok(Arc<dyn Source>)` on success
    /// * `Err(CatalogError::Config)` if the source type is not registered
    /// * the factory's error otherwise
    pub fn create_source(&self, conf: &ConfigSource) -> CatalogResult<Arc<dyn Source>> {
        let factory = self.factories.get(&conf.source_type).ok_or_else(|| {
            CatalogError::Config(format!(
                "source {:?} has unknown type {:?}",
                conf.name, conf.source_type
            ))
        })?;
        factory(conf)
    }

    /// Build every schema described in `config` inside `catalog`
    ///
    /// Each `ConfigSchema` becomes a source-less root node. Each source it
    /// names becomes a child node bound to the factory-built source and its
    /// config; the child is refreshed and attached, then the root is
    /// refreshed so it sees every child table.
    ///
    /// # Returns
    /// * `Ok(Vec<SchemaId>)` - Root node ids, in config order
    /// * `Err(CatalogError::Config)` for an unknown source name or type
    pub fn build_schemas(
        &self,
        catalog: &Catalog,
        config: &CatalogConfig,
    ) -> CatalogResult<Vec<SchemaId>> {
        let mut roots = Vec::with_capacity(config.schemas.len());

        for schema_conf in &config.schemas {
            let root = catalog.create_schema(&schema_conf.name, None);

            for source_name in &schema_conf.sources {
                let conf = config.source(source_name).ok_or_else(|| {
                    CatalogError::Config(format!(
                        "schema {:?} names unknown source {:?}",
                        schema_conf.name, source_name
                    ))
                })?;
                let source = self.create_source(conf)?;
                let child = catalog.create_schema_with_config(conf.clone(), Some(source));
                catalog.refresh_schema(child.id())?;
                catalog.add_child_schema(root.id(), child.id())?;
            }

            catalog.refresh_schema(root.id())?;
            log::info!(
                "Built schema {:?} from {} sources with {} tables",
                root.name(),
                schema_conf.sources.len(),
                root.tables().len()
            );
            roots.push(root.id());
        }

        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::providers::memory::MemorySource;

    #[test]
    fn test_builtin_types() {
        let registry = SourceRegistry::new();
        assert!(registry.has_source_type("memory"));
        assert!(!SourceRegistry::empty().has_source_type("memory"));
    }

    #[test]
    fn test_register_custom_type() {
        let mut registry = SourceRegistry::empty();
        registry.register("files", |conf: &ConfigSource| {
            Ok(Arc::new(MemorySource::new(&conf.name)) as Arc<dyn Source>)
        });
        registry.register("kv", |conf: &ConfigSource| {
            Ok(Arc::new(MemorySource::new(&conf.name)) as Arc<dyn Source>)
        });
        assert_eq!(registry.source_types(), vec!["files", "kv"]);
        assert!(registry
            .create_source(&ConfigSource::new("f", "files"))
            .is_ok());
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        let registry = SourceRegistry::new();
        let err = registry
            .create_source(&ConfigSource::new("x", "elasticsearch"))
            .err()
            .unwrap();
        assert!(matches!(err, CatalogError::Config(_)));
        assert!(err.to_string().contains("elasticsearch"));
    }

    #[test]
    fn test_unknown_source_name() {
        let config = CatalogConfig::from_json_str(
            r#"{"schemas": [{"name": "s", "sources": ["ghost"]}], "sources": []}"#,
        )
        .unwrap();
        let catalog = Catalog::default();
        let err = SourceRegistry::new()
            .build_schemas(&catalog, &config)
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
