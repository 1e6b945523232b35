// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory source implementation
//!
//! Holds table definitions in process memory. Useful for tests, for system
//! tables, and for sources whose tables are declared entirely in config.

use crate::catalog::config::ConfigSource;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::table::Table;
use crate::catalog::traits::{Conn, Source};
use crate::value::ValueType;
use parking_lot::RwLock;
use serde::Deserialize;
use std::any::Any;
use std::sync::Arc;

/// Table declared under `settings.tables` of a memory source config
#[derive(Debug, Deserialize)]
struct TableSetting {
    name: String,
    #[serde(default)]
    columns: Vec<ColumnSetting>,
}

#[derive(Debug, Deserialize)]
struct ColumnSetting {
    name: String,
    #[serde(rename = "type", default)]
    value_type: String,
}

/// In-memory source
pub struct MemorySource {
    name: String,
    tables: RwLock<Vec<Table>>,
}

/// Connection handed out by `MemorySource::open`
#[derive(Debug)]
pub struct MemoryConn {
    pub source: String,
    pub table: String,
}

impl MemorySource {
    /// Create a new, empty memory source
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tables: RwLock::new(Vec::new()),
        }
    }

    /// Build a memory source from its config block
    ///
    /// Tables come from `settings.tables`, ie
    /// `[{"name": "users", "columns": [{"name": "id", "type": "int"}]}]`.
    pub fn from_config(conf: &ConfigSource) -> CatalogResult<Self> {
        let source = Self::new(&conf.name);
        let Some(tables) = conf.settings.get("tables") else {
            return Ok(source);
        };

        let tables: Vec<TableSetting> = serde_json::from_value(tables.clone()).map_err(|e| {
            CatalogError::Config(format!(
                "memory source {:?}: bad tables setting: {}",
                conf.name, e
            ))
        })?;
        for setting in tables {
            let mut tbl = Table::new(&setting.name);
            for col in setting.columns {
                tbl.add_field_type(&col.name, ValueType::from(col.value_type.as_str()));
            }
            tbl.set_columns_from_fields();
            source.add_table(tbl);
        }
        Ok(source)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a table definition
    pub fn add_table(&self, tbl: Table) {
        let mut tables = self.tables.write();
        match tables.iter_mut().find(|t| t.name == tbl.name) {
            Some(existing) => *existing = tbl,
            None => tables.push(tbl),
        }
    }

    pub fn remove_table(&self, name: &str) -> Option<Table> {
        let name = name.to_lowercase();
        let mut tables = self.tables.write();
        let pos = tables.iter().position(|t| t.name == name)?;
        Some(tables.remove(pos))
    }
}

impl Source for MemorySource {
    fn tables(&self) -> Vec<String> {
        self.tables.read().iter().map(|t| t.name.clone()).collect()
    }

    fn table(&self, name: &str) -> CatalogResult<Option<Table>> {
        let name = name.to_lowercase();
        Ok(self.tables.read().iter().find(|t| t.name == name).cloned())
    }

    fn open(&self, name: &str) -> CatalogResult<Option<Box<dyn Conn>>> {
        let name = name.to_lowercase();
        if !self.tables.read().iter().any(|t| t.name == name) {
            return Ok(None);
        }
        Ok(Some(Box::new(MemoryConn {
            source: self.name.clone(),
            table: name,
        })))
    }
}

impl Conn for MemoryConn {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory registered under the `memory` source type
pub fn memory_source_factory(conf: &ConfigSource) -> CatalogResult<Arc<dyn Source>> {
    Ok(Arc::new(MemorySource::from_config(conf)?))
}
