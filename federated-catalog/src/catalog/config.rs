// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Declarative catalog configuration
//!
//! These records are read-only from the catalog's point of view. The JSON
//! field names are the persisted shape and must not change.

use super::error::CatalogResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

/// Default staleness window. Negative: a node is only current if it was
/// refreshed after "now minus five minutes".
pub fn default_refresh_interval() -> chrono::Duration {
    chrono::Duration::minutes(-5)
}

/// Catalog-wide runtime options
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Offset added to "now" to get the staleness cut-off
    pub refresh_interval: chrono::Duration,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
        }
    }
}

/// A virtual schema: a name plus the sources composing it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Virtual schema name, must be unique
    pub name: String,
    /// Names of the `ConfigSource`s included in this schema
    #[serde(default)]
    pub sources: Vec<String>,
    /// Backend servers, not persisted
    #[serde(skip)]
    pub config_nodes: Vec<String>,
}

/// A backend data source (storage, database, csv files, ...)
///
/// One source config may belong to more than one schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSource {
    pub name: String,
    /// Source type, the key in the source registry
    #[serde(rename = "type", default)]
    pub source_type: String,
    /// If non-empty, only these tables are loaded
    #[serde(default)]
    pub tables_to_load: Vec<String>,
    /// alias -> table name
    #[serde(default)]
    pub table_aliases: HashMap<String, String>,
    #[serde(default)]
    pub nodes: Vec<ConfigNode>,
    /// Replaces the older `nodes` list
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Arbitrary settings specific to each source type
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Per-table partitions (optional)
    #[serde(default)]
    pub partitions: Vec<TablePartition>,
    /// Raw partition count applied to every table instead of `partitions`
    #[serde(rename = "partition_count", default)]
    pub partition_ct: usize,
}

impl ConfigSource {
    pub fn new(name: &str, source_type: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type: source_type.to_string(),
            ..Default::default()
        }
    }

    /// Whether `table` passes the `tables_to_load` allowlist
    pub fn tables_allowed(&self, table: &str) -> bool {
        self.tables_to_load.is_empty()
            || self
                .tables_to_load
                .iter()
                .any(|t| t.eq_ignore_ascii_case(table))
    }

    /// Per-table partition descriptor, if configured
    pub fn partition_for(&self, table: &str) -> Option<&TablePartition> {
        self.partitions
            .iter()
            .find(|p| p.table.eq_ignore_ascii_case(table))
    }

    /// Real table name behind an alias, matched case-insensitively
    pub fn alias_target(&self, alias: &str) -> Option<&str> {
        self.table_aliases
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(alias))
            .map(|(_, target)| target.as_str())
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<sourceconfig name={:?} type={:?} settings={}/>",
            self.name,
            self.source_type,
            Value::Object(self.settings.clone())
        )
    }
}

/// A running instance of a source (a server, a service)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    #[serde(default)]
    pub name: String,
    /// Name of the source this node belongs to
    #[serde(default)]
    pub source: String,
    /// host/ip
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// How one table is split across partitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePartition {
    pub table: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub partitions: Vec<Partition>,
}

/// A key range `[left, right)` of a partitioned table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub right: String,
}

/// Whole catalog description: schemas, sources and nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub schemas: Vec<ConfigSchema>,
    #[serde(default)]
    pub sources: Vec<ConfigSource>,
    #[serde(default)]
    pub nodes: Vec<ConfigNode>,
}

impl CatalogConfig {
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> CatalogResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Look up a source config by name
    pub fn source(&self, name: &str) -> Option<&ConfigSource> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Nodes declared for a source, from both the top-level list and the source itself
    pub fn nodes_for(&self, source: &str) -> Vec<&ConfigNode> {
        let mut nodes: Vec<&ConfigNode> =
            self.nodes.iter().filter(|n| n.source == source).collect();
        if let Some(conf) = self.source(source) {
            nodes.extend(conf.nodes.iter());
        }
        nodes
    }
}
