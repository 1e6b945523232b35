// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Schema nodes
//!
//! A `Schema` is a virtual namespace that may be backed by its own `Source`
//! and may aggregate child schemas, each backed by a different kind of
//! source. Every node keeps a flattened index of its own and its
//! descendants' tables:
//! - `table_map`: table name -> table
//! - `table_schemas`: table name -> node that owns the table
//! - `table_names`: sorted list of the same names
//!
//! All three are guarded by the node's lock and always hold the same key set.

use super::config::ConfigSource;
use super::error::{CatalogError, CatalogResult};
use super::manager::SchemaId;
use super::table::Table;
use super::traits::Source;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the system catalog node; it always answers for its own tables
pub const SYSTEM_SCHEMA_NAME: &str = "schema";

/// Split a `schema.table` reference, stripping backtick/double-quote escapes
pub fn left_right(ident: &str) -> Option<(String, String)> {
    let (left, right) = ident.split_once('.')?;
    let unescape = |s: &str| s.trim_matches(|c: char| c == '`' || c == '"').to_string();
    let (left, right) = (unescape(left), unescape(right));
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left, right))
}

/// Lock-guarded indexes of a schema node
#[derive(Default)]
pub(crate) struct SchemaState {
    pub(crate) parent: Option<SchemaId>,
    pub(crate) schemas: HashMap<String, SchemaId>,
    pub(crate) table_schemas: HashMap<String, SchemaId>,
    pub(crate) table_map: HashMap<String, Arc<Table>>,
    pub(crate) table_names: Vec<String>,
    pub(crate) last_refreshed: Option<DateTime<Utc>>,
}

impl SchemaState {
    /// Insert or replace a table in all three indexes at once
    pub(crate) fn register(&mut self, name: &str, owner: SchemaId, tbl: Arc<Table>) {
        if let Err(pos) = self.table_names.binary_search_by(|n| n.as_str().cmp(name)) {
            self.table_names.insert(pos, name.to_string());
        }
        self.table_schemas.insert(name.to_string(), owner);
        self.table_map.insert(name.to_string(), tbl);
    }

    /// Remove a table from all three indexes
    pub(crate) fn unregister(&mut self, name: &str) -> Option<Arc<Table>> {
        if let Ok(pos) = self.table_names.binary_search_by(|n| n.as_str().cmp(name)) {
            self.table_names.remove(pos);
        }
        self.table_schemas.remove(name);
        self.table_map.remove(name)
    }

    pub(crate) fn knows(&self, name: &str) -> bool {
        self.table_map.contains_key(name)
    }
}

/// A named catalog node
pub struct Schema {
    id: SchemaId,
    name: String,
    conf: Option<Arc<ConfigSource>>,
    source: Option<Arc<dyn Source>>,
    refresh_interval: chrono::Duration,
    state: RwLock<SchemaState>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl Schema {
    pub(crate) fn new(
        id: SchemaId,
        name: &str,
        conf: Option<ConfigSource>,
        source: Option<Arc<dyn Source>>,
        refresh_interval: chrono::Duration,
    ) -> Self {
        Self {
            id,
            name: name.to_lowercase(),
            conf: conf.map(Arc::new),
            source,
            refresh_interval,
            state: RwLock::new(SchemaState::default()),
        }
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conf(&self) -> Option<&ConfigSource> {
        self.conf.as_deref()
    }

    pub fn source(&self) -> Option<&Arc<dyn Source>> {
        self.source.as_ref()
    }

    /// Only nodes with a live source can answer `Source::table`/`Source::open`
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn parent(&self) -> Option<SchemaId> {
        self.state.read().parent
    }

    /// Sorted names of every table visible from this node
    pub fn tables(&self) -> Vec<String> {
        self.state.read().table_names.clone()
    }

    /// Names of the direct children
    pub fn child_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve a table by name, case-insensitively
    ///
    /// Tries the name as given, then the right-hand side of a
    /// `schema.table` reference, then the configured aliases.
    pub fn table(&self, table_name: &str) -> CatalogResult<Arc<Table>> {
        let mut table_name = table_name.to_lowercase();
        let state = self.state.read();

        if let Some(tbl) = state.table_map.get(&table_name) {
            return Ok(tbl.clone());
        }

        if let Some((_, right)) = left_right(&table_name) {
            table_name = right;
            if let Some(tbl) = state.table_map.get(&table_name) {
                return Ok(tbl.clone());
            }
        }

        if let Some(target) = self.conf().and_then(|c| c.alias_target(&table_name)) {
            if let Some(tbl) = state.table_map.get(&target.to_lowercase()) {
                return Ok(tbl.clone());
            }
        }

        Err(CatalogError::TableNotFound(table_name))
    }

    /// Id of the node registered as owner of `table_name`, if any
    pub fn owner_of(&self, table_name: &str) -> Option<SchemaId> {
        self.state
            .read()
            .table_schemas
            .get(&table_name.to_lowercase())
            .copied()
    }

    /// Register a table directly under this node
    ///
    /// Assigns the table id, applies partition configuration and inserts the
    /// table into all indexes under one write lock.
    pub fn add_table(&self, mut tbl: Table) -> Arc<Table> {
        tbl.assign_id();
        if let Some(conf) = self.conf() {
            let explicit = tbl
                .partition
                .clone()
                .filter(|p| p.table.eq_ignore_ascii_case(&tbl.name))
                .or_else(|| conf.partition_for(&tbl.name).cloned());
            match explicit {
                Some(pt) => {
                    tbl.partition_ct = pt.partitions.len();
                    tbl.partition = Some(pt);
                }
                None if conf.partition_ct > 0 => tbl.partition_ct = conf.partition_ct,
                None => {}
            }
        }
        tbl.schema = Some(self.id);
        tbl.set_refresh_interval(self.refresh_interval);

        log::debug!("schema {:?} add table {:?}", self.name, tbl.name);

        let name = tbl.name.clone();
        let tbl = Arc::new(tbl);
        self.state.write().register(&name, self.id, tbl.clone());
        tbl
    }

    /// Resolve `table_name`, describing it through this node's own source on
    /// a miss and caching the result
    ///
    /// Ancestors only see a table loaded this way after their next refresh.
    ///
    /// # Returns
    /// * `Ok(Arc<Table>)` from the index or freshly loaded
    /// * `Err(CatalogError::TableNotFound)` if the configuration filters the
    ///   name out or the source does not know it
    /// * `Err(CatalogError::SourceNotFound)` if this node has no source
    /// * the source's own error, unchanged, if describing failed
    pub fn load_table(&self, table_name: &str) -> CatalogResult<Arc<Table>> {
        if let Ok(tbl) = self.table(table_name) {
            return Ok(tbl);
        }

        let table_name = table_name.to_lowercase();
        let table_name = left_right(&table_name).map_or(table_name.clone(), |(_, right)| right);
        let mut state = self.state.write();
        // another writer may have loaded it while we waited
        if let Some(tbl) = state.table_map.get(&table_name) {
            return Ok(tbl.clone());
        }
        if !self.allows(&table_name) {
            return Err(CatalogError::TableNotFound(table_name));
        }
        let listed = self.listed_name(&table_name);
        self.load_table_unlocked(&mut state, &listed)
    }

    /// Refreshed within the window `now + dur`?
    pub fn since(&self, dur: chrono::Duration) -> bool {
        match self.state.read().last_refreshed {
            Some(ts) => ts > Utc::now() + dur,
            None => false,
        }
    }

    /// Advisory staleness check; nothing refreshes automatically
    pub fn current(&self) -> bool {
        self.since(self.refresh_interval)
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_refreshed
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, SchemaState> {
        self.state.read()
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, SchemaState> {
        self.state.write()
    }

    /// The source's own spelling of `table_name`, falling back to the name
    /// as given when the source does not list it
    fn listed_name(&self, table_name: &str) -> String {
        self.source
            .as_ref()
            .and_then(|src| {
                src.tables()
                    .into_iter()
                    .find(|listed| listed.eq_ignore_ascii_case(table_name))
            })
            .unwrap_or_else(|| table_name.to_string())
    }

    /// Describe `listed_name` through this node's source and register it
    /// into `state`, which must be this node's locked state.
    ///
    /// `listed_name` is passed to the source exactly as the source listed
    /// it; the table is indexed under its lowercase form. The backend call
    /// runs while the caller holds the write lock, so a slow source stalls
    /// every other reader of this node.
    pub(crate) fn load_table_unlocked(
        &self,
        state: &mut SchemaState,
        listed_name: &str,
    ) -> CatalogResult<Arc<Table>> {
        let name = listed_name.to_lowercase();
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| CatalogError::SourceNotFound(name.clone()))?;

        let mut tbl = source
            .table(listed_name)?
            .ok_or_else(|| CatalogError::TableNotFound(name.clone()))?;

        tbl.name = tbl.name.to_lowercase();
        if tbl.name_original.is_empty() {
            tbl.name_original = listed_name.to_string();
        }
        tbl.schema = Some(self.id);
        tbl.assign_id();
        tbl.set_refresh_interval(self.refresh_interval);
        if tbl.source.is_none() {
            tbl.source = Some(source.clone());
        }
        if let Some(pt) = self.conf().and_then(|c| c.partition_for(&name)) {
            tbl.partition_ct = pt.partitions.len();
            tbl.partition = Some(pt.clone());
        }

        let tbl = Arc::new(tbl);
        state.register(&name, self.id, tbl.clone());
        Ok(tbl)
    }

    /// Whether the node's configuration lets `table_name` in
    pub(crate) fn allows(&self, table_name: &str) -> bool {
        self.conf().map_or(true, |c| c.tables_allowed(table_name))
    }
}
