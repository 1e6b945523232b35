// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog service - the arena of schema nodes
//!
//! This module provides the `Catalog`, the object the planner and executor
//! hold a reference to. It owns every schema node in an arena addressed by
//! `SchemaId` and implements the operations that span more than one node:
//! child attachment, recursive refresh, owner resolution and connection
//! acquisition.
//!
//! # Lock ordering
//! When two node locks are held at once, the parent's is always taken
//! before the child's.

use super::config::{CatalogOptions, ConfigSource};
use super::error::{CatalogError, CatalogResult};
use super::schema::{Schema, SchemaState, SYSTEM_SCHEMA_NAME};
use super::table::Table;
use super::traits::{Conn, Source};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable handle of a schema node inside a `Catalog`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId(usize);

impl SchemaId {
    pub(crate) fn new(idx: usize) -> Self {
        Self(idx)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema#{}", self.0)
    }
}

/// Federated catalog service
///
/// Nodes are never removed individually; `shutdown` tears the whole arena
/// down and ids are never reused.
pub struct Catalog {
    /// Arena of schema nodes; `None` after shutdown
    nodes: RwLock<Vec<Option<Arc<Schema>>>>,
    /// Serializes attachments so the cycle check and the link are atomic
    attach: Mutex<()>,
    options: CatalogOptions,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(CatalogOptions::default())
    }
}

impl Catalog {
    /// Create an empty catalog
    ///
    /// # Arguments
    /// * `options` - Catalog-wide options, copied into every node created here
    pub fn new(options: CatalogOptions) -> Self {
        Self {
            nodes: RwLock::new(Vec::new()),
            attach: Mutex::new(()),
            options,
        }
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    /// Create an empty schema node, optionally bound to a source
    ///
    /// # Arguments
    /// * `name` - Schema name, lowercased
    /// * `source` - Backend that lists, describes and opens this node's tables
    ///
    /// # Returns
    /// * `Arc<Schema>` - The new node; its id is stable for the catalog's lifetime
    pub fn create_schema(&self, name: &str, source: Option<Arc<dyn Source>>) -> Arc<Schema> {
        self.insert_node(name, None, source)
    }

    /// Create a schema node governed by a source configuration
    ///
    /// The node takes its name from `conf.name`; the configuration drives
    /// table allowlisting, aliases and partition inheritance.
    pub fn create_schema_with_config(
        &self,
        conf: ConfigSource,
        source: Option<Arc<dyn Source>>,
    ) -> Arc<Schema> {
        let name = conf.name.clone();
        self.insert_node(&name, Some(conf), source)
    }

    fn insert_node(
        &self,
        name: &str,
        conf: Option<ConfigSource>,
        source: Option<Arc<dyn Source>>,
    ) -> Arc<Schema> {
        let mut nodes = self.nodes.write();
        let id = SchemaId::new(nodes.len());
        let node = Arc::new(Schema::new(
            id,
            name,
            conf,
            source,
            self.options.refresh_interval,
        ));
        nodes.push(Some(node.clone()));
        log::debug!("created schema {:?} as {}", node.name(), id);
        node
    }

    /// Resolve a node handle
    ///
    /// # Returns
    /// * `Ok(Arc<Schema>)` if the node exists
    /// * `Err(CatalogError::SchemaNotFound)` for unknown ids or after shutdown
    pub fn get(&self, id: SchemaId) -> CatalogResult<Arc<Schema>> {
        self.nodes
            .read()
            .get(id.index())
            .and_then(|n| n.clone())
            .ok_or_else(|| CatalogError::SchemaNotFound(id.to_string()))
    }

    /// First live node with the given name, in creation order
    pub fn schema_by_name(&self, name: &str) -> Option<Arc<Schema>> {
        let name = name.to_lowercase();
        self.nodes
            .read()
            .iter()
            .flatten()
            .find(|n| n.name() == name)
            .cloned()
    }

    /// Number of live nodes
    pub fn schema_count(&self) -> usize {
        self.nodes.read().iter().flatten().count()
    }

    /// Parent of a node, if it was attached to one
    pub fn parent(&self, id: SchemaId) -> CatalogResult<Option<Arc<Schema>>> {
        match self.get(id)?.parent() {
            Some(pid) => Ok(Some(self.get(pid)?)),
            None => Ok(None),
        }
    }

    /// Tear the catalog down: every node is released and later lookups fail
    pub fn shutdown(&self) {
        let mut nodes = self.nodes.write();
        let live = nodes.iter().flatten().count();
        for slot in nodes.iter_mut() {
            *slot = None;
        }
        log::debug!("catalog shut down, released {} schema nodes", live);
    }

    /// Resolve a table visible from `schema`
    pub fn table(&self, schema: SchemaId, table_name: &str) -> CatalogResult<Arc<Table>> {
        self.get(schema)?.table(table_name)
    }

    /// Find a direct child schema by name
    ///
    /// A child without a backing source cannot answer for its tables and is
    /// reported as not found.
    ///
    /// # Returns
    /// * `Ok(Arc<Schema>)` for a child with a live source
    /// * `Err(CatalogError::SchemaNotFound)` otherwise
    pub fn schema(&self, parent: SchemaId, schema_name: &str) -> CatalogResult<Arc<Schema>> {
        let schema_name = schema_name.to_lowercase();
        let child_id = self.get(parent)?.read_state().schemas.get(&schema_name).copied();
        match child_id.map(|id| self.get(id)) {
            Some(Ok(child)) if child.has_source() => Ok(child),
            _ => Err(CatalogError::SchemaNotFound(schema_name)),
        }
    }

    /// Find the node that owns `table_name`, as seen from `schema`
    ///
    /// The system catalog node always resolves to itself. A miss here
    /// usually means the catalog is still initializing, so it is logged as
    /// a warning before the not-found error is returned.
    pub fn schema_for_table(
        &self,
        schema: SchemaId,
        table_name: &str,
    ) -> CatalogResult<Arc<Schema>> {
        let table_name = table_name.to_lowercase();
        let node = self.get(schema)?;
        if node.name() == SYSTEM_SCHEMA_NAME {
            return Ok(node);
        }

        if let Some(owner) = self.live_owner(&node, &table_name) {
            return Ok(owner);
        }

        log::warn!(
            "schema_for_table: no source for table {:?} in schema {:?}",
            table_name,
            node.name()
        );
        Err(CatalogError::SourceNotFound(table_name))
    }

    fn live_owner(&self, node: &Schema, table_name: &str) -> Option<Arc<Schema>> {
        let owner = node.owner_of(table_name)?;
        self.get(owner).ok().filter(|o| o.has_source())
    }

    /// Open a connection to `table_name` through the source of its owner
    ///
    /// # Returns
    /// * `Ok(Box<dyn Conn>)` on success
    /// * `Err(CatalogError::SourceNotFound)` if no owner with a source is registered
    /// * `Err(CatalogError::NilConnection)` if the source returned no connection
    /// * the source's own error, unchanged, if the open call failed
    pub fn open_conn(&self, schema: SchemaId, table_name: &str) -> CatalogResult<Box<dyn Conn>> {
        let table_name = table_name.to_lowercase();
        let node = self.get(schema)?;
        let owner = self
            .live_owner(&node, &table_name)
            .ok_or_else(|| CatalogError::SourceNotFound(table_name.clone()))?;
        let source = owner
            .source()
            .ok_or_else(|| CatalogError::SourceNotFound(table_name.clone()))?;

        // open with the spelling the source listed
        let open_name = owner
            .table(&table_name)
            .ok()
            .map(|tbl| tbl.name_original.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| table_name.clone());

        source
            .open(&open_name)?
            .ok_or(CatalogError::NilConnection(table_name))
    }

    /// Attach `child` under `parent`
    ///
    /// Copies a point-in-time snapshot of the child's flattened index into
    /// the parent. Tables added to the child later stay invisible from the
    /// parent until `refresh_schema` runs on it.
    ///
    /// Attachments are serialized catalog-wide: the cycle check and the
    /// parent link happen under one mutex, so two opposite attachments can
    /// neither both pass the check nor lock the pair in opposite orders.
    ///
    /// # Returns
    /// * `Err(CatalogError::InvalidOperation)` if the attachment would form a cycle
    pub fn add_child_schema(&self, parent: SchemaId, child: SchemaId) -> CatalogResult<()> {
        let _attaching = self.attach.lock();
        let parent_node = self.get(parent)?;
        let child_node = self.get(child)?;
        if self.ancestors(parent)?.contains(&child) {
            return Err(CatalogError::InvalidOperation(format!(
                "cannot attach schema {:?} under its own descendant {:?}",
                child_node.name(),
                parent_node.name()
            )));
        }

        let mut parent_state = parent_node.write_state();
        let mut child_state = child_node.write_state();

        parent_state
            .schemas
            .insert(child_node.name().to_string(), child);
        child_state.parent = Some(parent);

        for (name, tbl) in child_state.table_map.iter() {
            let owner = child_state.table_schemas.get(name).copied().unwrap_or(child);
            parent_state.register(name, owner, tbl.clone());
        }

        log::debug!(
            "attached schema {:?} to {:?} with {} tables",
            child_node.name(),
            parent_node.name(),
            child_state.table_names.len()
        );
        Ok(())
    }

    /// `id` followed by its ancestors, nearest first
    fn ancestors(&self, id: SchemaId) -> CatalogResult<Vec<SchemaId>> {
        let mut chain = vec![id];
        let mut cur = self.get(id)?.parent();
        while let Some(pid) = cur {
            if chain.contains(&pid) {
                break;
            }
            chain.push(pid);
            cur = self.get(pid)?.parent();
        }
        Ok(chain)
    }

    /// Pull newly listed tables into `schema` and every descendant
    ///
    /// Holds the node's write lock, and each child's in turn, for the whole
    /// walk, including backend describe calls.
    pub fn refresh_schema(&self, schema: SchemaId) -> CatalogResult<()> {
        let node = self.get(schema)?;
        let mut state = node.write_state();
        self.refresh_schema_unlocked(&node, &mut state);
        Ok(())
    }

    /// Refresh `node`, whose write lock the caller holds as `state`
    fn refresh_schema_unlocked(&self, node: &Schema, state: &mut SchemaState) {
        if let Some(source) = node.source() {
            for listed in source.tables() {
                let table_name = listed.to_lowercase();
                if state.knows(&table_name) || !node.allows(&table_name) {
                    continue;
                }
                log::debug!("schema {:?} loading table {:?}", node.name(), listed);
                if let Err(e) = node.load_table_unlocked(state, &listed) {
                    log::error!(
                        "could not load table {:?} into schema {:?}: {}",
                        listed,
                        node.name(),
                        e
                    );
                }
            }
        }

        let mut children: Vec<(String, _)> = state
            .schemas
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        children.sort();

        for (child_name, child_id) in children {
            let child = match self.get(child_id) {
                Ok(child) => child,
                Err(e) => {
                    log::warn!("skipping child {:?} of {:?}: {}", child_name, node.name(), e);
                    continue;
                }
            };
            let mut child_state = child.write_state();
            self.refresh_schema_unlocked(&child, &mut child_state);

            for table_name in child_state.table_names.iter() {
                if state.knows(table_name) {
                    continue;
                }
                if let Some(tbl) = child_state.table_map.get(table_name) {
                    let owner = child_state
                        .table_schemas
                        .get(table_name)
                        .copied()
                        .unwrap_or(child_id);
                    state.register(table_name, owner, tbl.clone());
                }
            }
        }

        state.last_refreshed = Some(Utc::now());
    }

    /// Remove a table from the node that owns it and from every ancestor
    /// index that points at that node
    ///
    /// Locks one node at a time, root first. A source that still lists the
    /// table will bring it back on the next refresh.
    pub fn drop_table(&self, schema: SchemaId, table_name: &str) -> CatalogResult<Arc<Table>> {
        let table_name = table_name.to_lowercase();
        let node = self.get(schema)?;
        let owner = node
            .owner_of(&table_name)
            .ok_or_else(|| CatalogError::TableNotFound(table_name.clone()))?;

        let mut dropped = None;
        for id in self.ancestors(owner)?.into_iter().rev() {
            let ancestor = self.get(id)?;
            let mut state = ancestor.write_state();
            if state.table_schemas.get(&table_name) == Some(&owner) {
                let removed = state.unregister(&table_name);
                if id == owner {
                    dropped = removed;
                }
            }
        }

        log::debug!("dropped table {:?} owned by {}", table_name, owner);
        dropped.ok_or(CatalogError::TableNotFound(table_name))
    }
}
