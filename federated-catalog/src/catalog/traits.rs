// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Collaborator capabilities at the catalog boundary
//!
//! Backends implement `Source`/`Conn`; formatting layers implement
//! `DialectWriter`; administrative change feeds go through `Applyer`.
//! `Message` lets describe/show rendering treat tables and fields alike.

use super::error::CatalogResult;
use super::operations::SchemaCommand;
use super::table::Table;
use crate::value::ValueType;
use std::any::Any;

/// Backend-specific provider of table lists, table definitions and connections
///
/// A single source instance may back several schema nodes, so every method
/// must be callable concurrently.
pub trait Source: Send + Sync {
    /// Names of the tables this source can describe, in source order
    fn tables(&self) -> Vec<String>;

    /// Describe one table
    ///
    /// # Returns
    /// * `Ok(Some(Table))` when the source knows the table
    /// * `Ok(None)` when it does not; the catalog reports this as not found
    /// * `Err(CatalogError)` on backend failure, propagated verbatim
    fn table(&self, name: &str) -> CatalogResult<Option<Table>>;

    /// Open a connection scoped to one table
    ///
    /// # Returns
    /// * `Ok(Some(conn))` on success
    /// * `Ok(None)` is an inconsistent answer and surfaces as `NilConnection`
    /// * `Err(CatalogError)` on backend failure, propagated verbatim
    fn open(&self, name: &str) -> CatalogResult<Option<Box<dyn Conn>>>;
}

/// Opaque backend handle returned by `Source::open`
pub trait Conn: Send + Sync {
    /// Release backend resources held by this connection
    fn close(&mut self) -> CatalogResult<()> {
        Ok(())
    }

    /// Downcast hook for the backend that created the connection
    fn as_any(&self) -> &dyn Any;
}

/// Shared shape of rows rendered by describe/show
pub trait Message {
    fn id(&self) -> u64;
    fn body(&self) -> &dyn Any;
}

/// Renders catalog entities for one output dialect (mysql, postgres, ...)
///
/// The catalog never calls this itself.
pub trait DialectWriter {
    /// Dialect name, ie "mysql", "postgres", "bigquery"
    fn dialect(&self) -> &str;
    fn table(&self, tbl: &Table) -> String;
    fn field_type(&self, value_type: ValueType) -> String;
}

/// Applies administrative schema-change commands to a catalog
pub trait Applyer: Send + Sync {
    fn apply(&self, command: SchemaCommand) -> CatalogResult<()>;
}
