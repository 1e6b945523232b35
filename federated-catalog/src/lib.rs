// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Federated Catalog - schema federation for a SQL-like query engine
//!
//! Presents tables from many heterogeneous backends (key-value stores,
//! columnar sources, flat files, ...) as one queryable namespace.
//!
//! # Features
//!
//! - **Schema tree**: schema nodes aggregate their children's tables into a
//!   flattened, case-insensitive index
//! - **Lazy loading**: table definitions are described by the owning source
//!   on refresh and cached
//! - **Concurrency**: one reader/writer lock per node, parent before child
//! - **Pluggable sources**: backends register a factory per source type
//!
//! # Usage
//!
//! ```rust,ignore
//! use federated_catalog::{Catalog, CatalogConfig, SourceRegistry};
//!
//! let catalog = Catalog::default();
//! let config = CatalogConfig::from_json_str(json)?;
//! let roots = SourceRegistry::new().build_schemas(&catalog, &config)?;
//! let orders = catalog.table(roots[0], "sales.orders")?;
//! let conn = catalog.open_conn(roots[0], "orders")?;
//! ```

pub mod catalog;
pub mod value;

pub use catalog::config::{
    default_refresh_interval, CatalogConfig, CatalogOptions, ConfigNode, ConfigSchema,
    ConfigSource, Partition, TablePartition,
};
pub use catalog::error::{CatalogError, CatalogResult};
pub use catalog::field::{describe_full_headers, describe_headers, Field, FieldData};
pub use catalog::manager::{Catalog, SchemaId};
pub use catalog::operations::{InMemApplyer, SchemaCommand};
pub use catalog::providers::memory::{MemoryConn, MemorySource};
pub use catalog::registry::{SourceFactory, SourceRegistry};
pub use catalog::schema::{left_right, Schema, SYSTEM_SCHEMA_NAME};
pub use catalog::table::{table_id, Index, Table};
pub use catalog::traits::{Applyer, Conn, DialectWriter, Message, Source};
pub use value::{Row, Value, ValueType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
