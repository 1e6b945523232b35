// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Federated catalog
//!
//! A tree of schema nodes, each optionally backed by its own kind of source,
//! presented as one namespace of tables. Nodes live in the `Catalog` arena;
//! backends plug in through the `Source` trait and the `SourceRegistry`.

pub mod config;
pub mod error;
pub mod field;
pub mod manager;
pub mod operations;
pub mod providers;
pub mod registry;
pub mod schema;
pub mod table;
pub mod traits;
