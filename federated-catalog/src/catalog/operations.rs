// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Administrative schema-change commands
//!
//! Commands originate outside the catalog (DDL, replication feeds) and are
//! applied through an `Applyer`. `InMemApplyer` applies them directly to an
//! in-process `Catalog`.

use super::error::{CatalogError, CatalogResult};
use super::manager::Catalog;
use super::schema::Schema;
use super::table::Table;
use super::traits::Applyer;
use std::fmt;
use std::sync::Arc;

/// A schema change addressed by schema name
#[derive(Debug, Clone)]
pub enum SchemaCommand {
    /// Create an empty, source-less schema, optionally attached under `parent`
    CreateSchema {
        name: String,
        parent: Option<String>,
    },

    /// Register (or replace) a table directly under `schema`
    AddTable { schema: String, table: Table },

    /// Drop a table from its owner and the owner's ancestors
    DropTable { schema: String, table: String },

    /// Re-run discovery on `schema` and its descendants
    Refresh { schema: String },
}

impl fmt::Display for SchemaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaCommand::CreateSchema { name, .. } => write!(f, "create_schema({})", name),
            SchemaCommand::AddTable { schema, table } => {
                write!(f, "add_table({}.{})", schema, table.name)
            }
            SchemaCommand::DropTable { schema, table } => {
                write!(f, "drop_table({}.{})", schema, table)
            }
            SchemaCommand::Refresh { schema } => write!(f, "refresh({})", schema),
        }
    }
}

/// Applies commands to an in-memory catalog
pub struct InMemApplyer {
    catalog: Arc<Catalog>,
}

impl InMemApplyer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    fn resolve(&self, name: &str) -> CatalogResult<Arc<Schema>> {
        self.catalog
            .schema_by_name(name)
            .ok_or_else(|| CatalogError::SchemaNotFound(name.to_lowercase()))
    }
}

impl Applyer for InMemApplyer {
    fn apply(&self, command: SchemaCommand) -> CatalogResult<()> {
        log::debug!("applying {}", command);
        match command {
            SchemaCommand::CreateSchema { name, parent } => {
                if self.catalog.schema_by_name(&name).is_some() {
                    return Err(CatalogError::InvalidOperation(format!(
                        "schema {:?} already exists",
                        name.to_lowercase()
                    )));
                }
                let parent = parent.map(|p| self.resolve(&p)).transpose()?;
                let child = self.catalog.create_schema(&name, None);
                if let Some(parent) = parent {
                    self.catalog.add_child_schema(parent.id(), child.id())?;
                }
                Ok(())
            }
            SchemaCommand::AddTable { schema, table } => {
                self.resolve(&schema)?.add_table(table);
                Ok(())
            }
            SchemaCommand::DropTable { schema, table } => {
                let node = self.resolve(&schema)?;
                self.catalog.drop_table(node.id(), &table).map(|_| ())
            }
            SchemaCommand::Refresh { schema } => {
                let node = self.resolve(&schema)?;
                self.catalog.refresh_schema(node.id())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applyer() -> (Arc<Catalog>, InMemApplyer) {
        let catalog = Arc::new(Catalog::default());
        let applyer = InMemApplyer::new(catalog.clone());
        (catalog, applyer)
    }

    #[test]
    fn test_create_nested_schema_and_table() {
        let (catalog, applyer) = applyer();
        applyer
            .apply(SchemaCommand::CreateSchema {
                name: "Root".to_string(),
                parent: None,
            })
            .unwrap();
        applyer
            .apply(SchemaCommand::CreateSchema {
                name: "sales".to_string(),
                parent: Some("root".to_string()),
            })
            .unwrap();
        applyer
            .apply(SchemaCommand::AddTable {
                schema: "sales".to_string(),
                table: Table::new("Orders"),
            })
            .unwrap();

        let root = catalog.schema_by_name("root").unwrap();
        assert!(root.table("orders").unwrap_err().is_not_found());

        applyer
            .apply(SchemaCommand::Refresh {
                schema: "root".to_string(),
            })
            .unwrap();
        assert_eq!(root.table("orders").unwrap().name, "orders");
        assert_eq!(root.child_names(), vec!["sales"]);
    }

    #[test]
    fn test_duplicate_schema_rejected() {
        let (_catalog, applyer) = applyer();
        let create = SchemaCommand::CreateSchema {
            name: "a".to_string(),
            parent: None,
        };
        applyer.apply(create.clone()).unwrap();
        let err = applyer.apply(create).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidOperation(_)));
    }

    #[test]
    fn test_drop_table_and_unknown_schema() {
        let (catalog, applyer) = applyer();
        let s = catalog.create_schema("s", None);
        s.add_table(Table::new("t"));

        applyer
            .apply(SchemaCommand::DropTable {
                schema: "s".to_string(),
                table: "T".to_string(),
            })
            .unwrap();
        assert!(s.tables().is_empty());

        let err = applyer
            .apply(SchemaCommand::Refresh {
                schema: "nope".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, CatalogError::SchemaNotFound("nope".to_string()));
    }
}
