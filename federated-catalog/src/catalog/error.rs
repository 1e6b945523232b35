// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the federated catalog

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Could not find that table: {0}")]
    TableNotFound(String),

    #[error("Could not find a Schema by that name {0:?}")]
    SchemaNotFound(String),

    #[error("Could not find a DataSource for that table {0:?}")]
    SourceNotFound(String),

    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Could not establish a connection for {0}")]
    NilConnection(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    /// Lookup misses are expected in normal resolution flow; callers
    /// usually render these as "table not found"/"schema not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::TableNotFound(_)
                | CatalogError::SchemaNotFound(_)
                | CatalogError::SourceNotFound(_)
        )
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Config(err.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kinds() {
        assert!(CatalogError::TableNotFound("t".into()).is_not_found());
        assert!(CatalogError::SchemaNotFound("s".into()).is_not_found());
        assert!(CatalogError::SourceNotFound("t".into()).is_not_found());
        assert!(!CatalogError::Backend("boom".into()).is_not_found());
        assert!(!CatalogError::NilConnection("t".into()).is_not_found());
    }

    #[test]
    fn test_messages_carry_name() {
        let err = CatalogError::SchemaNotFound("sales".into());
        assert!(err.to_string().contains("sales"));
        let err = CatalogError::NilConnection("orders".into());
        assert_eq!(err.to_string(), "Could not establish a connection for orders");
    }
}
