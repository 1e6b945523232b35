//! Test utilities for federated catalog integration tests
//!
//! `ScriptedSource` is a source whose answers are set up per test: listed
//! tables, tables that fail to describe, tables that open without a
//! connection, and tables whose open call fails.

#![allow(dead_code)]

use federated_catalog::{
    Catalog, CatalogError, CatalogResult, Conn, MemoryConn, Schema, Source, Table, ValueType,
};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct ScriptedSource {
    pub name: String,
    tables: RwLock<Vec<Table>>,
    listed_only: RwLock<Vec<String>>,
    describe_errors: RwLock<HashSet<String>>,
    nil_conns: RwLock<HashSet<String>>,
    open_errors: RwLock<HashSet<String>>,
    describe_calls: AtomicUsize,
    case_sensitive: AtomicBool,
}

impl ScriptedSource {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Add a table with an `id int` column
    pub fn with_table(self: &Arc<Self>, name: &str) -> Arc<Self> {
        let mut tbl = Table::new(name);
        tbl.add_field_type("id", ValueType::Int);
        tbl.set_columns_from_fields();
        self.tables.write().push(tbl);
        self.clone()
    }

    /// List a name that `table()` answers with no table and no error
    pub fn with_listed_only(self: &Arc<Self>, name: &str) -> Arc<Self> {
        self.listed_only.write().push(name.to_string());
        self.clone()
    }

    pub fn fail_describe(self: &Arc<Self>, name: &str) -> Arc<Self> {
        self.describe_errors.write().insert(name.to_string());
        self.clone()
    }

    pub fn nil_conn(self: &Arc<Self>, name: &str) -> Arc<Self> {
        self.nil_conns.write().insert(name.to_string());
        self.clone()
    }

    pub fn fail_open(self: &Arc<Self>, name: &str) -> Arc<Self> {
        self.open_errors.write().insert(name.to_string());
        self.clone()
    }

    /// Only answer `table`/`open` for the exact listed spelling
    pub fn case_sensitive(self: &Arc<Self>) -> Arc<Self> {
        self.case_sensitive.store(true, Ordering::SeqCst);
        self.clone()
    }

    fn matches(&self, tbl: &Table, name: &str) -> bool {
        if self.case_sensitive.load(Ordering::SeqCst) {
            tbl.name_original == name
        } else {
            tbl.name.eq_ignore_ascii_case(name)
        }
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }
}

impl Source for ScriptedSource {
    fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .iter()
            .map(|t| t.name_original.clone())
            .collect();
        names.extend(self.listed_only.read().iter().cloned());
        names.extend(self.describe_errors.read().iter().cloned());
        names
    }

    fn table(&self, name: &str) -> CatalogResult<Option<Table>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if self.describe_errors.read().contains(name) {
            let msg = format!("{}: describe {} timed out", self.name, name);
            return Err(CatalogError::Backend(msg));
        }
        Ok(self.tables.read().iter().find(|t| self.matches(t, name)).cloned())
    }

    fn open(&self, name: &str) -> CatalogResult<Option<Box<dyn Conn>>> {
        if self.open_errors.read().contains(name) {
            return Err(CatalogError::Backend(format!("{}: connection refused", self.name)));
        }
        if self.nil_conns.read().contains(name) {
            return Ok(None);
        }
        if !self.tables.read().iter().any(|t| self.matches(t, name)) {
            return Ok(None);
        }
        Ok(Some(Box::new(MemoryConn {
            source: self.name.clone(),
            table: name.to_string(),
        })))
    }
}

/// Create a node bound to `source` and refresh it
pub fn sourced_schema(catalog: &Catalog, name: &str, source: Arc<ScriptedSource>) -> Arc<Schema> {
    let node = catalog.create_schema(name, Some(source as Arc<dyn Source>));
    catalog.refresh_schema(node.id()).expect("refresh");
    node
}

/// Assert the three flattened indexes agree and names are sorted
pub fn assert_indexes_consistent(catalog: &Catalog, node: &Schema) {
    let names = node.tables();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted, "table names not sorted for {}", node.name());

    for name in &names {
        assert!(node.table(name).is_ok(), "{} listed but not mapped", name);
        assert!(node.owner_of(name).is_some(), "{} listed but has no owner", name);
    }
    assert!(catalog.get(node.id()).is_ok());
}

pub fn conn_table(conn: &dyn Conn) -> Option<&str> {
    let any: &dyn Any = conn.as_any();
    any.downcast_ref::<MemoryConn>().map(|c| c.table.as_str())
}
