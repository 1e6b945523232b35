// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table definitions
//!
//! A `Table` belongs to exactly one schema node once registered, and carries
//! the `Source` that can open connections to it.

use super::config::{default_refresh_interval, TablePartition};
use super::field::Field;
use super::manager::SchemaId;
use super::traits::{Message, Source};
use crate::value::{Row, ValueType};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const FNV64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1 64-bit hash
pub(crate) fn fnv64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV64_OFFSET, |hash, b| {
        hash.wrapping_mul(FNV64_PRIME) ^ u64::from(*b)
    })
}

/// Table id: hash of the lowercase table name.
///
/// Not salted with the schema name, so same-named tables in different
/// schemas share an id.
pub fn table_id(name: &str) -> u64 {
    fnv64(name.to_lowercase().as_bytes())
}

/// How field(s) of a table are indexed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub fields: Vec<String>,
    pub primary_key: bool,
    pub hash_partition: Vec<String>,
    pub partition_size: usize,
}

/// A queryable relation
#[derive(Clone, Default)]
pub struct Table {
    /// Lowercased name
    pub name: String,
    pub name_original: String,
    /// Parent key for hierarchical sources (table -> column family)
    pub parent: String,
    /// Column name -> ordinal position
    pub field_positions: HashMap<String, usize>,
    fields: Vec<Field>,
    field_map: HashMap<String, usize>,
    /// Owning schema node, set on registration
    pub schema: Option<SchemaId>,
    pub source: Option<Arc<dyn Source>>,
    /// Character set, 0 = utf8
    pub charset: u16,
    pub partition: Option<TablePartition>,
    pub partition_ct: usize,
    pub indexes: Vec<Index>,
    /// Extra info gathered during source discovery
    pub context: HashMap<String, serde_json::Value>,
    pub(crate) tbl_id: u64,
    cols: Vec<String>,
    last_refreshed: Option<DateTime<Utc>>,
    /// Staleness window of the owning catalog, set on registration
    refresh_interval: Option<chrono::Duration>,
    rows: OnceCell<Vec<Row>>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("id", &self.tbl_id)
            .field("schema", &self.schema)
            .field("fields", &self.fields.len())
            .field("partition_ct", &self.partition_ct)
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            name_original: name.to_string(),
            ..Default::default()
        }
    }

    /// Same as `new`, bound to the source that describes it
    pub fn with_source(name: &str, source: Arc<dyn Source>) -> Self {
        let mut tbl = Self::new(name);
        tbl.source = Some(source);
        tbl
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_map.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).and_then(|i| self.fields.get(*i))
    }

    /// Fields in ordinal order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields as messages, for describe rendering
    pub fn fields_as_messages(&self) -> Vec<&dyn Message> {
        self.fields.iter().map(|f| f as &dyn Message).collect()
    }

    /// Register a field. A field with the same name is replaced in place and
    /// keeps its ordinal; new fields are appended.
    pub fn add_field(&mut self, mut fld: Field) {
        let existing = self.field_map.get(&fld.name).copied();
        match existing.and_then(|pos| self.fields.get_mut(pos)) {
            Some(slot) => {
                fld.idx = slot.idx;
                *slot = fld;
            }
            None => {
                fld.idx = self.fields.len() as u64;
                self.field_map.insert(fld.name.clone(), self.fields.len());
                self.fields.push(fld);
            }
        }
    }

    /// Describe and register a bare column
    pub fn add_field_type(&mut self, name: &str, value_type: ValueType) {
        self.add_field(Field::new_base(name, value_type, 0, ""));
    }

    /// Type of a column, falling back to a lowercase lookup
    pub fn column(&self, col: &str) -> Option<ValueType> {
        self.field(col)
            .or_else(|| self.field(&col.to_lowercase()))
            .map(|f| f.value_type())
    }

    /// Set column names explicitly
    pub fn set_columns(&mut self, cols: Vec<String>) {
        self.field_positions = cols
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.clone(), idx))
            .collect();
        self.cols = cols;
    }

    /// Derive column names (lowercased) from the current fields
    pub fn set_columns_from_fields(&mut self) {
        let cols: Vec<String> = self.fields.iter().map(|f| f.name.to_lowercase()).collect();
        self.set_columns(cols);
    }

    pub fn columns(&self) -> &[String] {
        &self.cols
    }

    pub fn field_names_positions(&self) -> &HashMap<String, usize> {
        &self.field_positions
    }

    /// Every field as a describe row, memoized on first call
    ///
    /// Changing fields afterwards does not rebuild the rows; call
    /// `reset_rows` first.
    pub fn as_rows(&self) -> &[Row] {
        self.rows
            .get_or_init(|| self.fields.iter().map(|f| f.as_row().clone()).collect())
    }

    /// Set rows explicitly (system tables, tests)
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = OnceCell::with_value(rows);
    }

    pub fn reset_rows(&mut self) {
        self.rows = OnceCell::new();
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn add_context(&mut self, key: &str, value: serde_json::Value) {
        self.context.insert(key.to_string(), value);
    }

    /// Refreshed within the window `now + dur`?
    pub fn since(&self, dur: chrono::Duration) -> bool {
        match self.last_refreshed {
            Some(ts) => ts > Utc::now() + dur,
            None => false,
        }
    }

    /// `since` with the owning catalog's refresh interval, or the default
    /// one for a table not registered yet
    pub fn current(&self) -> bool {
        self.since(self.refresh_interval.unwrap_or_else(default_refresh_interval))
    }

    pub fn set_refreshed(&mut self) {
        self.last_refreshed = Some(Utc::now());
    }

    pub(crate) fn set_refresh_interval(&mut self, interval: chrono::Duration) {
        self.refresh_interval = Some(interval);
    }

    pub(crate) fn assign_id(&mut self) {
        self.tbl_id = table_id(&self.name);
    }
}

impl Message for Table {
    fn id(&self) -> u64 {
        self.tbl_id
    }

    fn body(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn users() -> Table {
        let mut tbl = Table::new("Users");
        tbl.add_field_type("A", ValueType::Int);
        tbl.add_field_type("B", ValueType::String);
        tbl.add_field_type("C", ValueType::Time);
        tbl
    }

    #[test]
    fn test_fnv1_reference_values() {
        assert_eq!(fnv64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv64(b"a"), 0xaf63bd4c8601b7be);
    }

    #[test]
    fn test_name_is_lowercased() {
        let tbl = users();
        assert_eq!(tbl.name, "users");
        assert_eq!(tbl.name_original, "Users");
        assert_eq!(table_id("USERS"), table_id("users"));
    }

    #[test]
    fn test_add_field_upsert_keeps_ordinal() {
        let mut tbl = users();
        tbl.add_field(Field::new_base("B", ValueType::Json, 0, "replaced"));

        let names: Vec<&str> = tbl.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        let positions: Vec<u64> = tbl.fields().iter().map(|f| f.position()).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(tbl.field("B").unwrap().description, "replaced");
        assert_eq!(tbl.column("B"), Some(ValueType::Json));
    }

    #[test]
    fn test_column_lowercase_fallback() {
        let mut tbl = Table::new("t");
        tbl.add_field_type("email", ValueType::String);
        assert_eq!(tbl.column("EMAIL"), Some(ValueType::String));
        assert_eq!(tbl.column("missing"), None);
    }

    #[test]
    fn test_set_columns_from_fields() {
        let mut tbl = users();
        tbl.set_columns_from_fields();
        assert_eq!(tbl.columns(), ["a", "b", "c"]);
        assert_eq!(tbl.field_names_positions().get("c"), Some(&2));
        assert_eq!(tbl.field_names_positions().len(), tbl.columns().len());

        tbl.set_columns(vec!["X".to_string(), "y".to_string()]);
        assert_eq!(tbl.field_names_positions().get("X"), Some(&0));
        assert_eq!(tbl.columns().len(), 2);
    }

    #[test]
    fn test_as_rows_memoized() {
        let mut tbl = users();
        assert_eq!(tbl.as_rows().len(), 3);
        tbl.add_field_type("D", ValueType::Bool);
        assert_eq!(tbl.as_rows().len(), 3);
        tbl.reset_rows();
        assert_eq!(tbl.as_rows().len(), 4);

        tbl.set_rows(vec![vec![Value::from("only")]]);
        assert_eq!(tbl.as_rows().len(), 1);
    }

    #[test]
    fn test_messages() {
        let mut tbl = users();
        tbl.assign_id();
        let id = tbl.id();
        tbl.add_field_type("D", ValueType::Bool);
        assert_eq!(tbl.id(), id);

        let msgs = tbl.fields_as_messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[3].id(), 3);
        assert!(msgs[0].body().downcast_ref::<Field>().is_some());
    }

    #[test]
    fn test_staleness() {
        let mut tbl = users();
        assert!(!tbl.current());
        tbl.set_refreshed();
        assert!(tbl.current());
        assert!(!tbl.since(chrono::Duration::minutes(1)));
    }

    #[test]
    fn test_discovery_metadata() {
        use crate::catalog::providers::memory::MemorySource;

        let mut tbl = Table::with_source("Events", Arc::new(MemorySource::new("mem")));
        assert!(tbl.source.is_some());
        tbl.add_field_type("id", ValueType::Int);
        assert!(tbl.has_field("id"));
        assert!(!tbl.has_field("ID"));

        tbl.add_index(Index {
            name: "pk".to_string(),
            fields: vec!["id".to_string()],
            primary_key: true,
            ..Default::default()
        });
        tbl.add_context("region", serde_json::json!("eu-west"));
        assert!(tbl.indexes[0].primary_key);
        assert_eq!(tbl.context["region"], "eu-west");
    }

    #[test]
    fn test_lookups_survive_desynced_fields() {
        let mut tbl = users();
        tbl.fields.clear();
        assert!(tbl.field("A").is_none());
        assert_eq!(tbl.column("a"), None);

        tbl.add_field_type("A", ValueType::Bool);
        assert_eq!(tbl.fields().len(), 1);
        assert_eq!(tbl.column("A"), Some(ValueType::Bool));
    }

    #[test]
    fn test_add_field_type_builds_bare_field() {
        let mut tbl = Table::new("t");
        tbl.add_field_type("Score", ValueType::Number);
        let fld = tbl.field("Score").unwrap();
        assert_eq!(fld.native_type, ValueType::Number);
        assert_eq!(fld.length, 0);
        assert_eq!(fld.as_row()[1], Value::from("number"));
    }

    #[test]
    fn test_current_uses_registered_interval() {
        let mut tbl = users();
        tbl.set_refreshed();
        assert!(tbl.current());
        tbl.set_refresh_interval(chrono::Duration::minutes(1));
        assert!(!tbl.current());
    }
}
