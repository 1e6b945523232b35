// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Column descriptors and describe/show headers
//!
//! Dialects (mysql, cassandra, ...) have their own column descriptors. A
//! `Field` is the generic form, converted to a dialect at render time.

use super::table::Index;
use super::traits::Message;
use crate::value::{Row, Value, ValueType};
use once_cell::sync::{Lazy, OnceCell};
use std::any::Any;
use std::collections::HashMap;

/// Allow nulls in `Field::new`
pub const ALLOW_NULLS: bool = true;
/// Disallow nulls in `Field::new`
pub const NO_NULLS: bool = false;

pub const DESCRIBE_FULL_COLS: [&str; 9] = [
    "Field",
    "Type",
    "Collation",
    "Null",
    "Key",
    "Default",
    "Extra",
    "Privileges",
    "Comment",
];
pub const DESCRIBE_COLS: [&str; 6] = ["Field", "Type", "Null", "Key", "Default", "Extra"];
pub const SHOW_TABLE_COLUMNS: [&str; 2] = ["Table", "Table_Type"];
pub const SHOW_VARIABLES_COLUMNS: [&str; 2] = ["Variable_name", "Value"];
pub const SHOW_DATABASES_COLUMNS: [&str; 1] = ["Database"];
pub const SHOW_INDEX_COLS: [&str; 12] = [
    "Table",
    "Non_unique",
    "Key_name",
    "Seq_in_index",
    "Column_name",
    "Collation",
    "Cardinality",
    "Sub_part",
    "Packed",
    "Null",
    "Index_type",
    "Index_comment",
];

static DESCRIBE_FULL_HEADERS: Lazy<Vec<Field>> = Lazy::new(|| {
    vec![
        Field::new_base("Field", ValueType::String, 255, "COLUMN_NAME"),
        Field::new_base("Type", ValueType::String, 32, "COLUMN_TYPE"),
        Field::new_base("Collation", ValueType::String, 32, "COLUMN_COLLATION"),
        Field::new_base("Null", ValueType::String, 4, "IS_NULLABLE"),
        Field::new_base("Key", ValueType::String, 64, "COLUMN_KEY"),
        Field::new_base("Default", ValueType::String, 32, "COLUMN_DEFAULT"),
        Field::new_base("Extra", ValueType::String, 255, ""),
        Field::new_base("Privileges", ValueType::String, 255, ""),
        Field::new_base("Comment", ValueType::String, 255, ""),
    ]
});

static DESCRIBE_HEADERS: Lazy<Vec<Field>> = Lazy::new(|| {
    vec![
        Field::new_base("Field", ValueType::String, 255, "COLUMN_NAME"),
        Field::new_base("Type", ValueType::String, 32, "COLUMN_TYPE"),
        Field::new_base("Null", ValueType::String, 4, "IS_NULLABLE"),
        Field::new_base("Key", ValueType::String, 64, "COLUMN_KEY"),
        Field::new_base("Default", ValueType::String, 32, "COLUMN_DEFAULT"),
        Field::new_base("Extra", ValueType::String, 255, ""),
    ]
});

/// Header fields for `DESCRIBE FULL`
pub fn describe_full_headers() -> &'static [Field] {
    &DESCRIBE_FULL_HEADERS
}

/// Header fields for `DESCRIBE`
pub fn describe_headers() -> &'static [Field] {
    &DESCRIBE_HEADERS
}

/// Pre-serialized dialect payload, ready to write to the wire
pub type FieldData = Vec<u8>;

/// Column descriptor: name, type, defaults, indexes, nullability
#[derive(Debug, Clone, Default)]
pub struct Field {
    /// Ordinal position, assigned on first registration into a table
    pub(crate) idx: u64,
    row: OnceCell<Row>,
    pub name: String,
    /// Comment/description
    pub description: String,
    /// Key info (primary, ...); full detail lives in `indexes`
    pub key: String,
    pub extra: String,
    pub data: FieldData,
    /// Declared size, ie varchar(20)
    pub length: u32,
    /// Wire and stored type
    pub value_type: ValueType,
    /// Type of the contents when stored as encoded bytes (a json map stored as string, ...)
    pub native_type: ValueType,
    /// Default value byte size for storage
    pub default_value_length: u64,
    pub default_value: Option<Value>,
    pub indexed: bool,
    /// false (the default) allows nulls
    pub no_nulls: bool,
    /// ie utf8, none
    pub collation: String,
    /// ie select, insert, update, delete
    pub roles: Vec<String>,
    /// Indexes this field participates in
    pub indexes: Vec<Index>,
    /// Extra info gathered during source discovery
    pub context: HashMap<String, serde_json::Value>,
}

impl Field {
    /// Name, type, size and description only; the native type mirrors the wire type
    pub fn new_base(name: &str, value_type: ValueType, size: usize, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            length: size as u32,
            value_type,
            native_type: value_type,
            ..Default::default()
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        value_type: ValueType,
        size: usize,
        allow_nulls: bool,
        default_value: Option<Value>,
        key: &str,
        collation: &str,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            extra: description.to_string(),
            description: description.to_string(),
            collation: collation.to_string(),
            length: size as u32,
            value_type,
            native_type: value_type,
            no_nulls: !allow_nulls,
            default_value,
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Ordinal position within the owning table
    pub fn position(&self) -> u64 {
        self.idx
    }

    /// Describe row, built once and memoized
    ///
    /// Null, Key, Default and Privileges stay blank: filling them is the job
    /// of the dialect-aware formatter.
    pub fn as_row(&self) -> &Row {
        self.row.get_or_init(|| {
            vec![
                Value::String(self.name.clone()),
                Value::String(self.value_type.to_string()),
                Value::String(self.collation.clone()),
                Value::String(String::new()),
                Value::String(String::new()),
                Value::String(String::new()),
                Value::String(self.extra.clone()),
                Value::String(String::new()),
                Value::String(self.description.clone()),
            ]
        })
    }

    /// Drop the memoized describe row
    pub fn reset_row(&mut self) {
        self.row = OnceCell::new();
    }

    pub fn add_context(&mut self, key: &str, value: serde_json::Value) {
        self.context.insert(key.to_string(), value);
    }
}

impl Message for Field {
    fn id(&self) -> u64 {
        self.idx
    }

    fn body(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_row_shape() {
        let fld = Field::new_base("id", ValueType::Int, 8, "primary id");
        let row = fld.as_row();
        assert_eq!(row.len(), DESCRIBE_FULL_COLS.len());
        assert_eq!(row[0], Value::from("id"));
        assert_eq!(row[1], Value::from("int"));
        for blank in [3, 4, 5, 7] {
            assert_eq!(row[blank], Value::from(""));
        }
        assert_eq!(row[8], Value::from("primary id"));
    }

    #[test]
    fn test_describe_row_is_memoized_until_reset() {
        let mut fld = Field::new(
            "name",
            ValueType::String,
            64,
            ALLOW_NULLS,
            None,
            "",
            "utf8",
            "user name",
        );
        assert_eq!(fld.as_row()[2], Value::from("utf8"));
        assert_eq!(fld.as_row()[6], Value::from("user name"));

        fld.collation = "latin1".to_string();
        assert_eq!(fld.as_row()[2], Value::from("utf8"));

        fld.reset_row();
        assert_eq!(fld.as_row()[2], Value::from("latin1"));
    }

    #[test]
    fn test_new_field_nullability() {
        let fld = Field::new(
            "id",
            ValueType::Int,
            8,
            NO_NULLS,
            Some(Value::Int(0)),
            "PRI",
            "",
            "",
        );
        assert!(fld.no_nulls);
        assert_eq!(fld.key, "PRI");
        assert_eq!(fld.native_type, ValueType::Int);

        let mut fld = fld;
        fld.add_context("source_type", serde_json::json!("int64"));
        assert_eq!(fld.context.len(), 1);
    }

    #[test]
    fn test_headers() {
        let names: Vec<&str> = describe_full_headers().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, DESCRIBE_FULL_COLS);
        let names: Vec<&str> = describe_headers().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, DESCRIBE_COLS);
    }
}
