// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Minimal value model used by catalog metadata
//!
//! The full wire value system lives outside the catalog. This module only
//! carries what column descriptors need:
//! - `ValueType`: the declared type of a column, stringified for describe rows
//! - `Value`: default values and describe/show row cells

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a column, as stored on the wire and natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ValueType {
    #[default]
    Unknown,
    Nil,
    Error,
    Bytes,
    Bool,
    Int,
    Number,
    String,
    Time,
    Strings,
    Json,
    Map,
}

impl ValueType {
    /// Name used in describe output
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Unknown => "unknown",
            ValueType::Nil => "nil",
            ValueType::Error => "error",
            ValueType::Bytes => "bytes",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Time => "time",
            ValueType::Strings => "[]string",
            ValueType::Json => "json",
            ValueType::Map => "map[string]value",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ValueType {
    fn from(s: &str) -> Self {
        match s {
            "nil" => ValueType::Nil,
            "error" => ValueType::Error,
            "bytes" => ValueType::Bytes,
            "bool" => ValueType::Bool,
            "int" => ValueType::Int,
            "number" => ValueType::Number,
            "string" => ValueType::String,
            "time" => ValueType::Time,
            "[]string" => ValueType::Strings,
            "json" => ValueType::Json,
            "map[string]value" => ValueType::Map,
            _ => ValueType::Unknown, // default fallback
        }
    }
}

/// Cell value for default values and describe rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Int(i64),
    Number(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    Strings(Vec<String>),
    Null,
}

/// One row of a describe/show response
pub type Row = Vec<Value>;

impl Value {
    /// Extract as string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type this value carries on the wire
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Int(_) => ValueType::Int,
            Value::Number(_) => ValueType::Number,
            Value::Boolean(_) => ValueType::Bool,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Time(_) => ValueType::Time,
            Value::Strings(_) => ValueType::Strings,
            Value::Null => ValueType::Nil,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Strings(list) => write!(f, "[{}]", list.join(", ")),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
