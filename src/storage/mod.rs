// Storage module - in-memory tables behind the embedded datasource
// Rows are kept in insertion order so SELECT results are stable

pub mod btree;
pub mod table;

use crate::value::SqlValue;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A single stored row, one value per schema column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub values: Vec<SqlValue>,
}

/// Represents the schema (structure) of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

/// Represents a single column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub nullable: bool,
}

/// The column types the embedded engine supports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Blob,
}

impl DataType {
    /// Convert a literal into the storage representation for this column type.
    /// Integers widen to floats, text stored in a BLOB column becomes bytes.
    pub fn coerce(self, value: SqlValue) -> Result<SqlValue> {
        match (self, value) {
            (_, SqlValue::Null) => Ok(SqlValue::Null),
            (DataType::Integer, v @ SqlValue::Integer(_)) => Ok(v),
            (DataType::Float, v @ SqlValue::Float(_)) => Ok(v),
            (DataType::Float, SqlValue::Integer(i)) => Ok(SqlValue::Float(i as f64)),
            (DataType::Text, v @ SqlValue::Text(_)) => Ok(v),
            (DataType::Boolean, v @ SqlValue::Boolean(_)) => Ok(v),
            (DataType::Blob, v @ SqlValue::Bytes(_)) => Ok(v),
            (DataType::Blob, SqlValue::Text(s)) => Ok(SqlValue::Bytes(s.into_bytes())),
            (data_type, value) => Err(anyhow!(
                "Type mismatch: cannot store {:?} in a {:?} column",
                value,
                data_type
            )),
        }
    }
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Find the index of a column by name (case-insensitive, like SQL identifiers)
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
    }

    /// Get the primary key column index
    pub fn get_primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|col| col.primary_key)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}
