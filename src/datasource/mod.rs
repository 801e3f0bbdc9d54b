// Datasource module - the relational source query directives run against
//
// The resolver only ever sees the DataSource trait. Implementations own
// their own connection handling and synchronization; callers share one
// handle across concurrent renders.

pub mod memory;

pub use memory::MemoryDataSource;

use crate::value::SqlValue;
use std::sync::Arc;
use thiserror::Error;

/// Rows returned by a query, with the column names in select order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum DataSourceError {
    /// The source rejected or failed to run the statement
    #[error("{0}")]
    Query(String),

    /// The source cannot serve queries at all
    #[error("datasource unavailable: {0}")]
    Unavailable(String),
}

/// Capability consumed by the resolver: run SQL text verbatim, return rows
pub trait DataSource: Send + Sync {
    fn query(&self, sql: &str) -> Result<QueryRows, DataSourceError>;
}

impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    fn query(&self, sql: &str) -> Result<QueryRows, DataSourceError> {
        (**self).query(sql)
    }
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn query(&self, sql: &str) -> Result<QueryRows, DataSourceError> {
        (**self).query(sql)
    }
}
