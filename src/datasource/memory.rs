// In-memory datasource backed by the embedded SQL engine
// Reads share a lock, schema and data changes take it exclusively

use super::{DataSource, DataSourceError, QueryRows};
use crate::query::parser::Query;
use crate::query::{QueryExecutor, QueryParser, QueryResult};
use anyhow::{anyhow, Result};
use std::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct MemoryDataSource {
    executor: RwLock<QueryExecutor>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a datasource and run a seed script against it
    pub fn from_script(sql: &str) -> Result<Self> {
        let source = Self::new();
        source.execute_batch(sql)?;
        Ok(source)
    }

    /// Execute a single statement of any supported kind
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.run(QueryParser::parse(sql)?)
    }

    /// Execute every statement of a `;`-separated script, stopping at the first failure
    pub fn execute_batch(&self, sql: &str) -> Result<Vec<QueryResult>> {
        let queries = QueryParser::parse_all(sql)?;
        debug!(statements = queries.len(), "executing SQL script");
        queries.into_iter().map(|query| self.run(query)).collect()
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        let executor = self
            .executor
            .read()
            .map_err(|_| anyhow!("datasource lock poisoned"))?;
        Ok(executor.list_tables())
    }

    fn run(&self, query: Query) -> Result<QueryResult> {
        match query {
            Query::Select(select) => {
                let executor = self
                    .executor
                    .read()
                    .map_err(|_| anyhow!("datasource lock poisoned"))?;
                executor.select(&select).map(QueryResult::Rows)
            }
            other => {
                let mut executor = self
                    .executor
                    .write()
                    .map_err(|_| anyhow!("datasource lock poisoned"))?;
                executor.execute(other)
            }
        }
    }
}

impl DataSource for MemoryDataSource {
    /// Statements that produce no rows yield an empty result
    fn query(&self, sql: &str) -> Result<QueryRows, DataSourceError> {
        match self.execute(sql) {
            Ok(QueryResult::Rows(rows)) => Ok(rows),
            Ok(QueryResult::Message(_)) => Ok(QueryRows::default()),
            Err(e) if self.executor.is_poisoned() => {
                Err(DataSourceError::Unavailable(e.to_string()))
            }
            Err(e) => Err(DataSourceError::Query(e.to_string())),
        }
    }
}
