// Query Executor
// Runs parsed queries against the in-memory tables

use super::parser::{Projection, ProjectionItem, Query, SelectQuery};
use crate::datasource::QueryRows;
use crate::storage::{table::ColumnFilter, table::Table, Row};
use crate::value::SqlValue;
use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// Owns every table of the embedded database
pub struct QueryExecutor {
    tables: HashMap<String, Table>,
}

/// What a statement produced
#[derive(Debug)]
pub enum QueryResult {
    Rows(QueryRows),
    /// Outcome of a statement that returns no rows (CREATE, INSERT)
    Message(String),
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Execute any supported statement
    pub fn execute(&mut self, query: Query) -> Result<QueryResult> {
        match query {
            Query::CreateTable {
                name,
                schema,
                if_not_exists,
            } => {
                let key = name.to_lowercase();
                if self.tables.contains_key(&key) {
                    if if_not_exists {
                        return Ok(QueryResult::Message(format!(
                            "Table '{}' already exists, skipped",
                            name
                        )));
                    }
                    return Err(anyhow!("Table '{}' already exists", name));
                }

                self.tables.insert(key, Table::new(name.clone(), schema));
                Ok(QueryResult::Message(format!("Table '{}' created", name)))
            }

            Query::Insert {
                table_name,
                columns,
                rows,
            } => {
                let table = self
                    .tables
                    .get_mut(&table_name.to_lowercase())
                    .ok_or_else(|| anyhow!("Table '{}' not found", table_name))?;

                let positions = match &columns {
                    Some(names) => Some(
                        names
                            .iter()
                            .map(|name| {
                                table.get_schema().get_column_index(name).ok_or_else(|| {
                                    anyhow!("Column '{}' not found in '{}'", name, table_name)
                                })
                            })
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    None => None,
                };

                let column_count = table.get_schema().columns.len();
                let rows = rows
                    .into_iter()
                    .map(|values| match &positions {
                        Some(positions) => {
                            if positions.len() != values.len() {
                                return Err(anyhow!(
                                    "Expected {} values, got {}",
                                    positions.len(),
                                    values.len()
                                ));
                            }
                            let mut full = vec![SqlValue::Null; column_count];
                            for (&position, value) in positions.iter().zip(values) {
                                full[position] = value;
                            }
                            Ok(full)
                        }
                        None => Ok(values),
                    })
                    .collect::<Result<Vec<_>>>()?;

                let count = table.insert_all(rows)?;

                Ok(QueryResult::Message(format!(
                    "{} row(s) inserted into '{}'",
                    count, table_name
                )))
            }

            Query::Select(select) => self.select(&select).map(QueryResult::Rows),
        }
    }

    /// Run a SELECT without needing mutable access
    pub fn select(&self, query: &SelectQuery) -> Result<QueryRows> {
        let table = match &query.table_name {
            Some(name) => Some(
                self.tables
                    .get(&name.to_lowercase())
                    .ok_or_else(|| anyhow!("Table '{}' not found", name))?,
            ),
            None => None,
        };

        let matched: Vec<&Row> = match table {
            Some(table) => {
                let schema = table.get_schema();
                let filters = query
                    .filters
                    .iter()
                    .map(|clause| {
                        schema
                            .get_column_index(&clause.column)
                            .map(|column_index| ColumnFilter {
                                column_index,
                                value: clause.value.clone(),
                            })
                            .ok_or_else(|| anyhow!("Column not found: {}", clause.column))
                    })
                    .collect::<Result<Vec<_>>>()?;
                table.select(&filters)
            }
            None if !query.filters.is_empty() => {
                return Err(anyhow!("WHERE requires a FROM clause"))
            }
            None => Vec::new(),
        };

        let columns = Self::output_columns(&query.projection, table)?;

        let aggregate = query
            .projection
            .iter()
            .any(|p| p.item == ProjectionItem::CountAll);

        let rows = if aggregate {
            // A single summary row; plain columns cannot appear next to COUNT(*)
            let row = query
                .projection
                .iter()
                .map(|p| match &p.item {
                    ProjectionItem::CountAll => Ok(SqlValue::Integer(matched.len() as i64)),
                    ProjectionItem::Literal(value) => Ok(value.clone()),
                    _ => Err(anyhow!(
                        "'{}' must not be selected together with COUNT(*)",
                        p.label
                    )),
                })
                .collect::<Result<Vec<_>>>()?;
            vec![row]
        } else if let Some(table) = table {
            matched
                .iter()
                .map(|row| Self::project_row(&query.projection, table, row))
                .collect::<Result<Vec<_>>>()?
        } else {
            // SELECT without FROM: one row of literals
            let row = query
                .projection
                .iter()
                .map(|p| match &p.item {
                    ProjectionItem::Literal(value) => Ok(value.clone()),
                    _ => Err(anyhow!("'{}' requires a FROM clause", p.label)),
                })
                .collect::<Result<Vec<_>>>()?;
            vec![row]
        };

        Ok(QueryRows { columns, rows })
    }

    fn output_columns(projection: &[Projection], table: Option<&Table>) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        for p in projection {
            match (&p.item, table) {
                (ProjectionItem::Wildcard, Some(table)) => {
                    columns.extend(table.get_schema().column_names())
                }
                (ProjectionItem::Wildcard, None) => {
                    return Err(anyhow!("SELECT * requires a FROM clause"))
                }
                _ => columns.push(p.label.clone()),
            }
        }
        Ok(columns)
    }

    fn project_row(projection: &[Projection], table: &Table, row: &Row) -> Result<Vec<SqlValue>> {
        let schema = table.get_schema();
        let mut values = Vec::new();
        for p in projection {
            match &p.item {
                ProjectionItem::Wildcard => values.extend(row.values.iter().cloned()),
                ProjectionItem::Column(name) => {
                    let index = schema
                        .get_column_index(name)
                        .ok_or_else(|| anyhow!("Column not found: {}", name))?;
                    values.push(row.values[index].clone());
                }
                ProjectionItem::Literal(value) => values.push(value.clone()),
                ProjectionItem::CountAll => {
                    return Err(anyhow!("COUNT(*) cannot be evaluated per row"))
                }
            }
        }
        Ok(values)
    }

    /// Names of all tables, sorted
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.values().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryResult {
    /// Format the result for the interactive shell
    pub fn format(&self) -> String {
        match self {
            QueryResult::Message(msg) => msg.clone(),
            QueryResult::Rows(rows) => format_table(rows),
        }
    }
}

/// Draw rows as a box table, followed by the row count
pub fn format_table(result: &QueryRows) -> String {
    if result.rows.is_empty() {
        return "No rows found".to_string();
    }

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &result.rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.to_string().chars().count());
        }
    }

    let border = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(mid), right)
    };
    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
            .collect();
        format!("│{}│\n", padded.join("│"))
    };

    let mut out = border("┌", "┬", "┐");
    out.push_str(&line(result.columns.clone()));
    out.push_str(&border("├", "┼", "┤"));
    for row in &result.rows {
        out.push_str(&line(row.iter().map(|v| v.to_string()).collect()));
    }
    out.push_str(&border("└", "┴", "┘"));
    out.push_str(&format!("\n{} row(s) returned", result.rows.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParser;

    fn run(executor: &mut QueryExecutor, sql: &str) -> QueryResult {
        executor.execute(QueryParser::parse(sql).unwrap()).unwrap()
    }

    fn rows_of(result: QueryResult) -> QueryRows {
        match result {
            QueryResult::Rows(rows) => rows,
            QueryResult::Message(msg) => panic!("expected rows, got message: {}", msg),
        }
    }

    fn seeded() -> QueryExecutor {
        let mut executor = QueryExecutor::new();
        run(
            &mut executor,
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, score FLOAT)",
        );
        run(
            &mut executor,
            "INSERT INTO users VALUES (1, 'Ann', 9.5), (2, 'Bob', 7), (3, 'Cy', NULL)",
        );
        executor
    }

    #[test]
    fn test_select_star_and_projection() {
        let mut executor = seeded();

        let all = rows_of(run(&mut executor, "SELECT * FROM users"));
        assert_eq!(all.columns, vec!["id", "name", "score"]);
        assert_eq!(all.rows.len(), 3);
        assert_eq!(all.rows[1][2], SqlValue::Float(7.0));

        let some = rows_of(run(&mut executor, "SELECT name AS who FROM users WHERE id = 2"));
        assert_eq!(some.columns, vec!["who"]);
        assert_eq!(some.rows, vec![vec![SqlValue::Text("Bob".into())]]);
    }

    #[test]
    fn test_count_star() {
        let mut executor = seeded();
        let count = rows_of(run(&mut executor, "SELECT COUNT(*) c FROM users"));
        assert_eq!(count.columns, vec!["c"]);
        assert_eq!(count.rows, vec![vec![SqlValue::Integer(3)]]);

        let none = rows_of(run(&mut executor, "SELECT COUNT(*) AS c FROM users WHERE id = 9"));
        assert_eq!(none.rows, vec![vec![SqlValue::Integer(0)]]);
    }

    #[test]
    fn test_select_without_from() {
        let mut executor = QueryExecutor::new();
        let rows = rows_of(run(&mut executor, "SELECT 5 AS c, 'x' AS d"));
        assert_eq!(rows.columns, vec!["c", "d"]);
        assert_eq!(
            rows.rows,
            vec![vec![SqlValue::Integer(5), SqlValue::Text("x".into())]]
        );
    }

    #[test]
    fn test_insert_with_column_list_fills_nulls() {
        let mut executor = seeded();
        run(&mut executor, "INSERT INTO users (name, id) VALUES ('Di', 4)");
        let rows = rows_of(run(&mut executor, "SELECT * FROM users WHERE id = 4"));
        assert_eq!(
            rows.rows,
            vec![vec![
                SqlValue::Integer(4),
                SqlValue::Text("Di".into()),
                SqlValue::Null
            ]]
        );
    }

    #[test]
    fn test_errors() {
        let mut executor = seeded();
        let missing = executor.execute(QueryParser::parse("SELECT * FROM nope").unwrap());
        assert!(missing.unwrap_err().to_string().contains("not found"));

        let duplicate = executor.execute(
            QueryParser::parse("CREATE TABLE users (id INTEGER)").unwrap(),
        );
        assert!(duplicate.is_err());

        let skipped = executor.execute(
            QueryParser::parse("CREATE TABLE IF NOT EXISTS users (id INTEGER)").unwrap(),
        );
        assert!(skipped.is_ok());

        let mixed = executor.execute(QueryParser::parse("SELECT name, COUNT(*) FROM users").unwrap());
        assert!(mixed.is_err());
    }

    #[test]
    fn test_failed_insert_leaves_table_unchanged() {
        let mut executor = seeded();
        let clash = executor.execute(
            QueryParser::parse("INSERT INTO users VALUES (7, 'Gus', 1.0), (7, 'Hal', 2.0)").unwrap(),
        );
        assert!(clash.unwrap_err().to_string().contains("Primary key violation"));

        let count = rows_of(run(&mut executor, "SELECT COUNT(*) FROM users"));
        assert_eq!(count.rows, vec![vec![SqlValue::Integer(3)]]);
        let gus = rows_of(run(&mut executor, "SELECT * FROM users WHERE id = 7"));
        assert!(gus.rows.is_empty());
    }

    #[test]
    fn test_format_table() {
        let mut executor = seeded();
        let text = run(&mut executor, "SELECT id, name FROM users WHERE id = 1").format();
        assert!(text.contains("│ id │ name │"));
        assert!(text.contains("│ 1  │ Ann  │"));
        assert!(text.ends_with("1 row(s) returned"));
        assert_eq!(executor.list_tables(), vec!["users"]);
    }
}
