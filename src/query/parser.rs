// SQL Parser
// Converts SQL strings into the structured queries the embedded engine runs
// The sqlparser crate handles the SQL grammar; we map its AST onto our subset

use crate::storage::{Column, DataType, Schema};
use crate::value::SqlValue;
use anyhow::{anyhow, Result};
use sqlparser::ast::{
    BinaryOperator, DataType as SqlDataType, Expr, ObjectName, Select, SelectItem, SetExpr,
    Statement, TableFactor, UnaryOperator, Value as AstValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// The statements the embedded engine supports
#[derive(Debug)]
pub enum Query {
    /// CREATE TABLE [IF NOT EXISTS] name (col TYPE [PRIMARY KEY] [NOT NULL], ...)
    CreateTable {
        name: String,
        schema: Schema,
        if_not_exists: bool,
    },
    /// INSERT INTO name [(cols)] VALUES (...), (...)
    Insert {
        table_name: String,
        columns: Option<Vec<String>>,
        rows: Vec<Vec<SqlValue>>,
    },
    Select(SelectQuery),
}

/// SELECT <projection> [FROM table] [WHERE col = value [AND ...]]
#[derive(Debug, Clone)]
pub struct SelectQuery {
    pub table_name: Option<String>,
    pub projection: Vec<Projection>,
    pub filters: Vec<WhereClause>,
}

/// One output column of a SELECT, with the name it is reported under
#[derive(Debug, Clone)]
pub struct Projection {
    pub item: ProjectionItem,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionItem {
    Wildcard,
    Column(String),
    Literal(SqlValue),
    CountAll,
}

/// A single `column = value` condition
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub column: String,
    pub value: SqlValue,
}

/// The query parser
pub struct QueryParser;

impl QueryParser {
    /// Parse exactly one SQL statement
    pub fn parse(sql: &str) -> Result<Query> {
        let mut queries = Self::parse_all(sql)?;
        if queries.len() != 1 {
            return Err(anyhow!("Only single statements are supported"));
        }
        Ok(queries.remove(0))
    }

    /// Parse a `;`-separated script into its statements
    pub fn parse_all(sql: &str) -> Result<Vec<Query>> {
        let dialect = GenericDialect {};
        let ast = Parser::parse_sql(&dialect, sql)
            .map_err(|e| anyhow!("SQL parsing error: {}", e))?;

        ast.iter().map(Self::parse_statement).collect()
    }

    fn parse_statement(statement: &Statement) -> Result<Query> {
        match statement {
            Statement::CreateTable(create_table) => Self::parse_create_table(create_table),
            Statement::Insert(insert) => Self::parse_insert(insert),
            Statement::Query(query) => Self::parse_select(query),
            _ => Err(anyhow!("Unsupported SQL statement: {}", statement)),
        }
    }

    fn parse_create_table(create_table: &sqlparser::ast::CreateTable) -> Result<Query> {
        let mut columns = Vec::new();

        for column_def in &create_table.columns {
            let primary_key = column_def.options.iter().any(|opt| {
                matches!(
                    opt.option,
                    sqlparser::ast::ColumnOption::Unique { is_primary: true, .. }
                )
            });
            let nullable = !column_def
                .options
                .iter()
                .any(|opt| matches!(opt.option, sqlparser::ast::ColumnOption::NotNull));

            columns.push(Column {
                name: column_def.name.value.clone(),
                data_type: Self::parse_data_type(&column_def.data_type)?,
                primary_key,
                nullable,
            });
        }

        if columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(anyhow!("Only one PRIMARY KEY column is supported"));
        }

        Ok(Query::CreateTable {
            name: Self::object_name(&create_table.name),
            schema: Schema::new(columns),
            if_not_exists: create_table.if_not_exists,
        })
    }

    fn parse_insert(insert: &sqlparser::ast::Insert) -> Result<Query> {
        let table_name = Self::object_name(&insert.table_name);

        let columns = if insert.columns.is_empty() {
            None
        } else {
            Some(insert.columns.iter().map(|c| c.value.clone()).collect())
        };

        let rows = match &insert.source {
            Some(source) => match source.body.as_ref() {
                SetExpr::Values(values) if !values.rows.is_empty() => values
                    .rows
                    .iter()
                    .map(|row| row.iter().map(Self::parse_value).collect())
                    .collect::<Result<Vec<_>>>()?,
                SetExpr::Values(_) => return Err(anyhow!("No values provided")),
                _ => return Err(anyhow!("Only INSERT ... VALUES is supported")),
            },
            None => return Err(anyhow!("No values provided")),
        };

        Ok(Query::Insert {
            table_name,
            columns,
            rows,
        })
    }

    fn parse_select(query: &sqlparser::ast::Query) -> Result<Query> {
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            _ => return Err(anyhow!("Unsupported SELECT format")),
        };

        let table_name = Self::extract_table_name(select)?;

        let projection = select
            .projection
            .iter()
            .map(Self::parse_projection)
            .collect::<Result<Vec<_>>>()?;

        let mut filters = Vec::new();
        if let Some(selection) = &select.selection {
            Self::parse_where_clause(selection, &mut filters)?;
        }

        Ok(Query::Select(SelectQuery {
            table_name,
            projection,
            filters,
        }))
    }

    fn parse_projection(item: &SelectItem) -> Result<Projection> {
        match item {
            SelectItem::Wildcard(_) => Ok(Projection {
                item: ProjectionItem::Wildcard,
                label: "*".to_string(),
            }),
            SelectItem::UnnamedExpr(expr) => {
                let item = Self::parse_projection_expr(expr)?;
                let label = match &item {
                    ProjectionItem::Column(name) => name.clone(),
                    _ => expr.to_string(),
                };
                Ok(Projection { item, label })
            }
            SelectItem::ExprWithAlias { expr, alias } => Ok(Projection {
                item: Self::parse_projection_expr(expr)?,
                label: alias.value.clone(),
            }),
            _ => Err(anyhow!("Unsupported select item: {}", item)),
        }
    }

    fn parse_projection_expr(expr: &Expr) -> Result<ProjectionItem> {
        match expr {
            Expr::Identifier(ident) => Ok(ProjectionItem::Column(ident.value.clone())),
            Expr::CompoundIdentifier(idents) => idents
                .last()
                .map(|ident| ProjectionItem::Column(ident.value.clone()))
                .ok_or_else(|| anyhow!("Empty column reference")),
            Expr::Nested(inner) => Self::parse_projection_expr(inner),
            Expr::Function(_) if expr.to_string().eq_ignore_ascii_case("count(*)") => {
                Ok(ProjectionItem::CountAll)
            }
            _ => Self::parse_value(expr).map(ProjectionItem::Literal),
        }
    }

    fn parse_data_type(sql_type: &SqlDataType) -> Result<DataType> {
        match sql_type {
            SqlDataType::Int(_) | SqlDataType::Integer(_) | SqlDataType::BigInt(_) => {
                Ok(DataType::Integer)
            }
            SqlDataType::Float(_) | SqlDataType::Double | SqlDataType::Real => Ok(DataType::Float),
            SqlDataType::Text | SqlDataType::Varchar(_) | SqlDataType::String(_) => {
                Ok(DataType::Text)
            }
            SqlDataType::Boolean | SqlDataType::Bool => Ok(DataType::Boolean),
            SqlDataType::Blob(_) | SqlDataType::Bytea => Ok(DataType::Blob),
            _ => Err(anyhow!("Unsupported data type: {}", sql_type)),
        }
    }

    /// Parse a literal (number, string, boolean, NULL, or a negated number)
    fn parse_value(expr: &Expr) -> Result<SqlValue> {
        match expr {
            Expr::Value(AstValue::Number(n, _)) => {
                if n.contains(['.', 'e', 'E']) {
                    Ok(SqlValue::Float(n.parse()?))
                } else {
                    Ok(SqlValue::Integer(n.parse()?))
                }
            }
            Expr::Value(AstValue::SingleQuotedString(s)) => Ok(SqlValue::Text(s.clone())),
            Expr::Value(AstValue::Boolean(b)) => Ok(SqlValue::Boolean(*b)),
            Expr::Value(AstValue::Null) => Ok(SqlValue::Null),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => match Self::parse_value(inner)? {
                SqlValue::Integer(i) => Ok(SqlValue::Integer(-i)),
                SqlValue::Float(f) => Ok(SqlValue::Float(-f)),
                other => Err(anyhow!("Cannot negate {:?}", other)),
            },
            Expr::Nested(inner) => Self::parse_value(inner),
            _ => Err(anyhow!("Unsupported value expression: {}", expr)),
        }
    }

    fn extract_table_name(select: &Select) -> Result<Option<String>> {
        match select.from.as_slice() {
            [] => Ok(None),
            [from] if from.joins.is_empty() => match &from.relation {
                TableFactor::Table { name, .. } => Ok(Some(Self::object_name(name))),
                _ => Err(anyhow!("Unsupported table reference")),
            },
            _ => Err(anyhow!("Joins and multiple tables are not supported")),
        }
    }

    /// Flatten `a = 1 AND b = 'x'` into a list of equality conditions
    fn parse_where_clause(expr: &Expr, filters: &mut Vec<WhereClause>) -> Result<()> {
        match expr {
            Expr::Nested(inner) => Self::parse_where_clause(inner, filters),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                Self::parse_where_clause(left, filters)?;
                Self::parse_where_clause(right, filters)
            }
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                let (column, value) = match (Self::column_ref(left), Self::column_ref(right)) {
                    (Some(column), _) => (column, Self::parse_value(right)?),
                    (None, Some(column)) => (column, Self::parse_value(left)?),
                    (None, None) => {
                        return Err(anyhow!("Expected column name in WHERE clause"))
                    }
                };
                filters.push(WhereClause { column, value });
                Ok(())
            }
            _ => Err(anyhow!(
                "Only column = value conditions joined by AND are supported in WHERE"
            )),
        }
    }

    fn column_ref(expr: &Expr) -> Option<String> {
        match expr {
            Expr::Identifier(ident) => Some(ident.value.clone()),
            Expr::CompoundIdentifier(idents) => idents.last().map(|i| i.value.clone()),
            _ => None,
        }
    }

    fn object_name(name: &ObjectName) -> String {
        name.0
            .iter()
            .map(|i| i.value.clone())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_with_bare_alias() {
        let query = QueryParser::parse("SELECT COUNT(*) c FROM t").unwrap();
        match query {
            Query::Select(select) => {
                assert_eq!(select.table_name.as_deref(), Some("t"));
                assert_eq!(select.projection.len(), 1);
                assert_eq!(select.projection[0].item, ProjectionItem::CountAll);
                assert_eq!(select.projection[0].label, "c");
            }
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_where_conjunction() {
        let query =
            QueryParser::parse("SELECT id, name AS n FROM users WHERE id = 2 AND name = 'Bob'")
                .unwrap();
        let Query::Select(select) = query else {
            panic!("expected SELECT");
        };
        assert_eq!(select.projection[0].label, "id");
        assert_eq!(select.projection[1].label, "n");
        assert_eq!(select.filters.len(), 2);
        assert_eq!(select.filters[0].value, SqlValue::Integer(2));
        assert_eq!(select.filters[1].value, SqlValue::Text("Bob".into()));
    }

    #[test]
    fn test_parse_multi_row_insert() {
        let query =
            QueryParser::parse("INSERT INTO t (a, b) VALUES (1, 'x'), (-2, NULL)").unwrap();
        let Query::Insert {
            table_name,
            columns,
            rows,
        } = query
        else {
            panic!("expected INSERT");
        };
        assert_eq!(table_name, "t");
        assert_eq!(columns, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(rows[1], vec![SqlValue::Integer(-2), SqlValue::Null]);
    }

    #[test]
    fn test_parse_script() {
        let queries = QueryParser::parse_all(
            "CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY, raw BLOB NOT NULL); \
             INSERT INTO t VALUES (1, '042');",
        )
        .unwrap();
        assert_eq!(queries.len(), 2);
        let Query::CreateTable {
            schema,
            if_not_exists,
            ..
        } = &queries[0]
        else {
            panic!("expected CREATE TABLE");
        };
        assert!(*if_not_exists);
        assert_eq!(schema.columns[1].data_type, DataType::Blob);
        assert!(!schema.columns[1].nullable);
    }

    #[test]
    fn test_rejects_unsupported_where() {
        assert!(QueryParser::parse("SELECT * FROM t WHERE a > 1").is_err());
    }
}
