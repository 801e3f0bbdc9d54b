// Table implementation
// A table combines a schema, its rows in insertion order, and indexes

use super::btree::{BTreeIndex, IndexKey};
use super::{Row, Schema};
use crate::value::SqlValue;
use anyhow::{anyhow, Result};
use std::collections::{BTreeSet, HashMap};

/// An equality condition on one column, already resolved to its position
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub column_index: usize,
    pub value: SqlValue,
}

pub struct Table {
    pub name: String,
    pub schema: Schema,
    rows: Vec<Row>,
    /// Indexes keyed by column name; the primary key is always indexed
    indexes: HashMap<String, BTreeIndex>,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        let mut indexes = HashMap::new();

        if let Some(pk_index) = schema.get_primary_key_index() {
            let pk_name = schema.columns[pk_index].name.clone();
            indexes.insert(pk_name.clone(), BTreeIndex::new(pk_name));
        }

        Self {
            name,
            schema,
            rows: Vec::new(),
            indexes,
        }
    }

    /// Insert a row given one value per schema column
    pub fn insert(&mut self, values: Vec<SqlValue>) -> Result<usize> {
        self.insert_all(vec![values])?;
        Ok(self.rows.len() - 1)
    }

    /// Insert several rows, all or none.
    /// Every row is coerced and checked against the constraints, including
    /// key clashes inside the batch, before any of them is stored.
    pub fn insert_all(&mut self, rows: Vec<Vec<SqlValue>>) -> Result<usize> {
        let prepared = rows
            .into_iter()
            .map(|values| self.prepare(values))
            .collect::<Result<Vec<_>>>()?;

        if let Some(pk_index) = self.schema.get_primary_key_index() {
            let index = self.indexes.get(&self.schema.columns[pk_index].name);
            let mut batch_keys = BTreeSet::new();
            for values in &prepared {
                let key = &values[pk_index];
                let stored = index.is_some_and(|index| index.contains(key));
                if stored || !batch_keys.insert(IndexKey(key.clone())) {
                    return Err(anyhow!(
                        "Primary key violation: duplicate value {} in '{}'",
                        key,
                        self.name
                    ));
                }
            }
        }

        let count = prepared.len();
        for values in prepared {
            self.push(values);
        }
        Ok(count)
    }

    /// Coerce values to the column types and check NOT NULL
    fn prepare(&self, values: Vec<SqlValue>) -> Result<Vec<SqlValue>> {
        if values.len() != self.schema.columns.len() {
            return Err(anyhow!(
                "Expected {} values, got {}",
                self.schema.columns.len(),
                values.len()
            ));
        }

        let mut coerced = Vec::with_capacity(values.len());
        for (column, value) in self.schema.columns.iter().zip(values) {
            let value = column.data_type.coerce(value)?;
            if matches!(value, SqlValue::Null) && (!column.nullable || column.primary_key) {
                return Err(anyhow!("Column '{}' cannot be NULL", column.name));
            }
            coerced.push(value);
        }
        Ok(coerced)
    }

    fn push(&mut self, values: Vec<SqlValue>) {
        let row_id = self.rows.len();
        for (col_index, value) in values.iter().enumerate() {
            let col_name = &self.schema.columns[col_index].name;
            if let Some(index) = self.indexes.get_mut(col_name) {
                index.insert(value.clone(), row_id);
            }
        }
        self.rows.push(Row { values });
    }

    /// Rows matching every filter, in insertion order.
    /// An indexed filter column narrows the candidates before the scan.
    pub fn select(&self, filters: &[ColumnFilter]) -> Vec<&Row> {
        if filters.iter().any(|f| matches!(f.value, SqlValue::Null)) {
            return Vec::new();
        }

        let indexed = filters.iter().find_map(|f| {
            let col_name = &self.schema.columns[f.column_index].name;
            self.indexes.get(col_name).map(|index| index.lookup(&f.value))
        });

        let matches = |row: &&Row| {
            filters
                .iter()
                .all(|f| row.values[f.column_index].sql_eq(&f.value))
        };

        match indexed {
            Some(Some(row_ids)) => row_ids
                .iter()
                .filter_map(|&id| self.rows.get(id))
                .filter(matches)
                .collect(),
            Some(None) => Vec::new(),
            None => self.rows.iter().filter(matches).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Column, DataType};

    fn users() -> Table {
        let column = |name: &str, data_type, primary_key| Column {
            name: name.to_string(),
            data_type,
            primary_key,
            nullable: true,
        };
        Table::new(
            "users".to_string(),
            Schema::new(vec![
                column("id", DataType::Integer, true),
                column("name", DataType::Text, false),
            ]),
        )
    }

    #[test]
    fn test_insert_rejects_duplicate_primary_key() {
        let mut table = users();
        table
            .insert(vec![SqlValue::Integer(1), SqlValue::Text("Ann".into())])
            .unwrap();
        let err = table
            .insert(vec![SqlValue::Integer(1), SqlValue::Text("Bob".into())])
            .unwrap_err();
        assert!(err.to_string().contains("Primary key violation"));
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_insert_all_is_all_or_nothing() {
        let mut table = users();
        table
            .insert(vec![SqlValue::Integer(1), SqlValue::Text("Ann".into())])
            .unwrap();

        let clash_in_batch = table.insert_all(vec![
            vec![SqlValue::Integer(2), SqlValue::Text("Bob".into())],
            vec![SqlValue::Integer(2), SqlValue::Text("Cy".into())],
        ]);
        assert!(clash_in_batch.is_err());

        let clash_with_stored = table.insert_all(vec![
            vec![SqlValue::Integer(3), SqlValue::Text("Di".into())],
            vec![SqlValue::Integer(1), SqlValue::Text("Ed".into())],
        ]);
        assert!(clash_with_stored.is_err());

        let bad_type = table.insert_all(vec![
            vec![SqlValue::Integer(4), SqlValue::Text("Fay".into())],
            vec![SqlValue::Text("five".into()), SqlValue::Text("Gus".into())],
        ]);
        assert!(bad_type.is_err());

        assert_eq!(table.row_count(), 1);
        assert!(table
            .select(&[ColumnFilter {
                column_index: 0,
                value: SqlValue::Integer(3),
            }])
            .is_empty());

        assert_eq!(
            table
                .insert_all(vec![
                    vec![SqlValue::Integer(2), SqlValue::Text("Bob".into())],
                    vec![SqlValue::Integer(3), SqlValue::Text("Cy".into())],
                ])
                .unwrap(),
            2
        );
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_insert_rejects_null_primary_key() {
        let mut table = users();
        assert!(table
            .insert(vec![SqlValue::Null, SqlValue::Text("Ann".into())])
            .is_err());
    }

    #[test]
    fn test_select_keeps_insertion_order() {
        let mut table = users();
        for (id, name) in [(3, "Cy"), (1, "Ann"), (2, "Bob")] {
            table
                .insert(vec![SqlValue::Integer(id), SqlValue::Text(name.into())])
                .unwrap();
        }

        let names: Vec<String> = table
            .select(&[])
            .iter()
            .map(|row| row.values[1].to_string())
            .collect();
        assert_eq!(names, vec!["Cy", "Ann", "Bob"]);
    }

    #[test]
    fn test_select_with_index_and_scan_filters() {
        let mut table = users();
        table
            .insert(vec![SqlValue::Integer(1), SqlValue::Text("Ann".into())])
            .unwrap();
        table
            .insert(vec![SqlValue::Integer(2), SqlValue::Text("Ann".into())])
            .unwrap();

        let by_name = table.select(&[ColumnFilter {
            column_index: 1,
            value: SqlValue::Text("Ann".into()),
        }]);
        assert_eq!(by_name.len(), 2);

        let by_both = table.select(&[
            ColumnFilter {
                column_index: 1,
                value: SqlValue::Text("Ann".into()),
            },
            ColumnFilter {
                column_index: 0,
                value: SqlValue::Integer(2),
            },
        ]);
        assert_eq!(by_both.len(), 1);
        assert_eq!(by_both[0].values[0], SqlValue::Integer(2));
    }
}
