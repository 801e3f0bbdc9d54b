// B-Tree index over a single column
// Used for primary key uniqueness checks and equality lookups

use crate::value::SqlValue;
use std::collections::BTreeMap;

/// Maps column values to the positions of the rows holding them
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    tree: BTreeMap<IndexKey, Vec<usize>>,
    column_name: String,
}

/// Wrapper giving SqlValue the total order BTreeMap needs
#[derive(Debug, Clone)]
pub struct IndexKey(pub SqlValue);

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.compare(&other.0)
    }
}

impl BTreeIndex {
    pub fn new(column_name: String) -> Self {
        Self {
            tree: BTreeMap::new(),
            column_name,
        }
    }

    /// Record that the row at `row_id` holds `value`
    pub fn insert(&mut self, value: SqlValue, row_id: usize) {
        self.tree.entry(IndexKey(value)).or_default().push(row_id);
    }

    /// Row positions holding `value`, in insertion order
    pub fn lookup(&self, value: &SqlValue) -> Option<&Vec<usize>> {
        self.tree.get(&IndexKey(value.clone()))
    }

    pub fn contains(&self, value: &SqlValue) -> bool {
        self.lookup(value).is_some()
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Number of distinct values in the index
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
