// Query execution and row shaping
//
// Query results are turned into compact JSON objects, one per row, with a
// separator entry between consecutive rows. The resolver reads them back
// through `unshape`, dropping the separators.

use crate::datasource::{DataSource, QueryRows};
use crate::error::{RenderError, RenderResult};
use crate::value::{Scalar, SqlValue};
use indexmap::IndexMap;
use tracing::debug;

/// Entry placed between two serialized rows
pub const ROW_SEPARATOR: &str = ",";

/// One query row after coercion, in query column order
pub type Row = IndexMap<String, Scalar>;

/// Serialized rows interleaved with [`ROW_SEPARATOR`].
/// For N rows it holds `max(0, 2N - 1)` entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapedSequence {
    entries: Vec<String>,
}

impl ShapedSequence {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a serialized row, preceded by a separator unless it is the first
    fn push_row(&mut self, row: String) {
        if !self.entries.is_empty() {
            self.entries.push(ROW_SEPARATOR.to_string());
        }
        self.entries.push(row);
    }

    /// Deserialize every non-separator entry back into a row
    pub fn unshape(&self) -> RenderResult<Vec<Row>> {
        self.entries
            .iter()
            .filter(|entry| entry.as_str() != ROW_SEPARATOR)
            .map(|entry| {
                serde_json::from_str(entry)
                    .map_err(|e| RenderError::Shape(format!("invalid row {}: {}", entry, e)))
            })
            .collect()
    }
}

/// Run `sql` verbatim against `datasource` and shape the result.
/// Datasource failures surface as [`RenderError::Query`]; nothing is retried.
pub fn execute<D: DataSource + ?Sized>(sql: &str, datasource: &D) -> RenderResult<ShapedSequence> {
    let rows = datasource.query(sql)?;
    debug!(sql, rows = rows.len(), "query executed");
    shape(&rows)
}

/// Coerce and serialize every row of a query result
pub fn shape(result: &QueryRows) -> RenderResult<ShapedSequence> {
    let mut sequence = ShapedSequence::default();

    for values in &result.rows {
        if values.len() != result.columns.len() {
            return Err(RenderError::Shape(format!(
                "row has {} values but the result has {} columns",
                values.len(),
                result.columns.len()
            )));
        }

        let row = result
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| Ok((column.clone(), coerce(value)?)))
            .collect::<RenderResult<Row>>()?;

        let json = serde_json::to_string(&row).map_err(|e| RenderError::Shape(e.to_string()))?;
        sequence.push_row(json);
    }

    Ok(sequence)
}

/// Map a raw cell onto a scalar.
///
/// Text and bytes that parse as a base-10 integer become numbers (so `"042"`
/// becomes `42`); otherwise they are kept as trimmed strings. Other values
/// pass through as their JSON counterpart.
pub fn coerce(value: &SqlValue) -> RenderResult<Scalar> {
    match value {
        SqlValue::Null => Ok(Scalar::Null),
        SqlValue::Text(text) => Ok(coerce_text(text)),
        SqlValue::Bytes(bytes) => Ok(coerce_text(&String::from_utf8_lossy(bytes))),
        SqlValue::Integer(i) => Ok(Scalar::from(*i)),
        SqlValue::Boolean(b) => Ok(Scalar::Bool(*b)),
        SqlValue::Float(f) => Scalar::from_f64(*f)
            .ok_or_else(|| RenderError::Shape(format!("{} has no JSON representation", f))),
    }
}

fn coerce_text(text: &str) -> Scalar {
    match text.parse::<i64>() {
        Ok(number) => Scalar::from(number),
        Err(_) => Scalar::String(text.trim().to_string()),
    }
}
