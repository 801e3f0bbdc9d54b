// Template resolution
//
// Two passes over the template: parameters first, then queries against the
// already-bound text. A query returning exactly one row is inlined; any other
// row count is registered as a dataset and the directive becomes its key.

use super::binder::{bind_parameters, ParameterMap};
use super::directive::{scan, DirectiveKind};
use super::shaper::{execute, Row};
use crate::datasource::DataSource;
use crate::error::RenderResult;
use indexmap::IndexMap;
use tracing::{debug, info};

/// Datasets by key, in registration order
pub type Datasets = IndexMap<String, Vec<Row>>;

/// The output of a successful resolution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub template: String,
    pub datasets: Datasets,
}

/// Hands out dataset keys and stores registered datasets.
///
/// The counter advances once per query directive, including directives that
/// end up inlined, so keys can have gaps (`data_0`, `data_2`).
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    processed: usize,
    datasets: Datasets,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for the directive currently being processed, advancing the counter
    pub fn next_key(&mut self) -> String {
        let key = dataset_key(self.processed);
        self.processed += 1;
        key
    }

    pub fn register(&mut self, key: String, rows: Vec<Row>) {
        self.datasets.insert(key, rows);
    }

    pub fn into_datasets(self) -> Datasets {
        self.datasets
    }
}

/// Dataset key for the query directive at `index` (0-based)
pub fn dataset_key(index: usize) -> String {
    format!("data_{}", index)
}

/// Resolve every directive in `template`.
///
/// Fails on the first missing parameter (before any query runs) or on the
/// first query that fails; no partially resolved template is returned.
pub fn resolve<D: DataSource + ?Sized>(
    template: &str,
    params: &ParameterMap,
    datasource: &D,
) -> RenderResult<Resolution> {
    let mut resolved = bind_parameters(template, params)?;

    let mut registry = DatasetRegistry::new();
    let directives = scan(&resolved, DirectiveKind::Query);
    debug!(queries = directives.len(), "parameters bound");

    for directive in directives {
        let rows = execute(&directive.expression, datasource)?.unshape()?;
        let key = registry.next_key();

        if let [row] = rows.as_slice() {
            // Single row: inline the value of its first column
            let value = row.values().next().map(|v| v.to_string()).unwrap_or_default();
            debug!(sql = %directive.expression, "inlining single-row result");
            resolved = directive.substitute(&resolved, &value);
        } else {
            debug!(sql = %directive.expression, %key, rows = rows.len(), "registering dataset");
            resolved = directive.substitute(&resolved, &key);
            registry.register(key, rows);
        }
    }

    let datasets = registry.into_datasets();
    info!(datasets = datasets.len(), "template resolved");

    Ok(Resolution {
        template: resolved,
        datasets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{DataSourceError, QueryRows};
    use crate::error::RenderError;
    use crate::value::{Scalar, SqlValue};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers each SQL text with a canned result and records every call
    #[derive(Default)]
    struct ScriptedSource {
        answers: HashMap<String, QueryRows>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn answer(mut self, sql: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
            self.answers.insert(
                sql.to_string(),
                QueryRows {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                    rows,
                },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DataSource for ScriptedSource {
        fn query(&self, sql: &str) -> Result<QueryRows, DataSourceError> {
            self.calls.lock().unwrap().push(sql.to_string());
            self.answers
                .get(sql)
                .cloned()
                .ok_or_else(|| DataSourceError::Query(format!("no such table in: {}", sql)))
        }
    }

    const COUNT_SQL: &str = "SELECT COUNT(*) c FROM t";
    const TEMPLATE: &str = "Hello [P[name]]. Total: [Q[SELECT COUNT(*) c FROM t]]";

    fn ann() -> ParameterMap {
        HashMap::from([("name".to_string(), Scalar::from("Ann"))])
    }

    #[test]
    fn test_template_without_directives_is_unchanged() {
        let source = ScriptedSource::default();
        let resolution = resolve("plain {{text}}", &ParameterMap::new(), &source).unwrap();
        assert_eq!(resolution.template, "plain {{text}}");
        assert!(resolution.datasets.is_empty());
        assert!(source.calls().is_empty());
    }

    #[test]
    fn test_single_row_is_inlined() {
        let source =
            ScriptedSource::default().answer(COUNT_SQL, &["c"], vec![vec![SqlValue::Integer(5)]]);

        let resolution = resolve(TEMPLATE, &ann(), &source).unwrap();
        assert_eq!(resolution.template, "Hello Ann. Total: 5");
        assert!(resolution.datasets.is_empty());
    }

    #[test]
    fn test_multiple_rows_become_a_dataset() {
        let source = ScriptedSource::default().answer(
            COUNT_SQL,
            &["c"],
            vec![vec![SqlValue::Integer(5)], vec![SqlValue::Integer(6)]],
        );

        let resolution = resolve(TEMPLATE, &ann(), &source).unwrap();
        assert_eq!(resolution.template, "Hello Ann. Total: data_0");
        let rows = &resolution.datasets["data_0"];
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["c"], Scalar::from(5i64));
        assert_eq!(rows[1]["c"], Scalar::from(6i64));
    }

    #[test]
    fn test_zero_rows_register_an_empty_dataset() {
        let source = ScriptedSource::default().answer("SELECT * FROM t", &["c"], vec![]);
        let resolution = resolve("[Q[SELECT * FROM t]]", &ParameterMap::new(), &source).unwrap();
        assert_eq!(resolution.template, "data_0");
        assert_eq!(resolution.datasets["data_0"], Vec::<Row>::new());
    }

    #[test]
    fn test_dataset_keys_count_inlined_queries() {
        let source = ScriptedSource::default()
            .answer("SELECT a", &["a"], vec![vec![SqlValue::Text("one".into())]])
            .answer(
                "SELECT b",
                &["b"],
                vec![vec![SqlValue::Integer(1)], vec![SqlValue::Integer(2)]],
            );

        let resolution =
            resolve("[Q[SELECT a]] / [Q[SELECT b]]", &ParameterMap::new(), &source).unwrap();
        assert_eq!(resolution.template, "one / data_1");
        assert_eq!(resolution.datasets.keys().collect::<Vec<_>>(), vec!["data_1"]);
    }

    #[test]
    fn test_single_row_inlines_first_column() {
        let source = ScriptedSource::default().answer(
            "SELECT name, id FROM t",
            &["name", "id"],
            vec![vec![SqlValue::Text("Ann".into()), SqlValue::Integer(1)]],
        );
        let resolution =
            resolve("[Q[SELECT name, id FROM t]]", &ParameterMap::new(), &source).unwrap();
        assert_eq!(resolution.template, "Ann");
    }

    #[test]
    fn test_repeated_query_runs_per_occurrence() {
        let source = ScriptedSource::default().answer(
            "SELECT x",
            &["x"],
            vec![vec![SqlValue::Integer(1)], vec![SqlValue::Integer(2)]],
        );

        let resolution =
            resolve("[Q[SELECT x]] and [Q[SELECT x]]", &ParameterMap::new(), &source).unwrap();
        assert_eq!(resolution.template, "data_0 and data_0");
        assert_eq!(source.calls().len(), 2);
        assert_eq!(
            resolution.datasets.keys().collect::<Vec<_>>(),
            vec!["data_0", "data_1"]
        );
    }

    #[test]
    fn test_missing_parameter_runs_no_queries() {
        let source =
            ScriptedSource::default().answer(COUNT_SQL, &["c"], vec![vec![SqlValue::Integer(5)]]);

        let err = resolve(TEMPLATE, &ParameterMap::new(), &source).unwrap_err();
        assert!(matches!(err, RenderError::MissingParameter(ref name) if name == "name"));
        assert_eq!(err.to_string(), "Parameter name is not provided.");
        assert!(source.calls().is_empty());
    }

    #[test]
    fn test_parameter_values_cannot_smuggle_directives() {
        let source =
            ScriptedSource::default().answer(COUNT_SQL, &["c"], vec![vec![SqlValue::Integer(5)]]);
        let params = HashMap::from([
            ("a".to_string(), Scalar::from("[P[b]]")),
            ("b".to_string(), Scalar::from("B")),
        ]);

        let err = resolve("x [P[a]] y [Q[SELECT COUNT(*) c FROM t]]", &params, &source).unwrap_err();
        assert!(matches!(err, RenderError::NestedParameter { .. }));
        assert!(source.calls().is_empty());
    }

    #[test]
    fn test_parameters_are_bound_inside_queries() {
        let source = ScriptedSource::default().answer(
            "SELECT name FROM users WHERE id = 3",
            &["name"],
            vec![vec![SqlValue::Text("Cy".into())]],
        );
        let params = HashMap::from([("id".to_string(), Scalar::from(3i64))]);

        let resolution = resolve(
            "Hi [Q[SELECT name FROM users WHERE id = [P[id]]]]!",
            &params,
            &source,
        )
        .unwrap();
        assert_eq!(resolution.template, "Hi Cy!");
        assert_eq!(source.calls(), vec!["SELECT name FROM users WHERE id = 3"]);
    }

    #[test]
    fn test_query_failure_aborts_resolution() {
        let source =
            ScriptedSource::default().answer("SELECT a", &["a"], vec![vec![SqlValue::Integer(1)]]);

        let err = resolve(
            "[Q[SELECT a]] [Q[SELECT broken]] [Q[SELECT a]]",
            &ParameterMap::new(),
            &source,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Query(_)));
        assert_eq!(source.calls(), vec!["SELECT a", "SELECT broken"]);
    }

    #[test]
    fn test_registry_counter() {
        let mut registry = DatasetRegistry::new();
        assert_eq!(registry.next_key(), "data_0");
        assert_eq!(registry.next_key(), "data_1");
        registry.register("data_1".to_string(), vec![]);
        assert_eq!(registry.into_datasets().len(), 1);
    }
}
