// Error types for report rendering

use crate::datasource::DataSourceError;
use thiserror::Error;

/// Every way a render can fail. All are terminal for the render that hit them.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A `[P[name]]` directive names a parameter the caller did not supply.
    #[error("Parameter {0} is not provided.")]
    MissingParameter(String),

    /// A parameter value carried a `[P[name]]` directive of its own.
    #[error("Parameter {parameter} inserts unresolved directive [P[{directive}]].")]
    NestedParameter { parameter: String, directive: String },

    /// A `[Q[sql]]` directive failed at the datasource.
    #[error("Query failed: {0}")]
    Query(#[from] DataSourceError),

    /// Query rows could not be turned into JSON rows or back.
    #[error("Could not shape query rows: {0}")]
    Shape(String),

    /// The templating pass over the resolved template failed.
    #[error("Template rendering failed: {0}")]
    Template(String),

    /// The document renderer rejected the document or its print options.
    #[error("Document rendering failed: {0}")]
    Document(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
