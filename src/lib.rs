// RustyReports - template-driven report rendering over a relational datasource
// This is the library root that exposes the public API

pub mod datasource;
pub mod error;
pub mod query;
pub mod render;
pub mod report;
pub mod storage;
pub mod template;
pub mod value;

// Re-export commonly used types for convenience
pub use datasource::{DataSource, DataSourceError, MemoryDataSource, QueryRows};
pub use error::{RenderError, RenderResult};
pub use render::{
    DocumentRenderer, HandlebarsEngine, HtmlDocumentRenderer, HtmlReportRenderer, PrintOptions,
    ReportRenderer, TemplateEngine,
};
pub use report::{RenderRequest, Report};
pub use template::{resolve, Datasets, ParameterMap, Resolution};
pub use value::{Scalar, SqlValue};
