// Render module - turns a stored report into a document
//
// The pipeline is: resolve directives, run the templating pass over the
// resolved body, then hand the result to a document renderer. Both of the
// latter steps sit behind traits so other engines and backends can be used.

pub mod engine;
pub mod html;
pub mod options;

pub use engine::HandlebarsEngine;
pub use html::HtmlDocumentRenderer;
pub use options::{PageNumberPosition, PageNumbers, PrintOptions};

use crate::datasource::DataSource;
use crate::error::RenderResult;
use crate::report::Report;
use crate::template::{resolve, Datasets, ParameterMap};
use tracing::info;

/// Generic templating pass (iteration, conditionals) over a resolved template
pub trait TemplateEngine {
    fn render(&self, template: &str, datasets: &Datasets) -> RenderResult<String>;
}

/// Turns final text and print options into a binary document
pub trait DocumentRenderer {
    fn render(&self, document: &ReportDocument, options: &PrintOptions) -> RenderResult<Vec<u8>>;
}

/// Final text of a report, ready for a document renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub title: String,
    pub body: String,
    pub header: Option<String>,
    pub footer: Option<String>,
}

/// Full render pipeline for stored reports
pub struct ReportRenderer<E, D> {
    engine: E,
    renderer: D,
}

impl<E: TemplateEngine, D: DocumentRenderer> ReportRenderer<E, D> {
    pub fn new(engine: E, renderer: D) -> Self {
        Self { engine, renderer }
    }

    /// Resolve and template the report body, without producing a document
    pub fn render_text<S: DataSource + ?Sized>(
        &self,
        report: &Report,
        params: &ParameterMap,
        datasource: &S,
    ) -> RenderResult<String> {
        let resolution = resolve(&report.body, params, datasource)?;
        self.engine.render(&resolution.template, &resolution.datasets)
    }

    pub fn render<S: DataSource + ?Sized>(
        &self,
        report: &Report,
        params: &ParameterMap,
        options: &PrintOptions,
        datasource: &S,
    ) -> RenderResult<Vec<u8>> {
        let body = self.render_text(report, params, datasource)?;

        let document = ReportDocument {
            title: report.title.clone(),
            body,
            header: report.header_text().map(str::to_string),
            footer: report.footer_text().map(str::to_string),
        };

        let bytes = self.renderer.render(&document, options)?;
        info!(report = %report.name, bytes = bytes.len(), "report rendered");
        Ok(bytes)
    }
}

/// Handlebars templating with HTML output
pub type HtmlReportRenderer = ReportRenderer<HandlebarsEngine, HtmlDocumentRenderer>;

impl Default for HtmlReportRenderer {
    fn default() -> Self {
        Self::new(HandlebarsEngine::new(), HtmlDocumentRenderer::new())
    }
}
