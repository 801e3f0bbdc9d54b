// HTML document renderer
// Produces a standalone page whose @page rule carries the print options,
// ready for a browser or an HTML-to-PDF converter.

use super::options::PrintOptions;
use super::{DocumentRenderer, ReportDocument};
use crate::error::{RenderError, RenderResult};
use std::fmt::{self, Write};

#[derive(Debug, Clone, Default)]
pub struct HtmlDocumentRenderer;

impl HtmlDocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    fn page_rule(options: &PrintOptions) -> RenderResult<String> {
        let size = options.paper_size.trim();
        if size.is_empty() || !size.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(RenderError::Document(format!(
                "invalid paper size '{}'",
                options.paper_size
            )));
        }

        let mut rule = String::from("@page {\n");
        writeln!(rule, "  size: {} {};", size, options.orientation()).map_err(write_failed)?;
        writeln!(
            rule,
            "  margin: {}mm {}mm {}mm {}mm;",
            options.margin_top, options.margin_right, options.margin_bottom, options.margin_left
        )
        .map_err(write_failed)?;
        if options.page_numbers.enabled {
            writeln!(
                rule,
                "  {} {{ content: counter(page); }}",
                options.page_numbers.position.margin_box()
            )
            .map_err(write_failed)?;
        }
        rule.push('}');
        Ok(rule)
    }
}

impl DocumentRenderer for HtmlDocumentRenderer {
    fn render(&self, document: &ReportDocument, options: &PrintOptions) -> RenderResult<Vec<u8>> {
        let page_rule = Self::page_rule(options)?;

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        writeln!(html, "<title>{}</title>", escape_text(&document.title)).map_err(write_failed)?;
        writeln!(html, "<style>\n{}\n</style>", page_rule).map_err(write_failed)?;
        html.push_str("</head>\n<body>\n");
        if let Some(header) = &document.header {
            writeln!(html, "<header>{}</header>", header).map_err(write_failed)?;
        }
        writeln!(html, "<main>{}</main>", document.body).map_err(write_failed)?;
        if let Some(footer) = &document.footer {
            writeln!(html, "<footer>{}</footer>", footer).map_err(write_failed)?;
        }
        html.push_str("</body>\n</html>\n");

        Ok(html.into_bytes())
    }
}

fn write_failed(e: fmt::Error) -> RenderError {
    RenderError::Document(format!("could not build document: {}", e))
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
