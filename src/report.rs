// Stored report definitions and render requests

use crate::render::PrintOptions;
use crate::template::ParameterMap;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A stored report: a templated body plus optional header and footer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    pub name: String,
    pub title: String,
    pub description: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Report {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading report {}", path.display()))?;
        let report: Report = serde_json::from_str(&text)
            .with_context(|| format!("parsing report {}", path.display()))?;
        report.validate()?;
        Ok(report)
    }

    /// Name, title and body are required
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("name", &self.name), ("title", &self.title), ("body", &self.body)] {
            if value.trim().is_empty() {
                return Err(anyhow!("report field '{}' is required", field));
            }
        }
        Ok(())
    }

    pub fn header_text(&self) -> Option<&str> {
        non_empty(&self.header)
    }

    pub fn footer_text(&self) -> Option<&str> {
        non_empty(&self.footer)
    }
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|t| !t.trim().is_empty())
}

/// What a caller sends to render a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,
    pub params: ParameterMap,
    pub printing_options: PrintOptions,
}

impl RenderRequest {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading request {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing request {}", path.display()))
    }

    /// Check that the request targets `report`, when it names one
    pub fn check_target(&self, report: &Report) -> Result<()> {
        match &self.report_name {
            Some(name) if name != &report.name => Err(anyhow!(
                "request is for report '{}', not '{}'",
                name,
                report.name
            )),
            _ => Ok(()),
        }
    }
}
