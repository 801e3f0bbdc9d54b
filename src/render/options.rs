// Print configuration handed to document renderers

use serde::{Deserialize, Serialize};

/// Page setup for a rendered document. Margins are in millimetres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintOptions {
    pub paper_size: String,
    pub landscape: bool,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    pub page_numbers: PageNumbers,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            paper_size: "A4".to_string(),
            landscape: false,
            margin_top: 0,
            margin_right: 0,
            margin_bottom: 0,
            margin_left: 0,
            page_numbers: PageNumbers::default(),
        }
    }
}

impl PrintOptions {
    pub fn orientation(&self) -> &'static str {
        if self.landscape {
            "landscape"
        } else {
            "portrait"
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNumbers {
    pub enabled: bool,
    pub position: PageNumberPosition,
}

/// Where page numbers go, named after the CSS page margin boxes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageNumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl PageNumberPosition {
    pub fn margin_box(self) -> &'static str {
        match self {
            PageNumberPosition::TopLeft => "@top-left",
            PageNumberPosition::TopCenter => "@top-center",
            PageNumberPosition::TopRight => "@top-right",
            PageNumberPosition::BottomLeft => "@bottom-left",
            PageNumberPosition::BottomCenter => "@bottom-center",
            PageNumberPosition::BottomRight => "@bottom-right",
        }
    }
}
