// Handlebars templating pass over resolved reports

use super::TemplateEngine;
use crate::error::{RenderError, RenderResult};
use crate::template::Datasets;
use handlebars::Handlebars;

/// Renders a resolved template with the datasets as its context,
/// so `{{#each data_0}}...{{/each}}` walks a registered dataset.
pub struct HandlebarsEngine {
    handlebars: Handlebars<'static>,
}

impl HandlebarsEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_helper("uppercase", Box::new(uppercase_helper));

        Self { handlebars }
    }

    /// Fail on references to missing fields instead of rendering them empty
    pub fn strict(mut self) -> Self {
        self.handlebars.set_strict_mode(true);
        self
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render(&self, template: &str, datasets: &Datasets) -> RenderResult<String> {
        self.handlebars
            .render_template(template, datasets)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

fn uppercase_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let text = match h.param(0).map(|p| p.value()) {
        Some(serde_json::Value::String(s)) => s.to_uppercase(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    out.write(&handlebars::html_escape(&text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Row;
    use crate::value::Scalar;

    fn datasets() -> Datasets {
        let row = |name: &str, total: i64| -> Row {
            Row::from([
                ("name".to_string(), Scalar::from(name)),
                ("total".to_string(), Scalar::from(total)),
            ])
        };
        Datasets::from([("data_0".to_string(), vec![row("Ann", 5), row("Bob", 7)])])
    }

    #[test]
    fn test_each_over_dataset() {
        let engine = HandlebarsEngine::new();
        let out = engine
            .render(
                "<ul>{{#each data_0}}<li>{{name}}: {{total}}</li>{{/each}}</ul>",
                &datasets(),
            )
            .unwrap();
        assert_eq!(out, "<ul><li>Ann: 5</li><li>Bob: 7</li></ul>");
    }

    #[test]
    fn test_values_are_html_escaped() {
        let data = Datasets::from([(
            "data_0".to_string(),
            vec![Row::from([("v".to_string(), Scalar::from("<b>"))])],
        )]);
        let out = HandlebarsEngine::new()
            .render("{{#each data_0}}{{v}}{{/each}}", &data)
            .unwrap();
        assert_eq!(out, "&lt;b&gt;");
    }

    #[test]
    fn test_uppercase_helper_escapes_its_output() {
        let data = Datasets::from([(
            "data_0".to_string(),
            vec![Row::from([("v".to_string(), Scalar::from("<b>"))])],
        )]);
        let out = HandlebarsEngine::new()
            .render("{{#each data_0}}{{uppercase v}}{{/each}}", &data)
            .unwrap();
        assert_eq!(out, "&lt;B&gt;");
    }

    #[test]
    fn test_uppercase_helper() {
        let out = HandlebarsEngine::new()
            .render("{{#each data_0}}{{uppercase name}} {{/each}}", &datasets())
            .unwrap();
        assert_eq!(out, "ANN BOB ");
    }

    #[test]
    fn test_template_errors() {
        let err = HandlebarsEngine::new()
            .render("{{#each data_0}}", &datasets())
            .unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));

        let strict = HandlebarsEngine::new().strict().render("{{missing}}", &datasets());
        assert!(matches!(strict, Err(RenderError::Template(_))));
    }
}
