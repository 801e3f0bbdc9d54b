// Directive scanning
//
// Directives are `[P[<expr>]]` and `[Q[<expr>]]`. The expression runs up to
// the first `]]` on the same line; there is no escaping and no nesting.

use once_cell::sync::Lazy;
use regex::Regex;

static PARAMETER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[P\[(.+?)\]\]").expect("parameter directive pattern"));
static QUERY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Q\[(.+?)\]\]").expect("query directive pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Parameter,
    Query,
}

impl DirectiveKind {
    /// The letter between the opening brackets
    pub fn marker(self) -> char {
        match self {
            DirectiveKind::Parameter => 'P',
            DirectiveKind::Query => 'Q',
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            DirectiveKind::Parameter => &PARAMETER_PATTERN,
            DirectiveKind::Query => &QUERY_PATTERN,
        }
    }
}

/// One directive occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub expression: String,
}

impl Directive {
    pub fn new(kind: DirectiveKind, expression: impl Into<String>) -> Self {
        Self {
            kind,
            expression: expression.into(),
        }
    }

    /// The literal text of this directive as it appears in a template
    pub fn token(&self) -> String {
        format!("[{}[{}]]", self.kind.marker(), self.expression)
    }

    /// Replace every occurrence of this directive in `text`
    pub fn substitute(&self, text: &str, replacement: &str) -> String {
        text.replace(&self.token(), replacement)
    }
}

/// Inner expressions of every `kind` directive in `text`, left to right.
/// Repeated directives appear once per occurrence.
pub fn extract(text: &str, kind: DirectiveKind) -> Vec<String> {
    kind.pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Same as [`extract`], paired with the directive kind
pub fn scan(text: &str, kind: DirectiveKind) -> Vec<Directive> {
    extract(text, kind)
        .into_iter()
        .map(|expression| Directive::new(kind, expression))
        .collect()
}
