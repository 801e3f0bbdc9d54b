// Parameter binding: the first resolution pass

use super::directive::{extract, scan, DirectiveKind};
use crate::error::{RenderError, RenderResult};
use crate::value::Scalar;
use std::collections::HashMap;
use tracing::debug;

/// Caller-supplied parameter values, keyed by name
pub type ParameterMap = HashMap<String, Scalar>;

/// Replace every `[P[name]]` in `template` with the formatted value of `name`.
///
/// Names are checked in the order they appear; the first one missing from
/// `params` fails the whole pass. Values are not re-scanned: a value holding
/// a parameter directive fails the pass instead of being bound again.
pub fn bind_parameters(template: &str, params: &ParameterMap) -> RenderResult<String> {
    let mut bound = template.to_string();

    for directive in scan(template, DirectiveKind::Parameter) {
        let value = params
            .get(&directive.expression)
            .ok_or_else(|| RenderError::MissingParameter(directive.expression.clone()))?;
        let text = value.to_string();

        if let Some(nested) = extract(&text, DirectiveKind::Parameter).into_iter().next() {
            return Err(RenderError::NestedParameter {
                parameter: directive.expression,
                directive: nested,
            });
        }

        debug!(parameter = %directive.expression, "binding parameter");
        bound = directive.substitute(&bound, &text);
    }

    Ok(bound)
}
