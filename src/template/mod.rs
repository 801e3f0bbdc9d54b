// Template module - resolves `[P[...]]` and `[Q[...]]` directives
//
// binder     parameter pass
// directive  scanning and substitution
// shaper     query execution and row coercion
// resolver   two-pass orchestration and the dataset registry

pub mod binder;
pub mod directive;
pub mod resolver;
pub mod shaper;

pub use binder::{bind_parameters, ParameterMap};
pub use directive::{extract, Directive, DirectiveKind};
pub use resolver::{resolve, DatasetRegistry, Datasets, Resolution};
pub use shaper::{Row, ShapedSequence, ROW_SEPARATOR};
