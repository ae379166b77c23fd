#![forbid(unsafe_code)]
//! `sigma-query` compiles Sigma rules into OpenSearch `query_string` queries.

pub mod backend;
mod basevalue;
mod condition;
mod detection;
mod error;
mod field;
pub mod findings;
mod rule;
mod selection;
mod wildcard;

pub use backend::{BackendConfig, EscapePolicy, FieldMapping, QueryBackend};
pub use basevalue::BaseValue;
pub use condition::{parse_condition, ConditionExpr, GroupTarget, Quantifier};
pub use detection::Detections;
pub use error::{
    CompositeErrors, ConversionError, Location, ParserError, TranslationError,
};
pub use field::{
    Field, FieldValue, MatchModifier, Modifier, ModifierError, Utf16Modifier, ValueTransformer,
};
pub use rule::{LogSource, Rule};
pub use selection::{FieldEntry, Selection};

/// Parse a rule from a YAML string
pub fn rule_from_yaml(yaml: &str) -> Result<Rule, serde_yml::Error> {
    serde_yml::from_str(yaml)
}

/// Convert a rule with the given backend settings, one query per condition
pub fn convert_rule(rule: &Rule, config: &BackendConfig) -> Result<Vec<String>, ConversionError> {
    QueryBackend::new(config.clone()).convert_rule(rule)
}
