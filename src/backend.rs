mod compiler;
mod config;
mod fragment;
mod value;

pub use config::{BackendConfig, EscapePolicy, FieldMapping};
pub use fragment::{Fragment, Leaf, Negation};

use crate::backend::compiler::Compiler;
use crate::condition::ConditionExpr;
use crate::detection::Detections;
use crate::error::{CompositeErrors, ConversionError};
use crate::rule::Rule;

/// Compiles Sigma rules into OpenSearch `query_string` queries.
///
/// The backend only reads its configuration, a single instance can be shared
/// between threads and used for any number of rules.
#[derive(Debug, Clone, Default)]
pub struct QueryBackend {
    config: BackendConfig,
}

impl QueryBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Convert a rule into one query per condition, in declaration order.
    pub fn convert_rule(&self, rule: &Rule) -> Result<Vec<String>, ConversionError> {
        tracing::debug!(title = rule.title.as_str(), "converting rule");
        self.convert(&rule.detections, &rule.conditions)
    }

    /// Convert conditions over the given detections.
    ///
    /// A reference to an unknown selection aborts immediately. Any other error
    /// is collected over all conditions and returned as a single
    /// [`CompositeErrors`], unless the backend is not strict. In that case the
    /// offending values are logged and left out of the query.
    pub fn convert(
        &self,
        detections: &Detections,
        conditions: &[ConditionExpr],
    ) -> Result<Vec<String>, ConversionError> {
        if detections.is_empty() {
            return Err(ConversionError::NoDetections());
        }

        let mut compiler = Compiler::new(&self.config, detections);
        let mut fragments = Vec::with_capacity(conditions.len());
        for condition in conditions {
            tracing::debug!(%condition, "converting condition");
            let fragment = compiler
                .compile_condition(condition)
                .map_err(ConversionError::MissingDetection)?;
            fragments.push((condition, fragment));
        }

        let errors = compiler.errors.into_errors();
        if !errors.is_empty() {
            if self.config.strict {
                return Err(CompositeErrors::from(errors).into());
            }
            for error in &errors {
                tracing::warn!(%error, "dropped detection item");
            }
        }

        let mut queries = Vec::with_capacity(fragments.len());
        for (condition, fragment) in fragments {
            match fragment {
                Some(fragment) => queries.push(fragment.render()),
                None => return Err(ConversionError::EmptyCondition(condition.to_string())),
            }
        }
        Ok(queries)
    }
}
