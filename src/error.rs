use std::fmt;
use thiserror::Error;

/// Errors raised while loading a rule document into the detection model.
#[derive(Error, Debug, PartialEq)]
pub enum ParserError {
    #[error("The rule has no detection section")]
    MissingDetectionSection(),

    #[error("The detection section has no condition")]
    MissingCondition(),

    #[error("Invalid YAML: {0}")]
    InvalidYAML(String),

    #[error("Selection '{0}' must be a mapping, a list of values or a list of mappings")]
    InvalidSelection(String),

    #[error("Invalid condition '{0}': {1}")]
    InvalidCondition(String, String),

    #[error("Unsupported quantifier '{0}', only '1', 'any' and 'all' are allowed")]
    UnsupportedQuantifier(String),
}

/// Where in the rule a translation error was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub selection: String,
    pub field: Option<String>,
}

impl Location {
    pub(crate) fn new<S: Into<String>>(selection: S) -> Self {
        Self {
            selection: selection.into(),
            field: None,
        }
    }

    pub(crate) fn with_field<S: Into<String>>(&self, field: S) -> Self {
        Self {
            selection: self.selection.clone(),
            field: Some(field.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) if !field.is_empty() => {
                write!(f, "selection '{}', field '{}'", self.selection, field)
            }
            _ => write!(f, "selection '{}'", self.selection),
        }
    }
}

/// A single defect found while translating one detection item.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    #[error("{location}: unsupported modifier '{modifier}'")]
    UnsupportedModifier { location: Location, modifier: String },

    #[error("{location}: expected {expected} value, got '{found}'")]
    TypeMismatch {
        location: Location,
        expected: &'static str,
        found: String,
    },

    #[error("{location}: empty value is not allowed with the '{modifier}' modifier")]
    EmptyValue { location: Location, modifier: String },

    #[error("{location}: malformed CIDR '{value}': {reason}")]
    MalformedCidr {
        location: Location,
        value: String,
        reason: String,
    },

    #[error("Sigma rule must have a detection definitions for '{0}'")]
    MissingDetection(String),
}

impl TranslationError {
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::UnsupportedModifier { location, .. }
            | Self::TypeMismatch { location, .. }
            | Self::EmptyValue { location, .. }
            | Self::MalformedCidr { location, .. } => Some(location),
            Self::MissingDetection(_) => None,
        }
    }
}

/// Every recoverable error recorded while converting a rule, in the order
/// they were found.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct CompositeErrors {
    errors: Vec<TranslationError>,
}

impl CompositeErrors {
    pub fn errors(&self) -> &[TranslationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<Vec<TranslationError>> for CompositeErrors {
    fn from(errors: Vec<TranslationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for CompositeErrors {
    type Item = TranslationError;
    type IntoIter = std::vec::IntoIter<TranslationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for CompositeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) while converting rule", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

/// The error returned by [`crate::QueryBackend::convert_rule`].
#[derive(Error, Debug, PartialEq)]
pub enum ConversionError {
    #[error("Sigma rule must have a detection definitions")]
    NoDetections(),

    #[error(transparent)]
    MissingDetection(TranslationError),

    #[error("Condition '{0}' did not produce a query")]
    EmptyCondition(String),

    #[error(transparent)]
    Composite(#[from] CompositeErrors),
}
