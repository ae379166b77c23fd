use crate::condition::{parse_condition, ConditionExpr, GroupTarget};
use crate::error::ParserError;
use crate::selection::Selection;
use serde_yml::Value;

/// The named selections of a rule in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
    selections: Vec<(String, Selection)>,
}

impl Detections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selection, replacing a previous one with the same name in place.
    pub fn insert<S: Into<String>>(&mut self, name: S, selection: Selection) {
        let name = name.into();
        match self.selections.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = selection,
            None => self.selections.push((name, selection)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Selection> {
        self.selections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.selections.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// All selections targeted by an `x of ...` group, in declaration order.
    pub fn matching<'a>(
        &'a self,
        target: &'a GroupTarget,
    ) -> impl Iterator<Item = (&'a str, &'a Selection)> {
        self.iter().filter(move |(name, _)| target.matches(name))
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

impl<S, const N: usize> From<[(S, Selection); N]> for Detections
where
    S: Into<String>,
{
    fn from(values: [(S, Selection); N]) -> Self {
        let mut detections = Self::new();
        for (name, selection) in values {
            detections.insert(name, selection);
        }
        detections
    }
}

/// Split a rule's `detection` section into its selections and parsed conditions.
pub(crate) fn parse_detection_section(
    value: Value,
) -> Result<(Detections, Vec<ConditionExpr>), ParserError> {
    let Value::Mapping(mapping) = value else {
        return Err(ParserError::MissingDetectionSection());
    };

    let mut detections = Detections::new();
    let mut conditions = None;

    for (key, value) in mapping {
        let name = match key {
            Value::String(name) => name,
            other => return Err(ParserError::InvalidSelection(format!("{:?}", other))),
        };
        if name == "condition" {
            conditions = Some(parse_conditions(value)?);
        } else if name != "timeframe" {
            // timeframe is only used by correlation rules
            let selection = Selection::from_yaml(name.as_str(), value)?;
            detections.insert(name, selection);
        }
    }

    match conditions {
        Some(conditions) if !conditions.is_empty() => Ok((detections, conditions)),
        _ => Err(ParserError::MissingCondition()),
    }
}

fn parse_conditions(value: Value) -> Result<Vec<ConditionExpr>, ParserError> {
    match value {
        Value::String(s) => Ok(vec![parse_condition(s.as_str())?]),
        Value::Sequence(seq) => {
            let mut result = Vec::with_capacity(seq.len());
            for item in seq {
                match item {
                    Value::String(s) => result.push(parse_condition(s.as_str())?),
                    other => {
                        return Err(ParserError::InvalidCondition(
                            format!("{:?}", other),
                            "condition must be a string".to_string(),
                        ))
                    }
                }
            }
            Ok(result)
        }
        other => Err(ParserError::InvalidCondition(
            format!("{:?}", other),
            "condition must be a string or a list of strings".to_string(),
        )),
    }
}
