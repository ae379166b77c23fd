use crate::basevalue::BaseValue;
use crate::error::ParserError;
use serde_yml::Value;

/// One `key: value(s)` pair of a selection mapping.
/// The key is kept raw (`name|modifier|modifier`), the name may be empty for unbound values.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub key: String,
    pub values: Vec<BaseValue>,
}

impl FieldEntry {
    pub fn new<S: Into<String>>(key: S, values: Vec<BaseValue>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A single mapping, all entries must match
    Fields(Vec<FieldEntry>),
    /// A list of plain values searched for anywhere in the event
    Keywords(Vec<BaseValue>),
    /// A list of mappings, any of them may match
    AnyOf(Vec<Vec<FieldEntry>>),
}

impl Selection {
    pub(crate) fn from_yaml(name: &str, value: Value) -> Result<Self, ParserError> {
        let invalid = || ParserError::InvalidSelection(name.to_string());

        match value {
            Value::Mapping(mapping) => Ok(Self::Fields(parse_mapping(name, mapping)?)),
            Value::Sequence(seq) => {
                if seq.iter().all(|v| v.is_mapping()) && !seq.is_empty() {
                    let mut result = Vec::with_capacity(seq.len());
                    for item in seq {
                        let Value::Mapping(mapping) = item else {
                            return Err(invalid());
                        };
                        result.push(parse_mapping(name, mapping)?);
                    }
                    Ok(Self::AnyOf(result))
                } else {
                    let mut result = Vec::with_capacity(seq.len());
                    for item in seq {
                        if item.is_mapping() || item.is_sequence() {
                            return Err(invalid());
                        }
                        result.push(BaseValue::try_from(item)?);
                    }
                    Ok(Self::Keywords(result))
                }
            }
            Value::String(_) | Value::Number(_) => Ok(Self::Keywords(vec![BaseValue::try_from(value)?])),
            _ => Err(invalid()),
        }
    }
}

fn parse_mapping(name: &str, mapping: serde_yml::Mapping) -> Result<Vec<FieldEntry>, ParserError> {
    let mut result = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return Err(ParserError::InvalidSelection(name.to_string())),
        };
        let values = match value {
            Value::Sequence(seq) => {
                let mut values = Vec::with_capacity(seq.len());
                for item in seq {
                    if item.is_mapping() || item.is_sequence() {
                        return Err(ParserError::InvalidSelection(name.to_string()));
                    }
                    values.push(BaseValue::try_from(item)?);
                }
                values
            }
            Value::Mapping(_) | Value::Tagged(_) => {
                return Err(ParserError::InvalidSelection(name.to_string()))
            }
            scalar => vec![BaseValue::try_from(scalar)?],
        };
        result.push(FieldEntry::new(key, values));
    }
    Ok(result)
}
