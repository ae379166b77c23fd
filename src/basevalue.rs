use crate::error::ParserError;
use std::fmt;

/// A scalar value as written in a rule's detection section.
#[derive(Debug, Clone)]
pub enum BaseValue {
    String(String),
    Int(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl From<i32> for BaseValue {
    fn from(i: i32) -> Self {
        Self::from(i as i64)
    }
}

impl From<i64> for BaseValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for BaseValue {
    fn from(u: u32) -> Self {
        Self::from(u as u64)
    }
}

impl From<u64> for BaseValue {
    fn from(u: u64) -> Self {
        Self::Unsigned(u)
    }
}

impl From<f64> for BaseValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for BaseValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for BaseValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for BaseValue {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl<T: Into<BaseValue>> From<Option<T>> for BaseValue {
    fn from(option: Option<T>) -> Self {
        match option {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl PartialEq for BaseValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.eq(b),
            (Self::Int(a), Self::Int(b)) => a.eq(b),
            (Self::Unsigned(a), Self::Unsigned(b)) => a.eq(b),
            (Self::Float(a), Self::Float(b)) => a.eq(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.eq(b),
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BaseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Unsigned(u) => write!(f, "{}", u),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
        }
    }
}

impl BaseValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Unsigned(_) | Self::Float(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl TryFrom<serde_yml::Value> for BaseValue {
    type Error = ParserError;

    fn try_from(value: serde_yml::Value) -> Result<Self, Self::Error> {
        match value {
            serde_yml::Value::Bool(b) => Ok(Self::Boolean(b)),
            serde_yml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::Unsigned(u))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(ParserError::InvalidYAML(format!("{:?}", n)))
                }
            }
            serde_yml::Value::String(s) => Ok(Self::String(s)),
            serde_yml::Value::Null => Ok(Self::Null),
            _ => Err(ParserError::InvalidYAML(format!("{:?}", value))),
        }
    }
}
