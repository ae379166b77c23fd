use crate::basevalue::BaseValue;
use crate::field::MatchModifier;
use crate::wildcard::{contains_wildcard, WildcardToken};
use cidr::IpCidr;

/// A rule value after its modifiers were applied, ready to be rendered by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A decoded Sigma string, wildcards are kept as tokens
    String(Vec<WildcardToken>),
    /// Numbers and booleans
    Literal(BaseValue),
    Null,
    Regex(String),
    Cidr(IpCidr),
    Compare(MatchModifier, BaseValue),
    Exists(bool),
}

impl FieldValue {
    pub fn has_wildcard(&self) -> bool {
        match self {
            Self::String(tokens) => contains_wildcard(tokens),
            _ => false,
        }
    }
}
