mod modifier;
mod transformation;
mod value;

pub use modifier::*;
pub use transformation::{encode_base64, encode_base64_offset, windash_variations};
pub use value::*;

use crate::basevalue::BaseValue;
use crate::error::{Location, TranslationError};
use crate::field::ValueTransformer::{Base64, Base64offset, Windash};
use crate::wildcard::{prepend_star, push_star, tokenize};
use cidr::IpCidr;
use std::str::FromStr;

// https://sigmahq.io/docs/basics/modifiers.html
/// A parsed field key such as `CommandLine|contains|all`.
/// The name is `None` for unbound (keyword) values, e.g. the key `|re`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Option<String>,
    pub modifier: Modifier,
}

impl FromStr for Field {
    type Err = ModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.split('|').next().unwrap_or("");
        Ok(Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            modifier: Modifier::from_str(s)?,
        })
    }
}

impl Field {
    /// The field used for plain keyword lists.
    pub fn keyword() -> Self {
        Self {
            name: None,
            modifier: Modifier::default(),
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.name.is_none()
    }

    /// Checks the modifier chain as a whole, before any value is looked at.
    pub(crate) fn validate(
        &self,
        location: &Location,
        case_sensitive: bool,
    ) -> Result<(), TranslationError> {
        let unsupported = |modifier: &str| TranslationError::UnsupportedModifier {
            location: location.clone(),
            modifier: modifier.to_string(),
        };

        if self.modifier.fieldref {
            return Err(unsupported("fieldref"));
        }
        if self.modifier.cased && !case_sensitive {
            return Err(unsupported("cased"));
        }
        if self.is_keyword() {
            if self.modifier.exists {
                return Err(unsupported("exists"));
            }
            match self.modifier.match_modifier {
                Some(m @ MatchModifier::Cidr) => return Err(unsupported(&m.to_string())),
                Some(m) if m.is_comparison() => return Err(unsupported(&m.to_string())),
                _ => {}
            }
        }
        if self.modifier.exists {
            if let Some(m) = self.modifier.match_modifier {
                return Err(unsupported(&m.to_string()));
            }
            if let Some(t) = self.modifier.value_transformer {
                return Err(unsupported(t.name()));
            }
        }
        Ok(())
    }

    /// Apply the modifier chain to one rule value.
    ///
    /// Value transformers may expand a single value into several alternates,
    /// which is why a list is returned. The alternates are meant to be OR'ed.
    pub(crate) fn shape(
        &self,
        value: &BaseValue,
        location: &Location,
    ) -> Result<Vec<FieldValue>, TranslationError> {
        let mismatch = |expected: &'static str| TranslationError::TypeMismatch {
            location: location.clone(),
            expected,
            found: value.to_string(),
        };

        if self.modifier.exists {
            return match value {
                BaseValue::Boolean(b) => Ok(vec![FieldValue::Exists(*b)]),
                _ => Err(mismatch("boolean")),
            };
        }

        if let Some(m) = self.modifier.match_modifier {
            if m.is_wildcard_shape() && value.as_str() == Some("") {
                return Err(TranslationError::EmptyValue {
                    location: location.clone(),
                    modifier: m.to_string(),
                });
            }
        }

        let alternates: Vec<BaseValue> = match &self.modifier.value_transformer {
            None => vec![value.clone()],
            Some(transformer) => {
                let s = value.as_str().ok_or_else(|| mismatch("string"))?;
                let encoded = match transformer {
                    Base64(utf16) => vec![encode_base64(s, utf16)],
                    Base64offset(utf16) => encode_base64_offset(s, utf16),
                    Windash => windash_variations(s),
                };
                encoded.into_iter().map(BaseValue::from).collect()
            }
        };

        let mut result = Vec::with_capacity(alternates.len());
        for v in alternates {
            result.push(self.shape_single(v, location, &mismatch)?);
        }
        Ok(result)
    }

    fn shape_single(
        &self,
        value: BaseValue,
        location: &Location,
        mismatch: &dyn Fn(&'static str) -> TranslationError,
    ) -> Result<FieldValue, TranslationError> {
        match self.modifier.match_modifier {
            Some(m @ (MatchModifier::Contains | MatchModifier::StartsWith | MatchModifier::EndsWith)) => {
                let BaseValue::String(s) = value else {
                    return Err(mismatch("string"));
                };
                let mut tokens = tokenize(&s);
                if matches!(m, MatchModifier::Contains | MatchModifier::EndsWith) {
                    prepend_star(&mut tokens);
                }
                if matches!(m, MatchModifier::Contains | MatchModifier::StartsWith) {
                    push_star(&mut tokens);
                }
                Ok(FieldValue::String(tokens))
            }
            Some(MatchModifier::Re) => match value {
                BaseValue::String(s) => Ok(FieldValue::Regex(s)),
                _ => Err(mismatch("string")),
            },
            Some(MatchModifier::Cidr) => {
                let BaseValue::String(s) = value else {
                    return Err(mismatch("string"));
                };
                match IpCidr::from_str(s.as_str()) {
                    Ok(cidr) => Ok(FieldValue::Cidr(cidr)),
                    Err(err) => Err(TranslationError::MalformedCidr {
                        location: location.clone(),
                        value: s,
                        reason: err.to_string(),
                    }),
                }
            }
            Some(m) => {
                // comparison operators
                if value.is_numeric() {
                    Ok(FieldValue::Compare(m, value))
                } else {
                    Err(mismatch("numeric"))
                }
            }
            None => match value {
                BaseValue::String(s) => Ok(FieldValue::String(tokenize(&s))),
                BaseValue::Null if self.is_keyword() => Err(mismatch("string or numeric")),
                BaseValue::Null => Ok(FieldValue::Null),
                BaseValue::Boolean(_) if self.is_keyword() => Err(mismatch("string or numeric")),
                other => Ok(FieldValue::Literal(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wildcard::WildcardToken;

    fn location() -> Location {
        Location::new("sel").with_field("test")
    }

    fn string(s: &str) -> WildcardToken {
        WildcardToken::Pattern(s.chars().collect())
    }

    #[test]
    fn test_parse_name_only() {
        let field = Field::from_str("a").unwrap();
        assert_eq!(field.name.as_deref(), Some("a"));
        assert!(field.modifier.match_modifier.is_none());
        assert!(field.modifier.value_transformer.is_none());
        assert!(!field.modifier.match_all);
    }

    #[test]
    fn test_parse_unbound() {
        let field = Field::from_str("|re").unwrap();
        assert!(field.is_keyword());
        assert_eq!(field.modifier.match_modifier, Some(MatchModifier::Re));
    }

    #[test]
    fn test_shape_plain_values() {
        let field = Field::from_str("test").unwrap();
        assert_eq!(
            field.shape(&BaseValue::from("a*b"), &location()).unwrap(),
            vec![FieldValue::String(vec![
                string("a"),
                WildcardToken::Star,
                string("b")
            ])]
        );
        assert_eq!(
            field.shape(&BaseValue::from(5), &location()).unwrap(),
            vec![FieldValue::Literal(BaseValue::Int(5))]
        );
        assert_eq!(
            field.shape(&BaseValue::Null, &location()).unwrap(),
            vec![FieldValue::Null]
        );
    }

    #[test]
    fn test_shape_contains_keeps_trailing_backslash() {
        let field = Field::from_str("test|contains").unwrap();
        assert_eq!(
            field.shape(&BaseValue::from(r"\System32\"), &location()).unwrap(),
            vec![FieldValue::String(vec![
                WildcardToken::Star,
                string(r"\System32\"),
                WildcardToken::Star
            ])]
        );
    }

    #[test]
    fn test_shape_startswith_endswith() {
        let field = Field::from_str("test|startswith").unwrap();
        let shaped = field.shape(&BaseValue::from("va*lue"), &location()).unwrap();
        assert!(shaped[0].has_wildcard());
        assert_eq!(
            shaped,
            vec![FieldValue::String(vec![
                string("va"),
                WildcardToken::Star,
                string("lue"),
                WildcardToken::Star
            ])]
        );

        let field = Field::from_str("test|endswith").unwrap();
        assert_eq!(
            field.shape(&BaseValue::from("*.exe"), &location()).unwrap(),
            vec![FieldValue::String(vec![WildcardToken::Star, string(".exe")])]
        );
    }

    #[test]
    fn test_shape_empty_string_rejected() {
        for key in ["test|contains", "test|startswith", "test|endswith"] {
            let field = Field::from_str(key).unwrap();
            let err = field.shape(&BaseValue::from(""), &location()).unwrap_err();
            assert!(matches!(err, TranslationError::EmptyValue { .. }), "{}", key);
        }
        // Plain equality with an empty string is fine
        let field = Field::from_str("test").unwrap();
        assert!(field.shape(&BaseValue::from(""), &location()).is_ok());
    }

    #[test]
    fn test_shape_windash_alternates() {
        let field = Field::from_str("test|windash|contains").unwrap();
        let shaped = field.shape(&BaseValue::from("-foo"), &location()).unwrap();
        assert_eq!(shaped.len(), 2);
        assert_eq!(
            shaped[1],
            FieldValue::String(vec![WildcardToken::Star, string("/foo"), WildcardToken::Star])
        );
    }

    #[test]
    fn test_shape_base64offset_alternates() {
        let field = Field::from_str("test|base64offset|contains").unwrap();
        let shaped = field.shape(&BaseValue::from("/bin/bash"), &location()).unwrap();
        assert_eq!(shaped.len(), 3);
        assert_eq!(
            shaped[0],
            FieldValue::String(vec![
                WildcardToken::Star,
                string("L2Jpbi9iYXNo"),
                WildcardToken::Star
            ])
        );
    }

    #[test]
    fn test_shape_transformer_needs_string() {
        let field = Field::from_str("test|windash").unwrap();
        let err = field.shape(&BaseValue::from(1), &location()).unwrap_err();
        assert!(matches!(err, TranslationError::TypeMismatch { expected: "string", .. }));
    }

    #[test]
    fn test_shape_comparison() {
        let field = Field::from_str("test|gte").unwrap();
        assert_eq!(
            field.shape(&BaseValue::from(10), &location()).unwrap(),
            vec![FieldValue::Compare(MatchModifier::Gte, BaseValue::Int(10))]
        );
        let err = field.shape(&BaseValue::from("test"), &location()).unwrap_err();
        assert_eq!(
            err,
            TranslationError::TypeMismatch {
                location: location(),
                expected: "numeric",
                found: "test".to_string(),
            }
        );
    }

    #[test]
    fn test_shape_cidr() {
        let field = Field::from_str("test|cidr").unwrap();
        let shaped = field.shape(&BaseValue::from("10.0.0.0/16"), &location()).unwrap();
        assert!(matches!(shaped[0], FieldValue::Cidr(_)));

        let err = field.shape(&BaseValue::from("192.168.0/16"), &location()).unwrap_err();
        assert!(matches!(err, TranslationError::MalformedCidr { value, .. } if value == "192.168.0/16"));
    }

    #[test]
    fn test_shape_exists() {
        let field = Field::from_str("test|exists").unwrap();
        assert_eq!(
            field.shape(&BaseValue::from(false), &location()).unwrap(),
            vec![FieldValue::Exists(false)]
        );
        assert!(field.shape(&BaseValue::from("yes"), &location()).is_err());
    }

    #[test]
    fn test_shape_keyword_rejects_boolean_and_null() {
        let field = Field::keyword();
        assert!(field.shape(&BaseValue::from(true), &location()).is_err());
        assert!(field.shape(&BaseValue::Null, &location()).is_err());
        assert!(field.shape(&BaseValue::from(123), &location()).is_ok());
    }

    #[test]
    fn test_validate() {
        let location = location();
        let field = Field::from_str("test|fieldref").unwrap();
        assert!(matches!(
            field.validate(&location, false),
            Err(TranslationError::UnsupportedModifier { modifier, .. }) if modifier == "fieldref"
        ));

        let field = Field::from_str("test|cased").unwrap();
        assert!(field.validate(&location, false).is_err());
        assert!(field.validate(&location, true).is_ok());

        let field = Field::from_str("|cidr").unwrap();
        assert!(field.validate(&location, false).is_err());
        let field = Field::from_str("|lt").unwrap();
        assert!(field.validate(&location, false).is_err());
        let field = Field::from_str("|re").unwrap();
        assert!(field.validate(&location, false).is_ok());
    }

    #[test]
    fn test_validate_exists_stands_alone() {
        let location = location();
        let field = Field::from_str("test|exists").unwrap();
        assert!(field.validate(&location, false).is_ok());

        let field = Field::from_str("test|exists|contains").unwrap();
        assert!(matches!(
            field.validate(&location, false),
            Err(TranslationError::UnsupportedModifier { modifier, .. }) if modifier == "contains"
        ));

        let field = Field::from_str("test|windash|exists").unwrap();
        assert!(matches!(
            field.validate(&location, false),
            Err(TranslationError::UnsupportedModifier { modifier, .. }) if modifier == "windash"
        ));
    }
}
