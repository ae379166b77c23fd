use std::str::FromStr;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MatchModifier {
    Contains,
    StartsWith,
    EndsWith,
    Re,
    Cidr,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl MatchModifier {
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }

    pub fn is_wildcard_shape(&self) -> bool {
        matches!(self, Self::Contains | Self::StartsWith | Self::EndsWith)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Utf16Modifier {
    Utf16le,
    Utf16be,
    Utf16,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransformer {
    Base64(Option<Utf16Modifier>),
    Base64offset(Option<Utf16Modifier>),
    Windash,
}

impl ValueTransformer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Base64(_) => "base64",
            Self::Base64offset(_) => "base64offset",
            Self::Windash => "windash",
        }
    }
}

/// Why a modifier chain could not be parsed. Carries the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierError(pub String);

/// The modifier chain attached to a field key, e.g. `CommandLine|windash|contains|all`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifier {
    pub match_all: bool,
    pub match_modifier: Option<MatchModifier>,
    pub value_transformer: Option<ValueTransformer>,
    pub cased: bool,
    pub exists: bool,
    pub fieldref: bool,
}

impl FromStr for Modifier {
    type Err = ModifierError;

    /// Parses everything after the first `|` of a field key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result = Self::default();
        let mut utf16: Option<Utf16Modifier> = None;

        for token in s.split('|').skip(1) {
            let lowered = token.to_lowercase();
            let token_name = lowered.as_str();

            if let Ok(m) = MatchModifier::from_str(token_name) {
                if result.match_modifier.is_some() {
                    return Err(ModifierError(token.to_string()));
                }
                result.match_modifier = Some(m);
                continue;
            }
            if let Ok(u) = Utf16Modifier::from_str(token_name) {
                if utf16.is_some() {
                    return Err(ModifierError(token.to_string()));
                }
                utf16 = Some(u);
                continue;
            }

            let transformer = match token_name {
                "all" => {
                    result.match_all = true;
                    continue;
                }
                "cased" => {
                    result.cased = true;
                    continue;
                }
                "exists" => {
                    result.exists = true;
                    continue;
                }
                "fieldref" => {
                    result.fieldref = true;
                    continue;
                }
                "base64" => ValueTransformer::Base64(None),
                "base64offset" => ValueTransformer::Base64offset(None),
                "windash" => ValueTransformer::Windash,
                _ => return Err(ModifierError(token.to_string())),
            };
            if result.value_transformer.is_some() {
                return Err(ModifierError(token.to_string()));
            }
            result.value_transformer = Some(transformer);
        }

        // utf16 sub-modifiers only make sense in front of a base64 encoding
        if let Some(u) = utf16 {
            result.value_transformer = match result.value_transformer {
                Some(ValueTransformer::Base64(_)) => Some(ValueTransformer::Base64(Some(u))),
                Some(ValueTransformer::Base64offset(_)) => {
                    Some(ValueTransformer::Base64offset(Some(u)))
                }
                _ => return Err(ModifierError(u.to_string())),
            };
        }

        Ok(result)
    }
}
