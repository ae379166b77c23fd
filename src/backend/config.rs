use crate::wildcard::WildcardToken;
use serde::Deserialize;
use std::collections::HashMap;

/// Rule field name to target field name. Unmapped names pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(HashMap<String, String>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>, T: Into<String>>(&mut self, from: S, to: T) {
        self.0.insert(from.into(), to.into());
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        match self.0.get(name) {
            Some(mapped) => {
                tracing::trace!(field = name, mapped = mapped.as_str(), "resolved field");
                mapped.as_str()
            }
            None => name,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S, T, const N: usize> From<[(S, T); N]> for FieldMapping
where
    S: Into<String>,
    T: Into<String>,
{
    fn from(values: [(S, T); N]) -> Self {
        values.into_iter().collect()
    }
}

impl<S, T> FromIterator<(S, T)> for FieldMapping
where
    S: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
        )
    }
}

/// How literal characters are protected in the target query language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EscapePolicy {
    #[serde(alias = "escapeChar")]
    pub escape_char: char,
    /// Escaped in plain and wildcard strings
    pub reserved: String,
    /// Replaces spaces in unquoted (wildcard) values
    #[serde(alias = "whitespaceReplacement")]
    pub whitespace_replacement: String,
    /// Escaped inside regular expression bodies
    #[serde(alias = "regexReserved")]
    pub regex_reserved: String,
}

impl Default for EscapePolicy {
    fn default() -> Self {
        Self {
            escape_char: '\\',
            reserved: r#"\+-=&|!(){}[]^"~:/<>"#.to_string(),
            whitespace_replacement: "_ws_".to_string(),
            regex_reserved: "\"/".to_string(),
        }
    }
}

impl EscapePolicy {
    /// Render decoded tokens. Quoted strings keep their spaces, unquoted ones
    /// get the whitespace replacement.
    pub(crate) fn escape(&self, tokens: &[WildcardToken], quoted: bool) -> String {
        let mut result = String::new();
        for token in tokens {
            match token {
                WildcardToken::Star => result.push('*'),
                WildcardToken::QuestionMark => result.push('?'),
                WildcardToken::Pattern(chars) => {
                    for c in chars {
                        // a literal star or question mark must not turn into a wildcard
                        let literal_wildcard = !quoted && matches!(c, '*' | '?');
                        if self.reserved.contains(*c) || literal_wildcard {
                            result.push(self.escape_char);
                            result.push(*c);
                        } else if *c == ' ' && !quoted {
                            result.push_str(&self.whitespace_replacement);
                        } else {
                            result.push(*c);
                        }
                    }
                }
            }
        }
        result
    }

    /// Characters already escaped in the rule are kept as written.
    pub(crate) fn escape_regex(&self, regex: &str) -> String {
        let mut result = String::with_capacity(regex.len());
        let mut chars = regex.chars();
        while let Some(c) = chars.next() {
            if c == self.escape_char {
                result.push(c);
                result.extend(chars.next());
                continue;
            }
            if self.regex_reserved.contains(c) {
                result.push(self.escape_char);
            }
            result.push(c);
        }
        result
    }
}

/// Settings of a [`crate::QueryBackend`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(alias = "fieldMapping")]
    pub field_mapping: FieldMapping,
    /// Allows the `cased` modifier. Rendered values are the same either way,
    /// case handling of a plain match is left to the index analyzer.
    #[serde(alias = "caseSensitive")]
    pub case_sensitive: bool,
    /// Render CIDR networks as address ranges instead of the network notation
    #[serde(alias = "cidrExpand")]
    pub cidr_expand: bool,
    /// Fail on the first recoverable error instead of dropping the offending value
    pub strict: bool,
    pub escaping: EscapePolicy,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            field_mapping: FieldMapping::default(),
            case_sensitive: false,
            cidr_expand: false,
            strict: true,
            escaping: EscapePolicy::default(),
        }
    }
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(yaml)
    }

    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_field_mapping<M: Into<FieldMapping>>(mut self, mapping: M) -> Self {
        self.field_mapping = mapping.into();
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_cidr_expand(mut self, cidr_expand: bool) -> Self {
        self.cidr_expand = cidr_expand;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_escaping(mut self, escaping: EscapePolicy) -> Self {
        self.escaping = escaping;
        self
    }
}
