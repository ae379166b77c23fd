use crate::condition::ConditionExpr;
use crate::detection::{parse_detection_section, Detections};
use crate::error::ParserError;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogSource {
    pub category: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
    pub definition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RuleProxy {
    #[serde(default)]
    title: String,
    id: Option<String>,
    status: Option<String>,
    description: Option<String>,
    author: Option<String>,
    date: Option<String>,
    level: Option<String>,
    #[serde(default)]
    logsource: LogSource,
    #[serde(default)]
    tags: Vec<String>,
    detection: Option<serde_yml::Value>,
}

/// A Sigma detection rule with its selections and parsed conditions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RuleProxy")]
pub struct Rule {
    pub title: String,
    pub id: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub level: Option<String>,
    pub logsource: LogSource,
    pub tags: Vec<String>,
    pub detections: Detections,
    pub conditions: Vec<ConditionExpr>,
}

impl TryFrom<RuleProxy> for Rule {
    type Error = ParserError;

    fn try_from(other: RuleProxy) -> Result<Self, Self::Error> {
        let detection = other
            .detection
            .ok_or_else(ParserError::MissingDetectionSection)?;
        let (detections, conditions) = parse_detection_section(detection)?;

        Ok(Self {
            title: other.title,
            id: other.id,
            status: other.status,
            description: other.description,
            author: other.author,
            date: other.date,
            level: other.level,
            logsource: other.logsource,
            tags: other.tags,
            detections,
            conditions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basevalue::BaseValue;
    use crate::rule_from_yaml;
    use crate::selection::{FieldEntry, Selection};

    #[test]
    fn test_load_rule() {
        let rule = r#"
        title: Suspicious Process
        id: 9b5b4e0c-2c2a-4a3e-9a8f-1c2d3e4f5a6b
        status: test
        level: high
        author: Someone
        date: 2024-09-01
        tags:
            - attack.execution
        logsource:
            category: process_creation
            product: windows
        detection:
            selection:
                Image|endswith: '\cmd.exe'
            condition: selection
"#;
        let rule = rule_from_yaml(rule).unwrap();
        assert_eq!(rule.title, "Suspicious Process");
        assert_eq!(rule.level.as_deref(), Some("high"));
        assert_eq!(rule.logsource.product.as_deref(), Some("windows"));
        assert_eq!(rule.tags, vec!["attack.execution"]);
        assert_eq!(
            rule.detections.get("selection"),
            Some(&Selection::Fields(vec![FieldEntry::new(
                "Image|endswith",
                vec![BaseValue::from(r"\cmd.exe")]
            )]))
        );
        assert_eq!(
            rule.conditions,
            vec![ConditionExpr::Selection("selection".to_string())]
        );
    }

    #[test]
    fn test_missing_detection() {
        let rule = r#"
        title: No detection
        logsource:
            product: windows
"#;
        let err = rule_from_yaml(rule).unwrap_err();
        assert!(err.to_string().contains("no detection section"));
    }

    #[test]
    fn test_boolean_selection_is_rejected() {
        let rule = r#"
        title: Boolean selection
        detection:
            sel: true
            condition: sel
"#;
        let err = rule_from_yaml(rule).unwrap_err();
        assert!(err.to_string().contains("Selection 'sel'"));
    }

    #[test]
    fn test_invalid_condition() {
        let rule = r#"
        title: Broken condition
        detection:
            sel: [a]
            condition: sel and
"#;
        assert!(rule_from_yaml(rule).is_err());
    }
}
