use crate::backend::config::BackendConfig;
use crate::backend::fragment::Fragment;
use crate::backend::value::render_value;
use crate::basevalue::BaseValue;
use crate::condition::{ConditionExpr, Quantifier};
use crate::detection::Detections;
use crate::error::{Location, TranslationError};
use crate::field::{Field, ModifierError};
use crate::selection::{FieldEntry, Selection};
use std::str::FromStr;

/// Recoverable errors of one conversion, in the order they were found.
#[derive(Debug, Default)]
pub(crate) struct ErrorCollector {
    errors: Vec<TranslationError>,
}

impl ErrorCollector {
    pub(crate) fn record(&mut self, error: TranslationError) {
        self.errors.push(error);
    }

    pub(crate) fn into_errors(self) -> Vec<TranslationError> {
        self.errors
    }
}

/// Walks condition trees and selections of one rule.
/// Missing selections abort the walk, everything else is recorded and skipped.
pub(crate) struct Compiler<'a> {
    config: &'a BackendConfig,
    detections: &'a Detections,
    pub(crate) errors: ErrorCollector,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(config: &'a BackendConfig, detections: &'a Detections) -> Self {
        Self {
            config,
            detections,
            errors: ErrorCollector::default(),
        }
    }

    pub(crate) fn compile_condition(
        &mut self,
        expr: &ConditionExpr,
    ) -> Result<Option<Fragment>, TranslationError> {
        match expr {
            ConditionExpr::Selection(name) => {
                let detections = self.detections;
                let selection = detections
                    .get(name)
                    .ok_or_else(|| TranslationError::MissingDetection(name.clone()))?;
                Ok(self.compile_selection(name, selection))
            }
            ConditionExpr::Group { quantifier, target } => {
                let detections = self.detections;
                let mut children = vec![];
                for (name, selection) in detections.matching(target) {
                    children.extend(self.compile_selection(name, selection));
                }
                if children.is_empty() {
                    tracing::debug!(group = %expr, "group does not match any selection");
                }
                Ok(match quantifier {
                    Quantifier::Any => Fragment::or(children),
                    Quantifier::All => Fragment::and(children),
                })
            }
            ConditionExpr::Not(inner) => Ok(self.compile_condition(inner)?.map(Fragment::negate)),
            ConditionExpr::And(a, b) => {
                let a = self.compile_condition(a)?;
                let b = self.compile_condition(b)?;
                Ok(combine(a, b, Fragment::And))
            }
            ConditionExpr::Or(a, b) => {
                let a = self.compile_condition(a)?;
                let b = self.compile_condition(b)?;
                Ok(combine(a, b, Fragment::Or))
            }
        }
    }

    fn compile_selection(&mut self, name: &str, selection: &Selection) -> Option<Fragment> {
        match selection {
            Selection::Fields(entries) => self.compile_entries(name, entries),
            Selection::Keywords(values) => {
                self.compile_field(&Location::new(name), &Field::keyword(), values)
            }
            Selection::AnyOf(maps) => {
                let children = maps
                    .iter()
                    .filter_map(|entries| self.compile_entries(name, entries))
                    .collect();
                Fragment::or(children)
            }
        }
    }

    fn compile_entries(&mut self, name: &str, entries: &[FieldEntry]) -> Option<Fragment> {
        let location = Location::new(name);
        let mut children = vec![];

        for entry in entries {
            let field = match Field::from_str(entry.key.as_str()) {
                Ok(field) => field,
                Err(ModifierError(token)) => {
                    let field_name = entry.key.split('|').next().unwrap_or_default();
                    self.errors.record(TranslationError::UnsupportedModifier {
                        location: location.with_field(field_name),
                        modifier: token,
                    });
                    continue;
                }
            };
            let location = location.with_field(field.name.clone().unwrap_or_default());
            children.extend(self.compile_field(&location, &field, &entry.values));
        }

        Fragment::and(children)
    }

    fn compile_field(
        &mut self,
        location: &Location,
        field: &Field,
        values: &[BaseValue],
    ) -> Option<Fragment> {
        if let Err(err) = field.validate(location, self.config.case_sensitive) {
            self.errors.record(err);
            return None;
        }
        if values.is_empty() {
            self.errors.record(TranslationError::TypeMismatch {
                location: location.clone(),
                expected: "at least one",
                found: "[]".to_string(),
            });
            return None;
        }

        let config = self.config;
        let target = field
            .name
            .as_deref()
            .map(|name| config.field_mapping.resolve(name));

        let mut children = vec![];
        for value in values {
            match field.shape(value, location) {
                Ok(shaped) => {
                    let alternates = shaped
                        .iter()
                        .map(|v| Fragment::Leaf(render_value(target, v, config)))
                        .collect();
                    children.extend(Fragment::or(alternates));
                }
                Err(err) => self.errors.record(err),
            }
        }

        if field.modifier.match_all {
            Fragment::and(children)
        } else {
            Fragment::or(children)
        }
    }
}

fn combine(
    a: Option<Fragment>,
    b: Option<Fragment>,
    group: fn(Vec<Fragment>) -> Fragment,
) -> Option<Fragment> {
    match (a, b) {
        (Some(a), Some(b)) => Some(group(vec![a, b])),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::parse_condition;

    fn detections() -> Detections {
        Detections::from([
            (
                "sel1",
                Selection::Fields(vec![FieldEntry::new("a", vec![BaseValue::from("x")])]),
            ),
            (
                "sel2",
                Selection::Fields(vec![
                    FieldEntry::new("b|contains", vec![BaseValue::from("")]),
                    FieldEntry::new("c|lt", vec![BaseValue::from("y")]),
                ]),
            ),
            (
                "sel3",
                Selection::Keywords(vec![BaseValue::from("k1"), BaseValue::from(2)]),
            ),
        ])
    }

    #[test]
    fn test_missing_selection_is_fatal() {
        let config = BackendConfig::default();
        let detections = detections();
        let mut compiler = Compiler::new(&config, &detections);
        let err = compiler
            .compile_condition(&parse_condition("sel1 and nope").unwrap())
            .unwrap_err();
        assert_eq!(err, TranslationError::MissingDetection("nope".to_string()));
    }

    #[test]
    fn test_errors_are_collected_and_siblings_continue() {
        let config = BackendConfig::default();
        let detections = detections();
        let mut compiler = Compiler::new(&config, &detections);
        let fragment = compiler
            .compile_condition(&parse_condition("sel1 or sel2").unwrap())
            .unwrap();

        assert_eq!(fragment.unwrap().render(), "a: \"x\"");
        let errors = compiler.errors.into_errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], TranslationError::EmptyValue { .. }));
        assert!(matches!(errors[1], TranslationError::TypeMismatch { .. }));
        assert_eq!(
            errors[1].location(),
            Some(&Location::new("sel2").with_field("c"))
        );
    }

    #[test]
    fn test_group_without_match_is_a_noop() {
        let config = BackendConfig::default();
        let detections = detections();
        let mut compiler = Compiler::new(&config, &detections);
        let fragment = compiler
            .compile_condition(&parse_condition("sel3 and 1 of filter*").unwrap())
            .unwrap();
        assert_eq!(fragment.unwrap().render(), "(\"k1\") OR (\"2\")");
        assert!(compiler.errors.into_errors().is_empty());
    }

    #[test]
    fn test_unknown_modifier_is_recorded() {
        let config = BackendConfig::default();
        let detections = Detections::from([(
            "sel",
            Selection::Fields(vec![FieldEntry::new("a|nope", vec![BaseValue::from("x")])]),
        )]);
        let mut compiler = Compiler::new(&config, &detections);
        let fragment = compiler
            .compile_condition(&parse_condition("sel").unwrap())
            .unwrap();
        assert!(fragment.is_none());
        assert_eq!(
            compiler.errors.into_errors(),
            vec![TranslationError::UnsupportedModifier {
                location: Location::new("sel").with_field("a"),
                modifier: "nope".to_string(),
            }]
        );
    }
}
