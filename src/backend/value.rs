use crate::backend::config::BackendConfig;
use crate::backend::fragment::{Leaf, Negation};
use crate::field::FieldValue;

/// Render one shaped value as a query leaf.
/// `field` is the already mapped target field, `None` for keyword values.
pub(crate) fn render_value(field: Option<&str>, value: &FieldValue, config: &BackendConfig) -> Leaf {
    let escaping = &config.escaping;

    let term = match value {
        FieldValue::String(tokens) => {
            if value.has_wildcard() {
                escaping.escape(tokens, false)
            } else {
                format!("\"{}\"", escaping.escape(tokens, true))
            }
        }
        FieldValue::Literal(v) if field.is_none() => format!("\"{}\"", v),
        FieldValue::Literal(v) => v.to_string(),
        FieldValue::Null => "(NOT [* TO *])".to_string(),
        FieldValue::Regex(re) => format!("/{}/", escaping.escape_regex(re)),
        FieldValue::Cidr(cidr) if config.cidr_expand => {
            format!("[{} TO {}]", cidr.first_address(), cidr.last_address())
        }
        FieldValue::Cidr(cidr) => {
            format!("\"{}/{}\"", cidr.first_address(), cidr.network_length())
        }
        FieldValue::Compare(op, v) => {
            let name = field.unwrap_or_default();
            return Leaf::new(
                format!("\"{}\" \"{}\" {}", name, op, v),
                Negation::Guarded(name.to_string()),
            );
        }
        FieldValue::Exists(exists) => {
            let name = field.unwrap_or_default();
            let present = format!("_exists_: {}", name);
            let absent = format!("NOT _exists_: {}", name);
            return if *exists {
                Leaf::new(present, Negation::Inverse(absent))
            } else {
                Leaf::new(absent, Negation::Inverse(present))
            };
        }
    };

    match field {
        Some(name) => Leaf::new(
            format!("{}: {}", name, term),
            Negation::Guarded(name.to_string()),
        ),
        None => Leaf::new(term, Negation::Bare),
    }
}
