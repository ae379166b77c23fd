use std::fmt;

/// How a leaf is written when it ends up under a `NOT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negation {
    /// `NOT <text> AND _exists_: <field>`, so that events without the field do not match
    Guarded(String),
    /// `NOT <text>`, used for keywords
    Bare,
    /// A leaf with a dedicated inverse, e.g. `_exists_: f` and `NOT _exists_: f`
    Inverse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub text: String,
    pub negation: Negation,
}

impl Leaf {
    pub fn new<S: Into<String>>(text: S, negation: Negation) -> Self {
        Self {
            text: text.into(),
            negation,
        }
    }

    fn write(&self, negated: bool, out: &mut String) {
        if !negated {
            out.push_str(&self.text);
            return;
        }
        match &self.negation {
            Negation::Guarded(field) => {
                out.push_str("NOT ");
                out.push_str(&self.text);
                out.push_str(" AND _exists_: ");
                out.push_str(field);
            }
            Negation::Bare => {
                out.push_str("NOT ");
                out.push_str(&self.text);
            }
            Negation::Inverse(inverse) => out.push_str(inverse),
        }
    }
}

/// A compiled query expression.
///
/// Negation is pushed down to the leaves while rendering: an `And` under a
/// `NOT` is written as an `OR` of negated children and vice versa. The
/// constructors collapse empty and single-child groups and double negations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Leaf(Leaf),
    And(Vec<Fragment>),
    Or(Vec<Fragment>),
    Not(Box<Fragment>),
}

impl Fragment {
    pub fn and(mut children: Vec<Fragment>) -> Option<Fragment> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(Self::And(children)),
        }
    }

    pub fn or(mut children: Vec<Fragment>) -> Option<Fragment> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(Self::Or(children)),
        }
    }

    pub fn negate(self) -> Fragment {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(false, &mut out);
        out
    }

    fn write(&self, negated: bool, out: &mut String) {
        match self {
            Self::Leaf(leaf) => leaf.write(negated, out),
            Self::And(children) | Self::Or(children) => {
                let is_and = matches!(self, Self::And(_));
                // De Morgan
                let operator = if is_and != negated { " AND " } else { " OR " };
                if let [child] = children.as_slice() {
                    child.write(negated, out);
                    return;
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(operator);
                    }
                    out.push('(');
                    child.write(negated, out);
                    out.push(')');
                }
            }
            Self::Not(inner) if negated => inner.write(false, out),
            Self::Not(inner) => {
                let parens = if matches!(**inner, Self::Leaf(_)) { 1 } else { 2 };
                out.push_str(&"(".repeat(parens));
                inner.write(true, out);
                out.push_str(&")".repeat(parens));
            }
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
