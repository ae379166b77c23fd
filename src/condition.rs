use crate::error::ParserError;
use crate::wildcard::starmatch;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
}

/// The selections an `x of ...` group refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupTarget {
    /// Every selection not starting with an underscore
    Them,
    /// A selection name pattern, `*` is the only wildcard
    Pattern(String),
}

impl GroupTarget {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Them => !name.starts_with('_'),
            Self::Pattern(p) => starmatch(p, name),
        }
    }
}

/// A parsed condition. `And` and `Or` are binary and left-associative,
/// `a or b or c` is `Or(Or(a, b), c)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr {
    Selection(String),
    Group {
        quantifier: Quantifier,
        target: GroupTarget,
    },
    Not(Box<ConditionExpr>),
    And(Box<ConditionExpr>, Box<ConditionExpr>),
    Or(Box<ConditionExpr>, Box<ConditionExpr>),
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selection(name) => write!(f, "{}", name),
            Self::Group { quantifier, target } => {
                let q = match quantifier {
                    Quantifier::Any => "1",
                    Quantifier::All => "all",
                };
                match target {
                    GroupTarget::Them => write!(f, "{} of them", q),
                    GroupTarget::Pattern(p) => write!(f, "{} of {}", q, p),
                }
            }
            Self::Not(inner) => write!(f, "not ({})", inner),
            Self::And(a, b) => write!(f, "({} and {})", a, b),
            Self::Or(a, b) => write!(f, "({} or {})", a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Of,
    Word(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParserError> {
    let mut tokens = vec![];
    let mut chars: Peekable<CharIndices> = input.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        match c {
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            c if c.is_whitespace() => {}
            c if is_word_char(c) => {
                let mut word = c.to_string();
                while let Some((_, next)) = chars.peek() {
                    if !is_word_char(*next) {
                        break;
                    }
                    word.push(*next);
                    chars.next();
                }
                let token = match word.to_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "of" => Token::Of,
                    _ => Token::Word(word),
                };
                tokens.push(token);
            }
            other => {
                return Err(ParserError::InvalidCondition(
                    input.to_string(),
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }
    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '*' | '-' | '.')
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

// Precedence from loosest to tightest: or, and, not
impl Parser<'_> {
    fn error<S: Into<String>>(&self, reason: S) -> ParserError {
        ParserError::InvalidCondition(self.input.to_string(), reason.into())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn parse_or(&mut self) -> Result<ConditionExpr, ParserError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = ConditionExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<ConditionExpr, ParserError> {
        let mut left = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = ConditionExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<ConditionExpr, ParserError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(ConditionExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<ConditionExpr, ParserError> {
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("missing closing parenthesis")),
                }
            }
            Some(Token::Word(word)) if self.peek() == Some(&Token::Of) => {
                self.advance();
                let quantifier = match word.to_lowercase().as_str() {
                    "1" | "any" => Quantifier::Any,
                    "all" => Quantifier::All,
                    _ => return Err(ParserError::UnsupportedQuantifier(word)),
                };
                let target = match self.advance() {
                    Some(Token::Word(t)) if t.eq_ignore_ascii_case("them") => GroupTarget::Them,
                    Some(Token::Word(t)) => GroupTarget::Pattern(t),
                    _ => return Err(self.error("expected a selection pattern after 'of'")),
                };
                Ok(ConditionExpr::Group { quantifier, target })
            }
            Some(Token::Word(word)) => {
                if word.contains('*') {
                    return Err(self.error(format!(
                        "wildcard '{}' is only allowed after 'of'",
                        word
                    )));
                }
                Ok(ConditionExpr::Selection(word))
            }
            Some(token) => Err(self.error(format!("unexpected token {:?}", token))),
            None => Err(self.error("unexpected end of condition")),
        }
    }
}

/// Parse a condition string such as `selection and not 1 of filter_*`.
pub fn parse_condition(input: &str) -> Result<ConditionExpr, ParserError> {
    let mut parser = Parser {
        input,
        tokens: tokenize(input)?,
        position: 0,
    };
    if parser.tokens.is_empty() {
        return Err(parser.error("empty condition"));
    }

    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error(format!("unexpected token {:?}", token))),
    }
}
