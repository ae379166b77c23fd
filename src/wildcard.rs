#[derive(Debug, Clone, PartialEq)]
pub enum WildcardToken {
    Star,
    QuestionMark,
    Pattern(Vec<char>),
}

/// Tokenize a Sigma string into a list of WildcardTokens.
/// Escape sequences (`\*`, `\?` and `\\`) are decoded into the plain characters,
/// a backslash before any other character is kept as a literal backslash.
/// See: https://github.com/SigmaHQ/sigma-specification/blob/main/specification/sigma-rules-specification.md#escaping
pub(crate) fn tokenize(s: &str) -> Vec<WildcardToken> {
    let mut result = vec![];
    let mut buffer: Vec<char> = vec![];

    let mut escape_mode = false;

    for char in s.chars() {
        match char {
            '*' | '?' if escape_mode => {
                buffer.push(char);
                escape_mode = false;
            }
            '*' => {
                flush(&mut buffer, &mut result);
                push_star(&mut result);
            }
            '?' => {
                flush(&mut buffer, &mut result);
                result.push(WildcardToken::QuestionMark)
            }
            '\\' => {
                if escape_mode {
                    buffer.push('\\');
                }
                escape_mode = !escape_mode;
            }
            _ => {
                if escape_mode {
                    buffer.push('\\');
                    escape_mode = false;
                }
                buffer.push(char)
            }
        }
    }
    if escape_mode {
        buffer.push('\\');
    }
    flush(&mut buffer, &mut result);

    result
}

fn flush(buffer: &mut Vec<char>, result: &mut Vec<WildcardToken>) {
    if !buffer.is_empty() {
        result.push(WildcardToken::Pattern(std::mem::take(buffer)));
    }
}

/// Append a star unless the tokens already end with one.
pub(crate) fn push_star(tokens: &mut Vec<WildcardToken>) {
    if !matches!(tokens.last(), Some(WildcardToken::Star)) {
        tokens.push(WildcardToken::Star)
    }
}

/// Prepend a star unless the tokens already start with one.
pub(crate) fn prepend_star(tokens: &mut Vec<WildcardToken>) {
    if !matches!(tokens.first(), Some(WildcardToken::Star)) {
        tokens.insert(0, WildcardToken::Star)
    }
}

pub(crate) fn contains_wildcard(tokens: &[WildcardToken]) -> bool {
    tokens
        .iter()
        .any(|t| matches!(t, WildcardToken::Star | WildcardToken::QuestionMark))
}

fn match_tokenized(tokens: &[WildcardToken], haystack: &str) -> bool {
    let mut starmode = false;
    let mut haystack_iterator = haystack.chars().peekable();

    'outer: for (i, token) in tokens.iter().enumerate() {
        let is_last_token = i == tokens.len() - 1;
        match token {
            WildcardToken::QuestionMark => {
                if haystack_iterator.next().is_none() {
                    return false;
                }
            }
            WildcardToken::Pattern(p) if starmode => {
                starmode = false;
                let mut buffer: Vec<char> = vec![];

                while let Some(haystack_char) = haystack_iterator.next() {
                    buffer.push(haystack_char);
                    if buffer.len() > p.len() {
                        buffer.remove(0);
                    }
                    // The last token must line up with the end of the haystack
                    if buffer == *p && (!is_last_token || haystack_iterator.peek().is_none()) {
                        continue 'outer;
                    }
                }
                return false;
            }
            WildcardToken::Pattern(p) => {
                for c in p {
                    match haystack_iterator.next() {
                        Some(haystack_char) if haystack_char == *c => {}
                        _ => return false,
                    }
                }
            }
            WildcardToken::Star => {
                if is_last_token {
                    return true;
                }
                starmode = true;
            }
        }
    }

    haystack_iterator.peek().is_none()
}

/// Match a selection name against a pattern that only knows the star wildcard,
/// e.g. `selection_*` in `1 of selection_*`.
pub(crate) fn starmatch(pattern: &str, haystack: &str) -> bool {
    let mut tokens: Vec<WildcardToken> = vec![];
    let mut buffer: Vec<char> = vec![];
    for c in pattern.chars() {
        if c == '*' {
            flush(&mut buffer, &mut tokens);
            push_star(&mut tokens);
        } else {
            buffer.push(c);
        }
    }
    flush(&mut buffer, &mut tokens);

    match_tokenized(&tokens, haystack)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> WildcardToken {
        WildcardToken::Pattern(s.chars().collect())
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize(""), vec![]);
        assert_eq!(
            tokenize("a*b"),
            vec![pattern("a"), WildcardToken::Star, pattern("b")]
        );
        assert_eq!(
            tokenize("a?b"),
            vec![pattern("a"), WildcardToken::QuestionMark, pattern("b")]
        );
        assert_eq!(tokenize("a\\*b"), vec![pattern("a*b")]);
        assert_eq!(tokenize("a\\?b"), vec![pattern("a?b")]);

        //https://github.com/SigmaHQ/sigma-specification/blob/main/specification/sigma-rules-specification.md#escaping
        assert_eq!(tokenize(r"a\b"), vec![pattern(r"a\b")]);
        assert_eq!(tokenize(r"a\\b"), vec![pattern(r"a\b")]);
        assert_eq!(tokenize(r"a\\\b"), vec![pattern(r"a\\b")]);
        assert_eq!(tokenize(r"a\\\*b"), vec![pattern(r"a\*b")]);
        assert_eq!(tokenize(r"a\\\\b"), vec![pattern(r"a\\b")]);
        assert_eq!(tokenize(r"\System32\"), vec![pattern(r"\System32\")]);

        assert_eq!(
            tokenize(r"hello***?world"),
            vec![
                pattern("hello"),
                WildcardToken::Star,
                WildcardToken::QuestionMark,
                pattern("world"),
            ]
        );
    }

    #[test]
    fn test_star_helpers() {
        let mut tokens = tokenize("va*lue");
        push_star(&mut tokens);
        push_star(&mut tokens);
        prepend_star(&mut tokens);
        assert_eq!(
            tokens,
            vec![
                WildcardToken::Star,
                pattern("va"),
                WildcardToken::Star,
                pattern("lue"),
                WildcardToken::Star,
            ]
        );
        assert!(contains_wildcard(&tokens));
        assert!(!contains_wildcard(&tokenize(r"no\*wildcard")));
    }

    #[test]
    fn test_starmatch() {
        assert!(starmatch("select*", "select_file_with_asterisk"));
        assert!(starmatch("select*", "select"));
        assert!(starmatch("*_filter", "main_filter"));
        assert!(starmatch("sel*tion", "selection"));
        assert!(starmatch("*", "anything"));
        assert!(starmatch("exact", "exact"));

        assert!(!starmatch("select*", "filter"));
        assert!(!starmatch("sel*tion", "selections"));
        assert!(!starmatch("exact", "exactly"));
        assert!(!starmatch("filter_*", "filter"));
    }

    #[test]
    fn test_starmatch_repeated_pattern() {
        assert!(starmatch("foo*bar", "foobarbar"));
        assert!(starmatch("foo*bar*fizz", "foobarbarfizzfizz"));
        assert!(!starmatch("foo*bar*fizz", "foobarbarfizznope"));
    }
}
