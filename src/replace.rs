//! The replace engine: given original content and the session's match mode,
//! produce replacement content and a substitution count.
//!
//! Case-insensitive and case-preserving literal replacement are implemented
//! as an escaped `(?i)` pattern scan, which keeps match offsets correct for
//! content where lowercasing would change byte lengths.

use regex::Regex;

use crate::config::MatchMode;
use crate::errors::{ReplaceError, ReplaceResult};
use crate::matcher::build_regex;

/// Dispatches to the algorithm selected by the session mode.
pub fn replace_content(
    mode: MatchMode,
    search: &str,
    replace: &str,
    content: &str,
) -> ReplaceResult<(String, usize)> {
    match mode {
        MatchMode::Literal => Ok(replace_literal(search, replace, content)),
        MatchMode::Insensitive => replace_insensitive(search, replace, content),
        MatchMode::PreserveCase => replace_preserve_case(search, replace, content),
        MatchMode::Regex {
            multi_line,
            dot_matches_newline,
            ignore_case,
        } => {
            let rx = build_regex(search, multi_line, dot_matches_newline, ignore_case)?;
            Ok(replace_regex(&rx, replace, content))
        }
    }
}

/// Exact substring replacement of every occurrence.
pub fn replace_literal(search: &str, replace: &str, content: &str) -> (String, usize) {
    if search.is_empty() {
        return (content.to_string(), 0);
    }
    let count = content.matches(search).count();
    if count == 0 {
        return (content.to_string(), 0);
    }
    (content.replace(search, replace), count)
}

/// Matches ignoring case; the replacement text is used verbatim.
pub fn replace_insensitive(
    search: &str,
    replace: &str,
    content: &str,
) -> ReplaceResult<(String, usize)> {
    scan_insensitive(search, content, |_| replace.to_string())
}

/// Matches ignoring case; the casing pattern of each matched occurrence is
/// detected and applied to the replacement text before substitution.
pub fn replace_preserve_case(
    search: &str,
    replace: &str,
    content: &str,
) -> ReplaceResult<(String, usize)> {
    scan_insensitive(search, content, |matched| {
        CasePattern::detect(matched).apply(replace)
    })
}

/// Regular expression replacement of every occurrence. Capture references
/// use `$1`/`$name` syntax.
pub fn replace_regex(rx: &Regex, replace: &str, content: &str) -> (String, usize) {
    let count = rx.find_iter(content).count();
    if count == 0 {
        return (content.to_string(), 0);
    }
    (rx.replace_all(content, replace).into_owned(), count)
}

/// Case-insensitive scan driving both the verbatim and the case-preserving
/// literal algorithms; `render` produces the substitution for each match.
fn scan_insensitive(
    search: &str,
    content: &str,
    render: impl Fn(&str) -> String,
) -> ReplaceResult<(String, usize)> {
    if search.is_empty() {
        return Ok((content.to_string(), 0));
    }

    let pattern = format!("(?i){}", regex::escape(search));
    let rx = Regex::new(&pattern).map_err(|e| ReplaceError::invalid_pattern(e.to_string()))?;

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    let mut count = 0;
    for m in rx.find_iter(content) {
        out.push_str(&content[last..m.start()]);
        out.push_str(&render(m.as_str()));
        last = m.end();
        count += 1;
    }
    out.push_str(&content[last..]);
    Ok((out, count))
}

/// The casing shape of a matched occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePattern {
    Upper,
    Lower,
    Capitalized,
    Mixed,
}

impl CasePattern {
    /// Detects the casing shape of the matched text. Text without any
    /// alphabetic characters counts as mixed, leaving the replacement
    /// untouched.
    pub fn detect(matched: &str) -> Self {
        let letters: Vec<char> = matched.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            return CasePattern::Mixed;
        }
        if letters.iter().all(|c| c.is_uppercase()) {
            return CasePattern::Upper;
        }
        if letters.iter().all(|c| c.is_lowercase()) {
            return CasePattern::Lower;
        }
        let mut chars = matched.chars();
        let first_upper = chars.next().is_some_and(|c| c.is_uppercase());
        let rest_lower = chars.filter(|c| c.is_alphabetic()).all(|c| c.is_lowercase());
        if first_upper && rest_lower {
            CasePattern::Capitalized
        } else {
            CasePattern::Mixed
        }
    }

    /// Renders the replacement text in this casing shape.
    pub fn apply(&self, replacement: &str) -> String {
        match self {
            CasePattern::Upper => replacement.to_uppercase(),
            CasePattern::Lower => replacement.to_lowercase(),
            CasePattern::Capitalized => {
                let mut chars = replacement.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            }
            CasePattern::Mixed => replacement.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_replaces_every_occurrence() {
        let (out, count) = replace_literal("hello", "goodbye", "hello there, hello again");
        assert_eq!(out, "goodbye there, goodbye again");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_literal_no_match() {
        let (out, count) = replace_literal("absent", "x", "hello there");
        assert_eq!(out, "hello there");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_literal_empty_search_is_noop() {
        let (out, count) = replace_literal("", "x", "hello");
        assert_eq!(out, "hello");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_insensitive_uses_replacement_verbatim() {
        let (out, count) = replace_insensitive("hello", "goodbye", "HELLO and Hello").unwrap();
        assert_eq!(out, "goodbye and goodbye");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_insensitive_escapes_metacharacters() {
        let (out, count) = replace_insensitive("a.b", "x", "A.B but not axb").unwrap();
        assert_eq!(out, "x but not axb");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_preserve_case_shapes() {
        let (out, count) =
            replace_preserve_case("hello", "goodbye", "HELLO, Hello, hello").unwrap();
        assert_eq!(out, "GOODBYE, Goodbye, goodbye");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_preserve_case_mixed_is_verbatim() {
        let (out, count) = replace_preserve_case("hello", "goodbye", "say hElLo").unwrap();
        assert_eq!(out, "say goodbye");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_regex_capture_references() {
        let rx = build_regex(r"fn (\w+)\(\)", false, false, false).unwrap();
        let (out, count) = replace_regex(&rx, "fn new_$1()", "fn test_func() {}");
        assert_eq!(out, "fn new_test_func() {}");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_regex_with_inline_flags() {
        let rx = build_regex("^hello", true, false, true).unwrap();
        let (out, count) = replace_regex(&rx, "goodbye", "hello\nHELLO world\nnot hello");
        assert_eq!(out, "goodbye\ngoodbye world\nnot hello");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_dispatch_by_mode() {
        let (out, _) =
            replace_content(MatchMode::Literal, "hello", "goodbye", "hello HELLO").unwrap();
        assert_eq!(out, "goodbye HELLO");

        let (out, _) =
            replace_content(MatchMode::Insensitive, "hello", "goodbye", "hello HELLO").unwrap();
        assert_eq!(out, "goodbye goodbye");

        let (out, _) =
            replace_content(MatchMode::PreserveCase, "hello", "goodbye", "hello HELLO").unwrap();
        assert_eq!(out, "goodbye GOODBYE");
    }

    #[test]
    fn test_case_pattern_detection() {
        assert_eq!(CasePattern::detect("HELLO"), CasePattern::Upper);
        assert_eq!(CasePattern::detect("hello"), CasePattern::Lower);
        assert_eq!(CasePattern::detect("Hello"), CasePattern::Capitalized);
        assert_eq!(CasePattern::detect("hElLo"), CasePattern::Mixed);
        assert_eq!(CasePattern::detect("1234"), CasePattern::Mixed);
    }

    #[test]
    fn test_literal_round_trip_when_disjoint() {
        // replacing back only restores the original when the search text
        // does not occur inside the replacement
        let original = "one two one";
        let (forward, _) = replace_literal("one", "three", original);
        let (back, _) = replace_literal("three", "one", &forward);
        assert_eq!(back, original);

        let (forward, _) = replace_literal("one", "one one", original);
        let (back, _) = replace_literal("one one", "one", &forward);
        assert_eq!(back, original); // still equal here, but not in general
        let (forward, _) = replace_literal("on", "onon", original);
        let (back, _) = replace_literal("onon", "on", &forward);
        assert_eq!(back, original);
    }
}
