use regex::Regex;
use std::sync::Arc;

use crate::config::MatchMode;
use crate::errors::{ReplaceError, ReplaceResult};

/// How a file's content is tested against the search input. Built once per
/// session from the resolved [`MatchMode`].
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Exact substring scan
    Literal(String),
    /// Case-insensitive substring scan; also used for preserve-case mode
    Insensitive(String),
    /// Regex tested against the whole file content
    Buffer(Arc<Regex>),
    /// Regex tested against each line independently, stopping at the first hit
    PerLine(Arc<Regex>),
}

impl MatchStrategy {
    /// Mode precedence is already resolved; this only decides buffer vs
    /// per-line regex testing. Either multi-line anchors or a newline-matching
    /// dot can span lines, so both select the whole-buffer test.
    pub fn from_mode(mode: MatchMode, search: &str) -> ReplaceResult<Self> {
        match mode {
            MatchMode::Literal => Ok(MatchStrategy::Literal(search.to_string())),
            MatchMode::Insensitive | MatchMode::PreserveCase => {
                Ok(MatchStrategy::Insensitive(search.to_string()))
            }
            MatchMode::Regex {
                multi_line,
                dot_matches_newline,
                ignore_case,
            } => {
                let rx = build_regex(search, multi_line, dot_matches_newline, ignore_case)?;
                if multi_line || dot_matches_newline {
                    Ok(MatchStrategy::Buffer(Arc::new(rx)))
                } else {
                    Ok(MatchStrategy::PerLine(Arc::new(rx)))
                }
            }
        }
    }

    /// Whether the content satisfies the search under this strategy.
    pub fn is_match(&self, content: &str) -> bool {
        match self {
            MatchStrategy::Literal(needle) => content.contains(needle),
            MatchStrategy::Insensitive(needle) => content
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            MatchStrategy::Buffer(rx) => rx.is_match(content),
            MatchStrategy::PerLine(rx) => content.lines().any(|line| rx.is_match(line)),
        }
    }
}

/// Compiles the user pattern with an inline flag prefix assembled from the
/// active mode bits: `(?m)`, `(?s)`, and `(?i)` compose independently.
pub fn build_regex(
    search: &str,
    multi_line: bool,
    dot_matches_newline: bool,
    ignore_case: bool,
) -> ReplaceResult<Regex> {
    let mut flags = String::new();
    if multi_line {
        flags.push('m');
    }
    if dot_matches_newline {
        flags.push('s');
    }
    if ignore_case {
        flags.push('i');
    }

    let pattern = if flags.is_empty() {
        search.to_string()
    } else {
        format!("(?{}){}", flags, search)
    };

    Regex::new(&pattern).map_err(|e| ReplaceError::invalid_pattern(e.to_string()))
}
