//! Glob-based path filtering.
//!
//! A path is included iff it matches no exclude pattern and, when include
//! patterns exist, matches at least one of them. Exclusion always takes
//! precedence. Patterns are compiled once at configuration time so that a
//! malformed glob aborts worker initialization instead of surfacing in the
//! middle of a run.

use glob::Pattern;
use std::path::Path;

use crate::errors::{ReplaceError, ReplaceResult};

/// Compiles a list of glob patterns, failing on the first malformed one.
pub fn parse_globs(patterns: &[String]) -> ReplaceResult<Vec<Pattern>> {
    let mut globs = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let compiled = Pattern::new(pattern)
            .map_err(|e| ReplaceError::invalid_glob(pattern.clone(), e.msg))?;
        globs.push(compiled);
    }
    Ok(globs)
}

/// Checks whether any pattern matches the path. Paths are normalized to
/// forward slashes so patterns behave the same on Windows.
fn matches_any(globs: &[Pattern], path: &Path) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    globs.iter().any(|g| g.matches(&normalized))
}

/// Determines whether a path passes the include/exclude constraints.
pub fn is_included(include: &[Pattern], exclude: &[Pattern], path: &Path) -> bool {
    if include.is_empty() && exclude.is_empty() {
        return true;
    }
    if !exclude.is_empty() && matches_any(exclude, path) {
        return false;
    }
    include.is_empty() || matches_any(include, path)
}

/// Whether the path's final component starts with a ".".
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
