//! Line-oriented diffing between original and replacement content.
//!
//! The low-level comparison is delegated to the `similar` crate; this module
//! only regroups its edit script into maximal contiguous runs of changed
//! lines, each independently keepable or skippable, and renders the result
//! as merged content or unified-diff text.

use similar::{DiffOp, TextDiff};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A maximal contiguous run of changed lines, flagged keep or skip as a
/// unit. Ranges are line indices into the original and modified content.
#[derive(Debug, Clone)]
pub struct EditGroup {
    pub keep: bool,
    pub old_range: Range<usize>,
    pub new_range: Range<usize>,
}

/// A comparison of one file's original content against its full replacement,
/// segmented into [`EditGroup`]s. Groups default to skipped; callers
/// typically call [`Diff::keep_all`] before presenting the diff and then
/// flip individual groups off.
#[derive(Debug, Clone)]
pub struct Diff {
    path: PathBuf,
    original: String,
    modified: String,
    old_lines: Vec<String>,
    new_lines: Vec<String>,
    groups: Vec<EditGroup>,
}

/// Splits content into lines that retain their endings, so concatenating
/// the pieces reproduces the content byte for byte.
fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(String::from).collect()
}

impl Diff {
    pub fn new(path: impl Into<PathBuf>, original: String, modified: String) -> Self {
        let old_lines = split_lines(&original);
        let new_lines = split_lines(&modified);

        let old_refs: Vec<&str> = old_lines.iter().map(String::as_str).collect();
        let new_refs: Vec<&str> = new_lines.iter().map(String::as_str).collect();
        let text_diff = TextDiff::from_slices(&old_refs, &new_refs);

        let mut groups: Vec<EditGroup> = Vec::new();
        for op in text_diff.ops() {
            let (old_range, new_range) = match *op {
                DiffOp::Equal { .. } => continue,
                DiffOp::Delete {
                    old_index,
                    old_len,
                    new_index,
                } => (old_index..old_index + old_len, new_index..new_index),
                DiffOp::Insert {
                    old_index,
                    new_index,
                    new_len,
                } => (old_index..old_index, new_index..new_index + new_len),
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => (old_index..old_index + old_len, new_index..new_index + new_len),
            };

            // adjacent changed ops coalesce into one contiguous group
            match groups.last_mut() {
                Some(last)
                    if last.old_range.end == old_range.start
                        && last.new_range.end == new_range.start =>
                {
                    last.old_range.end = old_range.end;
                    last.new_range.end = new_range.end;
                }
                _ => groups.push(EditGroup {
                    keep: false,
                    old_range,
                    new_range,
                }),
            }
        }

        Self {
            path: path.into(),
            original,
            modified,
            old_lines,
            new_lines,
            groups,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn modified(&self) -> &str {
        &self.modified
    }

    /// Total number of edit groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of groups currently flagged keep.
    pub fn kept_len(&self) -> usize {
        self.groups.iter().filter(|g| g.keep).count()
    }

    pub fn groups(&self) -> &[EditGroup] {
        &self.groups
    }

    pub fn keep_all(&mut self) {
        for group in &mut self.groups {
            group.keep = true;
        }
    }

    pub fn skip_all(&mut self) {
        for group in &mut self.groups {
            group.keep = false;
        }
    }

    /// Flags one group; returns false when the index is out of range.
    pub fn set_keep(&mut self, index: usize, keep: bool) -> bool {
        match self.groups.get_mut(index) {
            Some(group) => {
                group.keep = keep;
                true
            }
            None => false,
        }
    }

    /// The original lines a group would remove.
    pub fn group_old_lines(&self, index: usize) -> &[String] {
        self.groups
            .get(index)
            .map(|g| &self.old_lines[g.old_range.clone()])
            .unwrap_or(&[])
    }

    /// The replacement lines a group would insert.
    pub fn group_new_lines(&self, index: usize) -> &[String] {
        self.groups
            .get(index)
            .map(|g| &self.new_lines[g.new_range.clone()])
            .unwrap_or(&[])
    }

    /// Merged content: replacement lines for kept groups, original lines
    /// for skipped groups, unchanged regions carried through untouched.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.original.len().max(self.modified.len()));
        let mut old_pos = 0;
        for group in &self.groups {
            for line in &self.old_lines[old_pos..group.old_range.start] {
                out.push_str(line);
            }
            let lines = if group.keep {
                &self.new_lines[group.new_range.clone()]
            } else {
                &self.old_lines[group.old_range.clone()]
            };
            for line in lines {
                out.push_str(line);
            }
            old_pos = group.old_range.end;
        }
        for line in &self.old_lines[old_pos..] {
            out.push_str(line);
        }
        out
    }

    /// Unified-diff text of the kept edits only.
    pub fn unified(&self) -> String {
        let merged = self.render();
        if merged == self.original {
            return String::new();
        }
        let name = self.path.display().to_string();
        let text_diff = TextDiff::from_lines(self.original.as_str(), merged.as_str());
        text_diff
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{}", name), &format!("b/{}", name))
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diff(original: &str, modified: &str) -> Diff {
        Diff::new("test.txt", original.to_string(), modified.to_string())
    }

    #[test]
    fn test_no_changes_yields_no_groups() {
        let diff = make_diff("a\nb\nc\n", "a\nb\nc\n");
        assert!(diff.is_empty());
        assert_eq!(diff.render(), "a\nb\nc\n");
        assert_eq!(diff.unified(), "");
    }

    #[test]
    fn test_contiguous_changes_form_one_group() {
        let diff = make_diff("a\nb\nc\nd\n", "a\nB\nC\nd\n");
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.group_old_lines(0), &["b\n", "c\n"]);
        assert_eq!(diff.group_new_lines(0), &["B\n", "C\n"]);
    }

    #[test]
    fn test_separated_changes_form_separate_groups() {
        let diff = make_diff("a\nb\nc\nd\ne\n", "A\nb\nc\nd\nE\n");
        assert_eq!(diff.len(), 2);
    }

    #[test]
    fn test_skip_all_restores_original() {
        let mut diff = make_diff("a\nb\nc\n", "a\nX\nc\n");
        diff.skip_all();
        assert_eq!(diff.render(), "a\nb\nc\n");
        assert_eq!(diff.kept_len(), 0);
        assert_eq!(diff.unified(), "");
    }

    #[test]
    fn test_keep_all_yields_modified() {
        let mut diff = make_diff("a\nb\nc\n", "a\nX\nc\n");
        diff.keep_all();
        assert_eq!(diff.render(), "a\nX\nc\n");
        assert_eq!(diff.kept_len(), 1);
    }

    #[test]
    fn test_selective_keep() {
        let mut diff = make_diff("a\nb\nc\nd\ne\n", "A\nb\nc\nd\nE\n");
        diff.keep_all();
        assert!(diff.set_keep(1, false));
        assert_eq!(diff.render(), "A\nb\nc\nd\ne\n");
        assert_eq!(diff.kept_len(), 1);
        assert!(!diff.set_keep(5, true));
    }

    #[test]
    fn test_insertion_and_deletion_groups() {
        // pure insertion
        let mut diff = make_diff("a\nc\n", "a\nb\nc\n");
        assert_eq!(diff.len(), 1);
        diff.keep_all();
        assert_eq!(diff.render(), "a\nb\nc\n");

        // pure deletion
        let mut diff = make_diff("a\nb\nc\n", "a\nc\n");
        assert_eq!(diff.len(), 1);
        diff.keep_all();
        assert_eq!(diff.render(), "a\nc\n");
    }

    #[test]
    fn test_missing_trailing_newline_round_trips() {
        let mut diff = make_diff("a\nb", "a\nB");
        diff.keep_all();
        assert_eq!(diff.render(), "a\nB");
        diff.skip_all();
        assert_eq!(diff.render(), "a\nb");
    }

    #[test]
    fn test_unified_mentions_kept_edits_only() {
        let mut diff = make_diff("a\nb\nc\nd\ne\nf\ng\nh\ni\nj\n", "A\nb\nc\nd\ne\nf\ng\nh\ni\nJ\n");
        diff.keep_all();
        diff.set_keep(1, false);
        let unified = diff.unified();
        assert!(unified.contains("-a"));
        assert!(unified.contains("+A"));
        assert!(!unified.contains("+J"));
    }
}
