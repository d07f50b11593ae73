//! Cursor over a session's matched files.
//!
//! Each position can produce a fresh [`Diff`] of the file against its full
//! replacement, and commit a (possibly partially kept) diff back to disk.
//! Committing is a no-op when nothing is kept, and otherwise goes through
//! the backup and atomic-overwrite path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backup::{backup_and_overwrite, collision_free_backup_name, write_atomic};
use crate::diff::Diff;
use crate::errors::{io_error_for, ReplaceError, ReplaceResult};
use crate::replace::replace_content;
use crate::worker::Worker;

/// The outcome of committing one file.
#[derive(Debug, Clone)]
pub struct Applied {
    pub path: PathBuf,
    /// Edit groups accepted by the commit.
    pub groups: usize,
    /// Substitutions written (or that would be written under dry-run).
    pub substitutions: usize,
    /// Unified-diff text of the kept edits; empty when nothing changed.
    pub unified: String,
    /// The backup written, or under dry-run the name it would get.
    pub backup: Option<PathBuf>,
    pub dry_run: bool,
}

pub struct FileIter<'w> {
    worker: &'w mut Worker,
    pos: usize,
}

impl<'w> FileIter<'w> {
    pub(crate) fn new(worker: &'w mut Worker) -> Self {
        Self { worker, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.worker.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worker.matched.is_empty()
    }

    /// Whether the cursor points at a file. False once iteration has moved
    /// past the last match or a stop was requested; remaining files are
    /// then left untouched.
    pub fn valid(&self) -> bool {
        self.pos < self.len() && !self.worker.stopped()
    }

    pub fn name(&self) -> Option<&Path> {
        self.worker.matched.get(self.pos).map(PathBuf::as_path)
    }

    /// Advances the cursor, saturating at the terminal position. Returns
    /// whether it still points at a file.
    pub fn advance(&mut self) -> bool {
        if self.pos < self.len() {
            self.pos += 1;
        }
        self.valid()
    }

    /// Re-reads the current file and computes its full replacement.
    /// Returns the substitution count and a diff with every group kept.
    pub fn replace(&mut self) -> ReplaceResult<(usize, Diff)> {
        if !self.valid() {
            return Err(ReplaceError::EndOfFiles);
        }
        let path = match self.worker.matched.get(self.pos) {
            Some(p) => p.clone(),
            None => return Err(ReplaceError::EndOfFiles),
        };
        let original = self.worker.classifier.classify(&path)?;
        let (modified, count) = replace_content(
            self.worker.mode,
            &self.worker.config.search,
            &self.worker.config.replace,
            &original,
        )?;
        let mut diff = Diff::new(path, original, modified);
        diff.keep_all();
        Ok((count, diff))
    }

    /// Computes the full replacement for the current file and commits it
    /// with every edit kept.
    pub fn apply_all(&mut self) -> ReplaceResult<Applied> {
        let (count, diff) = self.replace()?;
        self.commit(&diff, count)
    }

    /// Commits a diff whose groups the caller has flagged, typically after
    /// an interactive review. The substitution count is recomputed from the
    /// kept groups.
    pub fn apply_specific(&mut self, diff: &Diff) -> ReplaceResult<Applied> {
        let count = self.count_kept_substitutions(diff)?;
        self.commit(diff, count)
    }

    /// Substitutions inside the kept groups only. Each group's original
    /// lines are re-run through the engine; a diff group always covers the
    /// whole lines its substitutions touched.
    fn count_kept_substitutions(&self, diff: &Diff) -> ReplaceResult<usize> {
        let mut total = 0;
        for (index, group) in diff.groups().iter().enumerate() {
            if !group.keep {
                continue;
            }
            let original = diff.group_old_lines(index).concat();
            let (_, count) = replace_content(
                self.worker.mode,
                &self.worker.config.search,
                &self.worker.config.replace,
                &original,
            )?;
            total += count;
        }
        Ok(total)
    }

    fn commit(&mut self, diff: &Diff, substitutions: usize) -> ReplaceResult<Applied> {
        let path = diff.path().to_path_buf();
        let config = &self.worker.config;
        let dry_run = config.dry_run;

        let rendered = diff.render();
        // everything skipped, or the kept edits changed nothing
        if diff.kept_len() == 0 || rendered == diff.original() {
            self.worker.notifier.verbose(format!("{}: unchanged", path.display()));
            return Ok(Applied {
                path,
                groups: 0,
                substitutions: 0,
                unified: String::new(),
                backup: None,
                dry_run,
            });
        }

        let groups = diff.kept_len();
        let unified = diff.unified();
        let show_diff = config.show_diff;
        let (separator, extension) = config.backup_suffix();
        let wants_backup = config.backup_enabled();

        // writability is verified before the dry-run split, so a dry run
        // surfaces the same per-file refusal a real commit would
        let metadata = fs::metadata(&path).map_err(|e| io_error_for(&path, e))?;
        if metadata.permissions().readonly() {
            return Err(ReplaceError::permission_denied(&path));
        }

        let backup = if dry_run {
            wants_backup.then(|| collision_free_backup_name(&path, extension, separator))
        } else if wants_backup {
            Some(backup_and_overwrite(&path, &rendered, extension, separator)?)
        } else {
            write_atomic(&path, &rendered)?;
            None
        };

        debug!(
            path = %path.display(),
            groups,
            substitutions,
            dry_run,
            "committed file"
        );
        let verb = if dry_run { "would replace" } else { "replaced" };
        self.worker.notifier.info(format!(
            "{}: {} {} occurrence(s)",
            path.display(),
            verb,
            substitutions
        ));
        if show_diff && !unified.is_empty() {
            self.worker.notifier.info(&unified);
        }

        Ok(Applied {
            path,
            groups,
            substitutions,
            unified,
            backup,
            dry_run,
        })
    }
}
