//! Expands the configured sources into a deduplicated list of candidate
//! files.
//!
//! Directories expand to their immediate files, or to the full tree when
//! recursion is on. Paths are canonicalized so the same file reached
//! through different spellings is only considered once. Unresolvable paths
//! are recorded rather than aborting; only exceeding the file-count cap is
//! fatal.

use crate::config::WorkerConfig;
use crate::errors::{io_error_for, ReplaceError, ReplaceResult};
use crate::filters::is_hidden;
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub struct Resolver {
    recurse: bool,
    include_hidden: bool,
    no_limits: bool,
    max_file_count: usize,
    targets: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
    skipped: Vec<(PathBuf, ReplaceError)>,
}

impl Resolver {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            recurse: config.recurse,
            include_hidden: config.include_hidden,
            no_limits: config.no_limits,
            max_file_count: config.max_file_count,
            targets: Vec::new(),
            seen: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    /// Adds one source path. Files are taken as-is; directories expand
    /// according to the recursion setting. Missing or unreadable paths are
    /// recorded as skipped.
    pub fn add(&mut self, path: &Path) -> ReplaceResult<()> {
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                self.skipped.push((path.to_path_buf(), io_error_for(path, e)));
                return Ok(());
            }
        };
        if canonical.is_dir() {
            if self.recurse {
                self.walk_tree(&canonical)
            } else {
                self.list_dir(&canonical)
            }
        } else {
            // explicitly named files bypass the hidden filter
            self.push_file(canonical)
        }
    }

    /// Adds every path named in a list file, one per line.
    pub fn add_list_file(&mut self, path: &Path) -> ReplaceResult<()> {
        let file = fs::File::open(path).map_err(|e| io_error_for(path, e))?;
        self.add_reader(io::BufReader::new(file), false)
    }

    /// Adds paths read from a stream, newline- or NUL-delimited.
    pub fn add_reader(
        &mut self,
        mut reader: impl BufRead,
        null_delimited: bool,
    ) -> ReplaceResult<()> {
        if null_delimited {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            for piece in buf.split(|&b| b == 0) {
                let name = String::from_utf8_lossy(piece);
                let name = name.trim();
                if !name.is_empty() {
                    self.add(Path::new(name))?;
                }
            }
        } else {
            for line in reader.lines() {
                let line = line?;
                let name = line.trim();
                if !name.is_empty() {
                    self.add(Path::new(name))?;
                }
            }
        }
        Ok(())
    }

    fn walk_tree(&mut self, dir: &Path) -> ReplaceResult<()> {
        debug!(dir = %dir.display(), "walking directory tree");
        let walker = WalkBuilder::new(dir)
            .hidden(!self.include_hidden)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false)
            .build();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let io_err = io::Error::new(io::ErrorKind::Other, e.to_string());
                    self.skipped.push((dir.to_path_buf(), ReplaceError::Io(io_err)));
                    continue;
                }
            };
            if entry.file_type().map_or(false, |t| t.is_file()) {
                let canonical = match entry.path().canonicalize() {
                    Ok(p) => p,
                    Err(e) => {
                        self.skipped
                            .push((entry.path().to_path_buf(), io_error_for(entry.path(), e)));
                        continue;
                    }
                };
                self.push_file(canonical)?;
            }
        }
        Ok(())
    }

    fn list_dir(&mut self, dir: &Path) -> ReplaceResult<()> {
        debug!(dir = %dir.display(), "listing directory");
        let entries = fs::read_dir(dir).map_err(|e| io_error_for(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error_for(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if !self.include_hidden && is_hidden(&path) {
                trace!(path = %path.display(), "skipping hidden file");
                continue;
            }
            let canonical = match path.canonicalize() {
                Ok(p) => p,
                Err(e) => {
                    self.skipped.push((path.clone(), io_error_for(&path, e)));
                    continue;
                }
            };
            self.push_file(canonical)?;
        }
        Ok(())
    }

    fn push_file(&mut self, canonical: PathBuf) -> ReplaceResult<()> {
        if !self.seen.insert(canonical.clone()) {
            return Ok(());
        }
        self.targets.push(canonical);
        if !self.no_limits && self.targets.len() > self.max_file_count {
            return Err(ReplaceError::TooManyFiles(self.max_file_count));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Candidate files in discovery order, plus the paths that could not be
    /// resolved and why.
    pub fn finish(self) -> (Vec<PathBuf>, Vec<(PathBuf, ReplaceError)>) {
        (self.targets, self.skipped)
    }
}
