//! The session worker: owns the configuration, the resolved match mode,
//! the compiled filters, and the target pipeline.
//!
//! A session moves through three lists. `targets` are the resolved
//! candidate paths, `files` are the targets that passed glob filtering and
//! classification, and `matched` are the files whose content matches the
//! search input. Replacement only ever touches `matched`.

use std::fmt;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use glob::Pattern;
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::config::{MatchMode, WorkerConfig};
use crate::errors::{ReplaceError, ReplaceResult};
use crate::filters::{is_included, parse_globs};
use crate::iterator::FileIter;
use crate::matcher::MatchStrategy;
use crate::notify::Notifier;
use crate::resolver::Resolver;

#[derive(Debug)]
pub struct Worker {
    pub(crate) config: WorkerConfig,
    pub(crate) mode: MatchMode,
    pub(crate) strategy: MatchStrategy,
    pub(crate) classifier: Classifier,
    pub(crate) notifier: Notifier,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    targets: Vec<PathBuf>,
    skipped: Vec<(PathBuf, ReplaceError)>,
    files: Vec<PathBuf>,
    pub(crate) matched: Vec<PathBuf>,
    stop: AtomicBool,
}

impl Worker {
    /// Validates the configuration and compiles the session's pattern and
    /// filters. Fails fast on an empty search input, a malformed regex, or
    /// a malformed glob; no file is touched before all of these pass.
    pub fn new(config: WorkerConfig) -> ReplaceResult<Self> {
        if config.search.is_empty() {
            return Err(ReplaceError::invalid_pattern("empty search input"));
        }

        let mode = MatchMode::from_config(&config);
        let strategy = MatchStrategy::from_mode(mode, &config.search)?;
        let include = parse_globs(&config.include)?;
        let mut exclude = parse_globs(&config.exclude)?;

        // backups count as hidden working files; a session never rewrites
        // its own
        if !config.include_hidden {
            let glob = config.backup_glob();
            exclude.push(
                Pattern::new(&glob)
                    .map_err(|e| ReplaceError::invalid_glob(glob.clone(), e.msg))?,
            );
        }

        let classifier = Classifier::new(&config);
        let notifier = Notifier::for_config(&config)?;
        debug!(?mode, "worker initialized");

        Ok(Self {
            config,
            mode,
            strategy,
            classifier,
            notifier,
            include,
            exclude,
            targets: Vec::new(),
            skipped: Vec::new(),
            files: Vec::new(),
            matched: Vec::new(),
            stop: AtomicBool::new(false),
        })
    }

    /// Resolves the configured sources into the target list. When piped
    /// input was requested, paths are also read from stdin.
    pub fn init_targets(&mut self) -> ReplaceResult<()> {
        if self.config.stdin_paths {
            let stdin = io::stdin();
            let locked = stdin.lock();
            self.resolve_targets(Some(locked))
        } else {
            self.resolve_targets(None::<io::Empty>)
        }
    }

    /// Like [`Worker::init_targets`] but with an explicit path stream, so
    /// piped input can come from anything readable.
    pub fn init_targets_from(&mut self, reader: impl BufRead) -> ReplaceResult<()> {
        self.resolve_targets(Some(reader))
    }

    fn resolve_targets(&mut self, reader: Option<impl BufRead>) -> ReplaceResult<()> {
        let mut resolver = Resolver::new(&self.config);

        let had_sources = !self.config.paths.is_empty()
            || !self.config.list_files.is_empty()
            || reader.is_some();
        if !had_sources {
            resolver.add(Path::new("."))?;
        }
        for path in &self.config.paths {
            resolver.add(path)?;
        }
        for list in &self.config.list_files {
            resolver.add_list_file(list)?;
        }
        if let Some(reader) = reader {
            resolver.add_reader(reader, self.config.null_delimited)?;
        }

        let had_explicit = !self.config.paths.is_empty();
        let (targets, skipped) = resolver.finish();

        // every explicitly named path failed to resolve
        if targets.is_empty() && had_explicit {
            if let Some((_, err)) = skipped.into_iter().next() {
                return Err(err);
            }
            return Ok(());
        }
        for (path, err) in &skipped {
            self.notifier.error(format!("skipping {}: {}", path.display(), err));
        }

        info!(targets = targets.len(), skipped = skipped.len(), "resolved targets");
        self.targets = targets;
        self.skipped = skipped;
        Ok(())
    }

    /// Filters, classifies, and matches every target, invoking `progress`
    /// once per classified file with the path, whether it matched, and the
    /// classification error when one applied. Paths that failed resolution
    /// are reported through the same callback first. Honors the stop flag
    /// between files.
    pub fn find_matching(
        &mut self,
        mut progress: impl FnMut(&Path, bool, Option<&ReplaceError>),
    ) {
        for (path, err) in &self.skipped {
            progress(path, false, Some(err));
        }
        let targets = std::mem::take(&mut self.targets);
        for path in &targets {
            if self.stopped() {
                break;
            }
            if !is_included(&self.include, &self.exclude, path) {
                continue;
            }
            match self.classifier.classify(path) {
                Ok(content) => {
                    self.files.push(path.clone());
                    let hit = self.strategy.is_match(&content);
                    if hit {
                        self.matched.push(path.clone());
                    }
                    progress(path, hit, None);
                }
                Err(err) => {
                    self.notifier
                        .verbose(format!("skipping {}: {}", path.display(), err));
                    progress(path, false, Some(&err));
                }
            }
        }
        self.targets = targets;
        info!(
            files = self.files.len(),
            matched = self.matched.len(),
            "finished matching"
        );
    }

    /// An iterator over the matched files, or `None` when nothing matched.
    pub fn start_iterating(&mut self) -> Option<FileIter<'_>> {
        if self.matched.is_empty() {
            None
        } else {
            Some(FileIter::new(self))
        }
    }

    /// Asks the worker to stop between files. Safe to call from another
    /// thread holding a shared reference.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn notifier(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// Paths that failed resolution, with the per-path error.
    pub fn resolution_skips(&self) -> &[(PathBuf, ReplaceError)] {
        &self.skipped
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn matched(&self) -> &[PathBuf] {
        &self.matched
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} -> {:?}: targets={} files={} matched={}",
            self.config.search,
            self.config.replace,
            self.targets.len(),
            self.files.len(),
            self.matched.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config(search: &str, replace: &str) -> WorkerConfig {
        WorkerConfig {
            search: search.to_string(),
            replace: replace.to_string(),
            ..WorkerConfig::default()
        }
    }

    #[test]
    fn test_empty_search_rejected() {
        let err = Worker::new(config("", "x")).unwrap_err();
        assert!(matches!(err, ReplaceError::InvalidPattern(_)));
    }

    #[test]
    fn test_malformed_regex_rejected_at_construction() {
        let err = Worker::new(WorkerConfig {
            regex: true,
            ..config("[nope", "x")
        })
        .unwrap_err();
        assert!(matches!(err, ReplaceError::InvalidPattern(_)));
    }

    #[test]
    fn test_malformed_glob_rejected_at_construction() {
        let err = Worker::new(WorkerConfig {
            exclude: vec!["[bad".to_string()],
            ..config("a", "b")
        })
        .unwrap_err();
        assert!(matches!(err, ReplaceError::InvalidGlob { .. }));
    }

    #[test]
    fn test_pipeline_counts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.txt"), "hello world\n").unwrap();
        fs::write(dir.path().join("two.txt"), "nothing here\n").unwrap();

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![dir.path().to_path_buf()],
            ..config("hello", "goodbye")
        })
        .unwrap();
        worker.init_targets().unwrap();
        assert_eq!(worker.targets().len(), 2);

        let mut seen = 0;
        worker.find_matching(|_, _, _| seen += 1);
        assert_eq!(seen, 2);
        assert_eq!(worker.files().len(), 2);
        assert_eq!(worker.matched().len(), 1);
    }

    #[test]
    fn test_all_explicit_paths_missing_is_fatal() {
        let dir = tempdir().unwrap();
        let mut worker = Worker::new(WorkerConfig {
            paths: vec![dir.path().join("absent.txt")],
            ..config("a", "b")
        })
        .unwrap();
        let err = worker.init_targets().unwrap_err();
        assert!(matches!(err, ReplaceError::NotFound(_)));
    }

    #[test]
    fn test_some_explicit_paths_missing_is_not_fatal() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("here.txt");
        fs::write(&present, "hello\n").unwrap();

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![present, dir.path().join("absent.txt")],
            ..config("hello", "bye")
        })
        .unwrap();
        worker.init_targets().unwrap();
        assert_eq!(worker.targets().len(), 1);
        assert_eq!(worker.resolution_skips().len(), 1);
    }

    #[test]
    fn test_resolution_skips_reach_progress_callback() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("here.txt");
        let absent = dir.path().join("absent.txt");
        fs::write(&present, "hello\n").unwrap();

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![present, absent.clone()],
            ..config("hello", "bye")
        })
        .unwrap();
        worker.init_targets().unwrap();

        let mut events = Vec::new();
        worker.find_matching(|path, matched, err| {
            events.push((path.to_path_buf(), matched, err.is_some()));
        });
        // the unresolvable path is reported first, as an error event
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (absent, false, true));
        assert!(events[1].1);
    }

    #[test]
    fn test_exclude_glob_filters_silently() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "hello\n").unwrap();
        fs::write(dir.path().join("skip.log"), "hello\n").unwrap();

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![dir.path().to_path_buf()],
            exclude: vec!["*.log".to_string()],
            ..config("hello", "bye")
        })
        .unwrap();
        worker.init_targets().unwrap();

        let mut seen = Vec::new();
        worker.find_matching(|path, _, _| seen.push(path.to_path_buf()));
        // the excluded file produces no progress event at all
        assert_eq!(seen.len(), 1);
        assert_eq!(worker.files().len(), 1);
    }

    #[test]
    fn test_own_backups_excluded() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        fs::write(dir.path().join("a.txt.bak"), "hello\n").unwrap();

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![dir.path().to_path_buf()],
            backup_extension: Some("bak".to_string()),
            ..config("hello", "bye")
        })
        .unwrap();
        worker.init_targets().unwrap();
        worker.find_matching(|_, _, _| {});
        assert_eq!(worker.files().len(), 1);
    }

    #[test]
    fn test_stop_flag_halts_between_files() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{}.txt", i)), "hello\n").unwrap();
        }

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![dir.path().to_path_buf()],
            ..config("hello", "bye")
        })
        .unwrap();
        worker.init_targets().unwrap();

        let mut seen = 0;
        worker.request_stop();
        worker.find_matching(|_, _, _| seen += 1);
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_classification_errors_reported_per_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("text.txt"), "hello\n").unwrap();
        fs::write(dir.path().join("bin.dat"), b"he\x00llo").unwrap();

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![dir.path().to_path_buf()],
            ..config("hello", "bye")
        })
        .unwrap();
        worker.init_targets().unwrap();

        let mut errors = 0;
        worker.find_matching(|_, _, err| {
            if err.is_some() {
                errors += 1;
            }
        });
        assert_eq!(errors, 1);
        assert_eq!(worker.files().len(), 1);
        assert_eq!(worker.matched().len(), 1);
    }

    #[test]
    fn test_nothing_matched_yields_no_iterator() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "nothing\n").unwrap();

        let mut worker = Worker::new(WorkerConfig {
            paths: vec![dir.path().to_path_buf()],
            ..config("hello", "bye")
        })
        .unwrap();
        worker.init_targets().unwrap();
        worker.find_matching(|_, _, _| {});
        assert!(worker.start_iterating().is_none());
    }
}
