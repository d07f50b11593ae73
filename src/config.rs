use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{ReplaceError, ReplaceResult};

/// Hard cap on how many files a single session may resolve.
pub const DEFAULT_MAX_FILE_COUNT: usize = 10_000;

/// Files larger than this are skipped unless `no_limits` is set.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Appended directly to the file name when no extension is configured,
/// producing emacs-style `file~` backups.
pub const DEFAULT_BACKUP_SEPARATOR: &str = "~";

/// Separator used once a backup extension has been configured,
/// producing `file.bak` style backups.
pub const CONFIGURED_BACKUP_SEPARATOR: &str = ".";

/// Configuration for a replace session. Immutable once the `Worker` is
/// constructed.
///
/// The boolean mode flags mirror the conventional CLI surface (regex,
/// multi-line, dot-matches-newline, ignore-case, preserve-case) and are
/// collapsed into a single [`MatchMode`] at construction time; nothing past
/// `Worker::new` consults the raw flag combinations again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// The text or pattern to search for
    pub search: String,

    /// The replacement text; `$1`/`$name` capture references in regex mode
    pub replace: String,

    /// Search and replace arguments are regular expressions
    #[serde(default)]
    pub regex: bool,

    /// Set the multi-line `(?m)` regexp flag (implies regex mode)
    #[serde(default)]
    pub multi_line: bool,

    /// Set the dot-matches-newline `(?s)` regexp flag (implies regex mode)
    #[serde(default)]
    pub dot_matches_newline: bool,

    /// Perform a case-insensitive search, literal or regex
    #[serde(default)]
    pub ignore_case: bool,

    /// Match case-insensitively and adapt the replacement text to the
    /// casing of each match; implies `ignore_case` and takes priority
    /// over a plain `ignore_case` request
    #[serde(default)]
    pub preserve_case: bool,

    /// Recurse into sub-directories
    #[serde(default)]
    pub recurse: bool,

    /// Include files and directories that start with a "."
    #[serde(default)]
    pub include_hidden: bool,

    /// Disable the file-count and file-size limits
    #[serde(default)]
    pub no_limits: bool,

    /// Process files classified as binary as if they were text
    #[serde(default)]
    pub binary_as_text: bool,

    /// Report what would have been done without writing anything
    #[serde(default)]
    pub dry_run: bool,

    /// Include unified diffs of all changes in the output
    #[serde(default)]
    pub show_diff: bool,

    /// Make backups before replacing content
    #[serde(default)]
    pub backup: bool,

    /// Backup file suffix; setting one implies `backup`
    #[serde(default)]
    pub backup_extension: Option<String>,

    /// Explicit path arguments
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Files containing one target path per line
    #[serde(default)]
    pub list_files: Vec<PathBuf>,

    /// Read target paths from piped input
    #[serde(default)]
    pub stdin_paths: bool,

    /// Piped input paths are NUL-delimited rather than one per line
    #[serde(default)]
    pub null_delimited: bool,

    /// Include glob patterns; when present a path must match at least one
    #[serde(default)]
    pub include: Vec<String>,

    /// Exclude glob patterns; exclusion takes precedence over inclusion
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// An interactive display owns the terminal; normal-priority output is
    /// redirected to a temporary sink until the display is torn down
    #[serde(default)]
    pub interactive: bool,

    /// Suppress all non-error output; wins over `verbose`
    #[serde(default)]
    pub quiet: bool,

    /// Report per-file classification skips
    #[serde(default)]
    pub verbose: bool,
}

fn default_max_file_count() -> usize {
    DEFAULT_MAX_FILE_COUNT
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            search: String::new(),
            replace: String::new(),
            regex: false,
            multi_line: false,
            dot_matches_newline: false,
            ignore_case: false,
            preserve_case: false,
            recurse: false,
            include_hidden: false,
            no_limits: false,
            binary_as_text: false,
            dry_run: false,
            show_diff: false,
            backup: false,
            backup_extension: None,
            paths: Vec::new(),
            list_files: Vec::new(),
            stdin_paths: false,
            null_delimited: false,
            include: Vec::new(),
            exclude: Vec::new(),
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            interactive: false,
            quiet: false,
            verbose: false,
        }
    }
}

impl WorkerConfig {
    /// Loads a configuration from a YAML file.
    pub fn load_from(path: &Path) -> ReplaceResult<Self> {
        let content = fs::read_to_string(path).map_err(ReplaceError::Io)?;
        serde_yaml::from_str(&content)
            .map_err(|e| ReplaceError::invalid_pattern(format!("failed to parse config: {}", e)))
    }

    /// Merges values from a CLI invocation over this configuration.
    /// Boolean flags are OR-ed; lists and strings from the CLI replace
    /// file-provided values when non-empty.
    pub fn merge_with_cli(mut self, cli: WorkerConfig) -> Self {
        if !cli.search.is_empty() {
            self.search = cli.search;
        }
        if !cli.replace.is_empty() {
            self.replace = cli.replace;
        }
        self.regex |= cli.regex;
        self.multi_line |= cli.multi_line;
        self.dot_matches_newline |= cli.dot_matches_newline;
        self.ignore_case |= cli.ignore_case;
        self.preserve_case |= cli.preserve_case;
        self.recurse |= cli.recurse;
        self.include_hidden |= cli.include_hidden;
        self.no_limits |= cli.no_limits;
        self.binary_as_text |= cli.binary_as_text;
        self.dry_run |= cli.dry_run;
        self.show_diff |= cli.show_diff;
        self.backup |= cli.backup;
        if cli.backup_extension.is_some() {
            self.backup_extension = cli.backup_extension;
        }
        if !cli.paths.is_empty() {
            self.paths = cli.paths;
        }
        if !cli.list_files.is_empty() {
            self.list_files = cli.list_files;
        }
        self.stdin_paths |= cli.stdin_paths;
        self.null_delimited |= cli.null_delimited;
        if !cli.include.is_empty() {
            self.include = cli.include;
        }
        if !cli.exclude.is_empty() {
            self.exclude = cli.exclude;
        }
        self.interactive |= cli.interactive;
        self.quiet |= cli.quiet;
        self.verbose |= cli.verbose;
        self
    }

    /// Whether a committed change should be preceded by a backup copy.
    /// A configured extension implies backups even without the flag.
    pub fn backup_enabled(&self) -> bool {
        self.backup || self.backup_extension.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// The `(separator, extension)` pair used to derive backup names.
    /// Defaults produce `file~`; a configured extension produces `file.ext`.
    pub fn backup_suffix(&self) -> (&str, &str) {
        match self.backup_extension.as_deref() {
            Some(ext) if !ext.is_empty() => (CONFIGURED_BACKUP_SEPARATOR, ext),
            _ => (DEFAULT_BACKUP_SEPARATOR, ""),
        }
    }

    /// The glob matching this session's own backup files, implicitly
    /// excluded unless hidden/backup files were requested.
    pub fn backup_glob(&self) -> String {
        let (sep, ext) = self.backup_suffix();
        format!("*{}{}", sep, ext)
    }
}

/// The matching strategy for a session, resolved exactly once from the
/// boolean flag combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Exact substring match
    Literal,
    /// Substring match ignoring case, replacement used verbatim
    Insensitive,
    /// Substring match ignoring case, replacement casing adapted per match
    PreserveCase,
    /// Regular expression with composable inline flags
    Regex {
        multi_line: bool,
        dot_matches_newline: bool,
        ignore_case: bool,
    },
}

impl MatchMode {
    /// Flag precedence: any regex-implying flag wins, then preserve-case
    /// (which implies ignore-case), then plain ignore-case, then literal.
    pub fn from_config(config: &WorkerConfig) -> Self {
        if config.regex || config.multi_line || config.dot_matches_newline {
            MatchMode::Regex {
                multi_line: config.multi_line,
                dot_matches_newline: config.dot_matches_newline,
                ignore_case: config.ignore_case || config.preserve_case,
            }
        } else if config.preserve_case {
            MatchMode::PreserveCase
        } else if config.ignore_case {
            MatchMode::Insensitive
        } else {
            MatchMode::Literal
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, MatchMode::Regex { .. })
    }
}
