use std::path::PathBuf;
use thiserror::Error;

/// Result type for replace operations
pub type ReplaceResult<T> = Result<T, ReplaceError>;

/// Errors that can occur while resolving, classifying, matching, and
/// rewriting target files.
///
/// Configuration-time errors (`InvalidPattern`, `InvalidGlob`,
/// `TooManyFiles`) abort the whole run before any file is touched.
/// `LargeFile`, `BinaryFile`, `NotFound`, `PermissionDenied`, `Encoding`,
/// and `Io` are per-file conditions: they skip the file in question and the
/// run continues.
#[derive(Error, Debug)]
pub enum ReplaceError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("too many files; try batches of {0} or less")]
    TooManyFiles(usize),
    #[error("file exceeds the size limit: {0}")]
    LargeFile(PathBuf),
    #[error("binary file: {0}")]
    BinaryFile(PathBuf),
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("invalid glob {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("invalid UTF-8 in file {path}: {source}")]
    Encoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no more matched files")]
    EndOfFiles,
}

impl ReplaceError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn large_file(path: impl Into<PathBuf>) -> Self {
        Self::LargeFile(path.into())
    }

    pub fn binary_file(path: impl Into<PathBuf>) -> Self {
        Self::BinaryFile(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn invalid_glob(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidGlob {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn encoding(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::Encoding {
            path: path.into(),
            source,
        }
    }

    /// True for the per-file conditions that skip a single target without
    /// ending the run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::LargeFile(_)
                | Self::BinaryFile(_)
                | Self::PermissionDenied(_)
                | Self::Encoding { .. }
                | Self::Io(_)
        )
    }
}

/// Maps a filesystem error to the taxonomy, keeping the offending path.
pub fn io_error_for(path: impl Into<PathBuf>, err: std::io::Error) -> ReplaceError {
    match err.kind() {
        std::io::ErrorKind::NotFound => ReplaceError::NotFound(path.into()),
        std::io::ErrorKind::PermissionDenied => ReplaceError::PermissionDenied(path.into()),
        _ => ReplaceError::Io(err),
    }
}
