//! Per-file eligibility: size limit, binary/text classification, and
//! readability. Every target passes through here exactly once before the
//! pattern matcher ever sees its content.

use std::fs;
use std::path::Path;
use tracing::trace;

use crate::config::WorkerConfig;
use crate::errors::{io_error_for, ReplaceError, ReplaceResult};

/// Leading bytes inspected for the binary sniff.
const SNIFF_LEN: usize = 8192;

/// Extensions that are binary regardless of content.
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "obj", "o", "class", "jar", "war", "ear", "png", "jpg",
    "jpeg", "gif", "bmp", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "7z",
    "rar",
];

/// Classifies candidate files and produces their text content.
#[derive(Debug, Clone)]
pub struct Classifier {
    max_file_size: u64,
    no_limits: bool,
    binary_as_text: bool,
}

impl Classifier {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            no_limits: config.no_limits,
            binary_as_text: config.binary_as_text,
        }
    }

    /// Classifies one target and returns its content when eligible.
    ///
    /// Errors are per-file skips: `LargeFile` when the size cap applies,
    /// `BinaryFile` when the content sniff fails, `Encoding` when a
    /// text-looking file is not valid UTF-8, and mapped IO errors for
    /// everything else.
    pub fn classify(&self, path: &Path) -> ReplaceResult<String> {
        let metadata = fs::metadata(path).map_err(|e| io_error_for(path, e))?;

        if !self.no_limits && metadata.len() > self.max_file_size {
            trace!("skipping large file: {}", path.display());
            return Err(ReplaceError::large_file(path));
        }

        if !self.binary_as_text && is_likely_binary_path(path) {
            trace!("skipping binary extension: {}", path.display());
            return Err(ReplaceError::binary_file(path));
        }

        let bytes = fs::read(path).map_err(|e| io_error_for(path, e))?;

        if !self.binary_as_text && looks_binary(&bytes) {
            trace!("skipping binary content: {}", path.display());
            return Err(ReplaceError::binary_file(path));
        }

        if self.binary_as_text {
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        String::from_utf8(bytes).map_err(|e| ReplaceError::encoding(path, e))
    }
}

/// Whether the file's extension marks it as binary.
pub fn is_likely_binary_path(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return BINARY_EXTENSIONS
                .iter()
                .any(|&bin_ext| bin_ext.eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// NUL-byte sniff over the leading bytes. Plain text never contains NUL.
pub fn looks_binary(data: &[u8]) -> bool {
    let sniff = &data[..data.len().min(SNIFF_LEN)];
    sniff.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn classifier(no_limits: bool, binary_as_text: bool) -> Classifier {
        Classifier::new(&WorkerConfig {
            max_file_size: 64,
            no_limits,
            binary_as_text,
            ..WorkerConfig::default()
        })
    }

    #[test]
    fn test_is_likely_binary_path() {
        assert!(is_likely_binary_path(Path::new("test.exe")));
        assert!(is_likely_binary_path(Path::new("test.PNG")));
        assert!(!is_likely_binary_path(Path::new("test.rs")));
        assert!(!is_likely_binary_path(Path::new("test")));
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary(b"abc\0def"));
        assert!(!looks_binary(b"plain text\nwith lines\n"));
        assert!(!looks_binary(b""));
    }

    #[test]
    fn test_classify_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();

        let content = classifier(false, false).classify(&path).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_classify_large_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "x".repeat(100)).unwrap();

        let err = classifier(false, false).classify(&path).unwrap_err();
        assert!(matches!(err, ReplaceError::LargeFile(_)));

        // no_limits lifts the cap
        assert!(classifier(true, false).classify(&path).is_ok());
    }

    #[test]
    fn test_classify_binary_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.dat");
        fs::write(&path, b"ab\0cd").unwrap();

        let err = classifier(false, false).classify(&path).unwrap_err();
        assert!(matches!(err, ReplaceError::BinaryFile(_)));

        // the override decodes lossily instead of skipping
        assert!(classifier(false, true).classify(&path).is_ok());
    }

    #[test]
    fn test_classify_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9").unwrap();

        let err = classifier(false, false).classify(&path).unwrap_err();
        assert!(matches!(err, ReplaceError::Encoding { .. }));
    }

    #[test]
    fn test_classify_missing_file() {
        let dir = tempdir().unwrap();
        let err = classifier(false, false)
            .classify(&dir.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, ReplaceError::NotFound(_)));
    }
}
