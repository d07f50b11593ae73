//! Leveled user-facing output.
//!
//! Three levels: quiet suppresses everything but errors, normal reports
//! per-file outcomes, verbose adds skipped and unchanged files. During an
//! interactive session messages are spooled to temporary files and flushed
//! to the real streams once the session ends, so prompts stay readable.

use crate::config::WorkerConfig;
use crate::errors::ReplaceResult;
use std::fmt::Display;
use std::io::{self, Write};
use tempfile::NamedTempFile;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Quiet,
    Normal,
    Verbose,
}

impl Level {
    /// Quiet wins when both flags are set.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Level::Quiet
        } else if verbose {
            Level::Verbose
        } else {
            Level::Normal
        }
    }
}

#[derive(Debug)]
enum Sink {
    Stdout,
    Stderr,
    Temp(NamedTempFile),
}

impl Sink {
    fn write_line(&mut self, message: &str) {
        let result = match self {
            Sink::Stdout => writeln!(io::stdout(), "{}", message),
            Sink::Stderr => writeln!(io::stderr(), "{}", message),
            Sink::Temp(file) => writeln!(file, "{}", message),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to write notification");
        }
    }
}

#[derive(Debug)]
pub struct Notifier {
    level: Level,
    out: Sink,
    err: Sink,
}

impl Notifier {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            out: Sink::Stdout,
            err: Sink::Stderr,
        }
    }

    /// Interactive sessions spool both streams to temporary files.
    pub fn for_config(config: &WorkerConfig) -> ReplaceResult<Self> {
        let level = Level::from_flags(config.quiet, config.verbose);
        if config.interactive {
            Ok(Self {
                level,
                out: Sink::Temp(NamedTempFile::new()?),
                err: Sink::Temp(NamedTempFile::new()?),
            })
        } else {
            Ok(Self::new(level))
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn info(&mut self, message: impl Display) {
        if self.level >= Level::Normal {
            self.out.write_line(&message.to_string());
        }
    }

    pub fn verbose(&mut self, message: impl Display) {
        if self.level >= Level::Verbose {
            self.out.write_line(&message.to_string());
        }
    }

    /// Errors print at every level.
    pub fn error(&mut self, message: impl Display) {
        self.err.write_line(&message.to_string());
    }

    /// Drains spooled messages into the given streams and reverts to
    /// writing through directly. No-op for non-spooled sinks.
    pub fn flush_into(
        &mut self,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> io::Result<()> {
        if let Sink::Temp(file) = std::mem::replace(&mut self.out, Sink::Stdout) {
            let mut reader = file.reopen()?;
            io::copy(&mut reader, out)?;
        }
        if let Sink::Temp(file) = std::mem::replace(&mut self.err, Sink::Stderr) {
            let mut reader = file.reopen()?;
            io::copy(&mut reader, err)?;
        }
        Ok(())
    }
}
