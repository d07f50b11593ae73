//! Bulk search-and-replace across files, as a library.
//!
//! A session is driven by a [`WorkerConfig`] and runs in three phases:
//! resolve the configured sources into candidate files, classify and match
//! each candidate against the search input, and then iterate over the
//! matched files applying replacements wholesale or edit group by edit
//! group.
//!
//! ```no_run
//! use textswap::{Worker, WorkerConfig};
//!
//! # fn main() -> textswap::ReplaceResult<()> {
//! let mut worker = Worker::new(WorkerConfig {
//!     search: "hello".to_string(),
//!     replace: "goodbye".to_string(),
//!     recurse: true,
//!     ..WorkerConfig::default()
//! })?;
//! worker.init_targets()?;
//! worker.find_matching(|path, matched, _| {
//!     if matched {
//!         println!("match: {}", path.display());
//!     }
//! });
//! if let Some(mut iter) = worker.start_iterating() {
//!     while iter.valid() {
//!         iter.apply_all()?;
//!         iter.advance();
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod classify;
pub mod config;
pub mod diff;
pub mod errors;
pub mod filters;
pub mod iterator;
pub mod logging;
pub mod matcher;
pub mod notify;
pub mod replace;
pub mod resolver;
pub mod worker;

pub use config::{MatchMode, WorkerConfig};
pub use diff::{Diff, EditGroup};
pub use errors::{ReplaceError, ReplaceResult};
pub use iterator::{Applied, FileIter};
pub use logging::init_logging;
pub use notify::{Level, Notifier};
pub use replace::replace_content;
pub use worker::Worker;
