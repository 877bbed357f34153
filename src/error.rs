//! Errors raised outside the per-test sandbox.
//!
//! A single test failing is never a `DriverError`: it becomes a
//! [`ResultRecord`](crate::results::ResultRecord). These errors cover setup, teardown and
//! report generation, and the CLI turns them into an `ERROR:` line.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("job count must be at least 1")]
    InvalidJobs,

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("test task panicked or was aborted: {0}")]
    Join(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

impl DriverError {
    /// Wrap an I/O error with the path and what was being done to it.
    pub fn io(action: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
