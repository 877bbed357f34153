//! Results directory bookkeeping.
//!
//! Each run starts from a directory holding no artifact of a previous run. Files that are not
//! driver or `run-test` artifacts are left alone.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{DriverError, DriverResult};

/// Aggregate outcomes, one `name:STATUS[:message]` line per test.
pub const RESULTS_FILE: &str = "results";
/// Text report rendered after the run.
pub const REPORT_FILE: &str = "report";
/// Space-joined discriminant list.
pub const DISCS_FILE: &str = "discs";

/// Per-test artifact extensions written by `run-test`.
pub const ARTIFACT_EXTENSIONS: [&str; 4] = ["diff", "expected", "out", "result"];

/// Clear stale artifacts from `dir` and (re)create it.
///
/// Safe to call on a directory that does not exist yet.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn prepare_output_dir(dir: &Path) -> DriverResult<()> {
    if dir.exists() {
        for name in [RESULTS_FILE, REPORT_FILE, DISCS_FILE] {
            remove_if_present(&dir.join(name))?;
        }

        let entries = fs::read_dir(dir).map_err(|e| DriverError::io("cannot list", dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| DriverError::io("cannot list", dir, e))?.path();
            if is_artifact(&path) {
                remove_if_present(&path)?;
            }
        }
    }

    fs::create_dir_all(dir).map_err(|e| DriverError::io("cannot create", dir, e))
}

fn is_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext))
}

/// Remove a file, or a directory with everything under it.
fn remove_if_present(path: &Path) -> DriverResult<()> {
    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => {
            tracing::trace!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DriverError::io("cannot remove", path, e)),
    }
}
