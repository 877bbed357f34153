//! Test discovery.
//!
//! A test is a directory directly under the tests root. Discovery is a glob over
//! `<root>/*` narrowed by the optional single-test filter.
//!
//! The [`TestDiscovery`] trait separates the filesystem scan from the run so the
//! orchestration can be driven from a fixed list (dry runs, tests of the driver itself).

use std::fs;
use std::path::{Path, PathBuf};

use globset::Glob;

/// One test case: a directory holding everything `run-test` needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDescriptor {
    pub path: PathBuf,
}

impl TestDescriptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Name used for the `<name>.result` artifacts and in the results file.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// `:` separates the fields of a `results` line, so it cannot appear in a name.
    pub fn has_recordable_name(&self) -> bool {
        !self.name().contains(crate::results::FIELD_SEPARATOR)
    }
}

/// Discover the tests to run.
pub trait TestDiscovery {
    /// Test directories under `root` whose path contains `filter` (all when empty).
    fn discover(&self, root: &Path, filter: &str) -> Vec<TestDescriptor>;
}

/// Filesystem-based discovery.
pub struct FsTestDiscovery;

impl TestDiscovery for FsTestDiscovery {
    fn discover(&self, root: &Path, filter: &str) -> Vec<TestDescriptor> {
        let pattern = root.join("*");
        filter_list(&pattern.to_string_lossy(), filter)
            .into_iter()
            .filter(|p| p.is_dir())
            .map(TestDescriptor::new)
            .filter(|t| {
                let usable = t.has_recordable_name();
                if !usable {
                    tracing::warn!(test = %t.path.display(), "skipping test: ':' is not allowed in a test name");
                }
                usable
            })
            .collect()
    }
}

/// Compute the list of paths matching `pattern`.
///
/// Only the final component of `pattern` may hold wildcards (`*`, `?`, `[..]` classes).
/// If `run_test` is not empty, keep only the paths containing it (plain substring match on
/// the whole path). The result is sorted.
pub fn filter_list(pattern: &str, run_test: &str) -> Vec<PathBuf> {
    filter_paths(expand_glob(Path::new(pattern)), run_test)
}

/// The substring filter half of [`filter_list`].
pub fn filter_paths(paths: Vec<PathBuf>, run_test: &str) -> Vec<PathBuf> {
    if run_test.is_empty() {
        return paths;
    }
    paths
        .into_iter()
        .filter(|p| p.to_string_lossy().contains(run_test))
        .collect()
}

fn expand_glob(pattern: &Path) -> Vec<PathBuf> {
    let Some(name_pattern) = pattern.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Vec::new();
    };
    let dir = match pattern.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !has_wildcard(&name_pattern) {
        return if pattern.exists() { vec![pattern.to_path_buf()] } else { Vec::new() };
    }

    let matcher = match Glob::new(&name_pattern) {
        Ok(glob) => glob.compile_matcher(),
        Err(err) => {
            tracing::warn!(pattern = %name_pattern, "invalid glob: {err}");
            return Vec::new();
        }
    };

    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            // Like a shell glob, a leading wildcard does not match dot-files.
            if name.starts_with('.') && !name_pattern.starts_with('.') {
                return None;
            }
            matcher.is_match(&name).then(|| pattern.with_file_name(&name))
        })
        .collect();

    matches.sort();
    matches
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?', '['])
}
