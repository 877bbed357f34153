//! Resolved run configuration.
//!
//! Built once from the parsed CLI by [`Cli::into_config`](crate::cli::Cli::into_config) and
//! only read afterwards. The build-environment search path lives here as a value handed to the
//! executor; the driver never mutates its own environment.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::discs::Discriminants;

/// Environment variable naming the build platform directory.
pub const PLATFORM_VAR: &str = "PLATFORM";
/// Environment variable naming the build profile directory.
pub const PRJ_BUILD_VAR: &str = "PRJ_BUILD";

const DEFAULT_PLATFORM: &str = "native";
const DEFAULT_PRJ_BUILD: &str = "debug";

#[derive(Debug, Clone)]
pub struct Config {
    pub discs: Discriminants,
    pub output_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub host: Option<String>,
    pub target: Option<String>,
    pub verbose: bool,
    pub enable_cleanup: bool,
    pub view_diffs: bool,
    /// Substring a test path must contain; empty runs everything.
    pub run_test: String,
    pub jobs: usize,
    pub old_result_dir: Option<PathBuf>,
    /// Directory whose subdirectories are the tests.
    pub tests_dir: PathBuf,
    /// Per-test driver program.
    pub run_test_program: PathBuf,
    pub build_env: BuildEnv,
}

impl Config {
    pub fn results_file(&self) -> PathBuf {
        self.output_dir.join(crate::output_dir::RESULTS_FILE)
    }

    pub fn report_file(&self) -> PathBuf {
        self.output_dir.join(crate::output_dir::REPORT_FILE)
    }

    pub fn discs_file(&self) -> PathBuf {
        self.output_dir.join(crate::output_dir::DISCS_FILE)
    }
}

/// Location of the auxiliary test drivers produced by the project build.
///
/// `<root>/../.build/<platform>/<build>/static/{bin,rbin}` are appended to the `PATH`
/// of every `run-test` child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnv {
    pub platform: String,
    pub prj_build: String,
    pub search_dirs: Vec<PathBuf>,
}

impl BuildEnv {
    /// Read `PLATFORM` / `PRJ_BUILD` from the process environment.
    pub fn from_env(root: &Path) -> Self {
        Self::new(
            root,
            env::var(PLATFORM_VAR).ok().as_deref(),
            env::var(PRJ_BUILD_VAR).ok().as_deref(),
        )
    }

    pub fn new(root: &Path, platform: Option<&str>, prj_build: Option<&str>) -> Self {
        let platform = platform
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
        let prj_build = prj_build
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_PRJ_BUILD.to_string());

        let static_dir = root
            .join("..")
            .join(".build")
            .join(&platform)
            .join(&prj_build)
            .join("static");
        let search_dirs = vec![static_dir.join("bin"), static_dir.join("rbin")];

        Self {
            platform,
            prj_build,
            search_dirs,
        }
    }

    /// `base` with the search dirs appended, in `PATH` syntax.
    ///
    /// Falls back to the base value untouched if a directory contains the path separator.
    pub fn extend_path(&self, base: Option<OsString>) -> OsString {
        let mut dirs: Vec<PathBuf> = base.as_ref().map(|p| env::split_paths(p).collect()).unwrap_or_default();
        dirs.extend(self.search_dirs.iter().cloned());
        match env::join_paths(dirs) {
            Ok(joined) => joined,
            Err(e) => {
                tracing::warn!("cannot extend PATH with build directories: {e}");
                base.unwrap_or_default()
            }
        }
    }
}
