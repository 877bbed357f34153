//! CLI module for the testsuite driver
//!
//! ```text
//! testsuite [options] [test name]
//! ```
//!
//! Runs every test directory under `tests/` (or only those whose path contains the given
//! test name) through `run-test`, then writes `results`, `discs` and `report` into the output
//! directory.
//!
//! ## Modules
//!
//! - `test_runner` - Run orchestration and console reporting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod test_runner;

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::config::{BuildEnv, Config};
use crate::discs::{Discriminants, resolve_target, split_user_discs};
use crate::error::{DriverError, DriverResult};
use crate::version::DRIVER_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Fatal driver errors surface as a single `ERROR:` line.
impl From<DriverError> for CliError {
    fn from(err: DriverError) -> Self {
        CliError::failure(format!("ERROR: {err}"))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run the regression testsuite
#[derive(Parser, Debug)]
#[command(name = "testsuite")]
#[command(version = DRIVER_VERSION)]
#[command(about = "Run the regression testsuite", long_about = None)]
pub struct Cli {
    /// Run only the tests whose path contains this string
    #[arg(value_name = "TEST")]
    pub run_test: Option<String>,

    /// Comma-separated list of extra discriminants
    #[arg(short = 'd', long = "discriminants", value_name = "LIST")]
    pub discs: Option<String>,

    /// Directory receiving results, report and per-test artifacts
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Temporary directory passed to run-test (default: system temp dir)
    #[arg(short = 't', long = "tmp", value_name = "DIR")]
    pub tmp: Option<PathBuf>,

    /// Host triplet, forwarded to run-test
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Target triplet, forwarded to run-test and used for the platform discriminants
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Keep run-test temporary files
    #[arg(long = "disable-cleanup")]
    pub disable_cleanup: bool,

    /// Print .diff content as results arrive
    #[arg(long = "diffs")]
    pub view_diffs: bool,

    /// Previous result directory to diff the report against
    #[arg(long = "old-result-dir", value_name = "DIR")]
    pub old_result_dir: Option<PathBuf>,

    /// Number of tests to run in parallel
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = 1, value_parser = parse_jobs)]
    pub jobs: usize,

    /// Directory whose subdirectories are the tests
    #[arg(long = "tests-dir", value_name = "DIR", default_value = "tests")]
    pub tests_dir: PathBuf,

    /// Per-test driver program
    #[arg(long = "run-test", value_name = "PROGRAM", default_value = "run-test")]
    pub run_test_program: PathBuf,
}

fn parse_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    /// Resolve defaults and build the run configuration.
    pub fn into_config(self) -> DriverResult<Config> {
        let target = resolve_target(self.target.as_deref());
        let user_discs = self.discs.as_deref().map(split_user_discs).unwrap_or_default();
        let cwd = env::current_dir().map_err(|e| DriverError::io("cannot read", ".", e))?;

        Ok(Config {
            discs: Discriminants::new(&target, &user_discs),
            output_dir: self.output_dir,
            tmp_dir: self.tmp.unwrap_or_else(env::temp_dir),
            host: self.host,
            target: self.target,
            verbose: self.verbose,
            enable_cleanup: !self.disable_cleanup,
            view_diffs: self.view_diffs,
            run_test: self.run_test.unwrap_or_default(),
            jobs: self.jobs,
            old_result_dir: self.old_result_dir,
            tests_dir: self.tests_dir,
            run_test_program: self.run_test_program,
            build_env: BuildEnv::from_env(&cwd),
        })
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.into_config()?;
    test_runner::run_testsuite(config)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["testsuite"]).unwrap();
        assert_eq!(cli.run_test, None);
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert_eq!(cli.jobs, 1);
        assert_eq!(cli.tests_dir, PathBuf::from("tests"));
        assert_eq!(cli.run_test_program, PathBuf::from("run-test"));
        assert!(!cli.verbose && !cli.disable_cleanup && !cli.view_diffs);
    }

    #[test]
    fn test_cli_parse_all_options() {
        let cli = Cli::try_parse_from([
            "testsuite",
            "-d",
            "fast,gpl",
            "-o",
            "out",
            "-t",
            "/tmp/x",
            "--host=x86_64-linux",
            "--target",
            "aarch64-unknown-linux-gnu",
            "-v",
            "--disable-cleanup",
            "--diffs",
            "--old-result-dir=old",
            "-j",
            "8",
            "smoke",
        ])
        .unwrap();

        assert_eq!(cli.run_test.as_deref(), Some("smoke"));
        assert_eq!(cli.discs.as_deref(), Some("fast,gpl"));
        assert_eq!(cli.tmp, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.host.as_deref(), Some("x86_64-linux"));
        assert!(cli.verbose && cli.disable_cleanup && cli.view_diffs);
        assert_eq!(cli.old_result_dir, Some(PathBuf::from("old")));
        assert_eq!(cli.jobs, 8);

        let config = cli.into_config().unwrap();
        assert_eq!(
            config.discs.as_slice(),
            ["ALL", "aarch64-linux", "aarch64-unknown-linux-gnu", "fast", "gpl"]
        );
        assert!(!config.enable_cleanup);
        assert_eq!(config.run_test, "smoke");
    }

    #[test]
    fn test_cli_rejects_zero_jobs() {
        assert!(Cli::try_parse_from(["testsuite", "-j", "0"]).is_err());
        assert!(Cli::try_parse_from(["testsuite", "-j", "many"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["testsuite", "--frobnicate"]).is_err());
    }

    #[test]
    fn test_gnat_target_is_kept_verbatim() {
        let cli = Cli::try_parse_from(["testsuite", "--target=x86-linux"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.target.as_deref(), Some("x86-linux"));
        assert_eq!(config.discs.as_slice(), ["ALL", "x86-linux"]);
    }

    #[test]
    fn test_uncreatable_output_dir_is_fatal_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let out = blocker.join("out");

        let args: Vec<std::ffi::OsString> = vec![
            "testsuite".into(),
            "-o".into(),
            out.into_os_string(),
            "--tests-dir".into(),
            tmp.path().join("tests").into_os_string(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let err = execute(cli).unwrap_err();
        assert!(err.message.starts_with("ERROR: cannot create"), "{}", err.message);
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }

    #[test]
    fn test_default_tmp_is_system_temp() {
        let config = Cli::try_parse_from(["testsuite"]).unwrap().into_config().unwrap();
        assert_eq!(config.tmp_dir, env::temp_dir());
        assert!(config.enable_cleanup);
    }
}
