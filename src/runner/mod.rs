//! Per-test runner.
//!
//! Every test runs in its own `run-test` subprocess:
//!
//! ```text
//! run-test -d <discs> -o <output-dir> -t <tmp-dir> <test-path> [-v] [--host=H] [--target=T] [--disable-cleanup]
//! ```
//!
//! Launching goes through the [`TestExecutor`] trait so the [`MainLoop`] pool can be driven
//! by something other than real processes. [`ProcessExecutor`] is the default.

mod main_loop;

pub use main_loop::MainLoop;

use std::env;
use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::config::Config;
use crate::discovery::TestDescriptor;
use crate::error::DriverError;

/// How a `run-test` subprocess ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process ran. `code` is `None` when it was killed by a signal.
    Exited { code: Option<i32>, output: String },
    /// The process could not be started.
    LaunchFailed(String),
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ProcessOutcome::Exited { code: Some(0), .. })
    }
}

/// Fully built `run-test` invocation for one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTestCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl RunTestCommand {
    pub fn for_test(config: &Config, test: &TestDescriptor) -> Self {
        let mut args: Vec<OsString> = vec![
            "-d".into(),
            config.discs.comma_joined().into(),
            "-o".into(),
            config.output_dir.clone().into_os_string(),
            "-t".into(),
            config.tmp_dir.clone().into_os_string(),
            test.path.clone().into_os_string(),
        ];
        if config.verbose {
            args.push("-v".into());
        }
        if let Some(host) = &config.host {
            args.push(format!("--host={host}").into());
        }
        if let Some(target) = &config.target {
            args.push(format!("--target={target}").into());
        }
        if !config.enable_cleanup {
            args.push("--disable-cleanup".into());
        }

        Self {
            program: config.run_test_program.clone(),
            args,
        }
    }

    /// Space-joined rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(OsStr::to_string_lossy)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Launch one test and wait for it.
///
/// A failure to launch is reported through [`ProcessOutcome::LaunchFailed`], never as an
/// error: it belongs to that test's result.
pub trait TestExecutor: Send + Sync + 'static {
    fn execute(&self, test: &TestDescriptor) -> impl Future<Output = ProcessOutcome> + Send;
}

/// Runs `run-test` as a real subprocess with captured output.
pub struct ProcessExecutor {
    config: Arc<Config>,
    /// `PATH` for the children: the driver's own plus the build search dirs.
    path_env: OsString,
}

impl ProcessExecutor {
    pub fn new(config: Arc<Config>) -> Self {
        let path_env = config.build_env.extend_path(env::var_os("PATH"));
        Self { config, path_env }
    }
}

impl TestExecutor for ProcessExecutor {
    async fn execute(&self, test: &TestDescriptor) -> ProcessOutcome {
        let cmd = RunTestCommand::for_test(&self.config, test);
        tracing::debug!("{}", cmd.command_line());

        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .env("PATH", &self.path_env)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                ProcessOutcome::Exited {
                    code: output.status.code(),
                    output: format!("{stdout}{stderr}"),
                }
            }
            Err(source) => {
                let err = DriverError::Spawn {
                    program: cmd.program.to_string_lossy().into_owned(),
                    source,
                };
                tracing::warn!(test = %test.name(), "{err}");
                ProcessOutcome::LaunchFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::config::BuildEnv;
    use crate::discs::{Discriminants, resolve_target};
    use std::path::Path;

    pub(crate) fn sample_config() -> Config {
        let target = resolve_target(Some("x86_64-unknown-linux-gnu"));
        Config {
            discs: Discriminants::new(&target, &["fast".to_string()]),
            output_dir: PathBuf::from("out"),
            tmp_dir: PathBuf::from("/tmp/rt"),
            host: None,
            target: None,
            verbose: false,
            enable_cleanup: true,
            view_diffs: false,
            run_test: String::new(),
            jobs: 1,
            old_result_dir: None,
            tests_dir: PathBuf::from("tests"),
            run_test_program: PathBuf::from("run-test"),
            build_env: BuildEnv::new(Path::new("/w"), None, None),
        }
    }

    fn args(cmd: &RunTestCommand) -> Vec<String> {
        cmd.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn minimal_command_line() {
        let cmd = RunTestCommand::for_test(&sample_config(), &TestDescriptor::new("tests/t1"));
        assert_eq!(cmd.program, PathBuf::from("run-test"));
        assert_eq!(
            args(&cmd),
            [
                "-d",
                "ALL,x86_64-linux,x86_64-unknown-linux-gnu,fast",
                "-o",
                "out",
                "-t",
                "/tmp/rt",
                "tests/t1"
            ]
        );
    }

    #[test]
    fn optional_flags_follow_the_test_path() {
        let mut config = sample_config();
        config.verbose = true;
        config.host = Some("x86_64-linux".to_string());
        config.target = Some("arm-elf".to_string());
        config.enable_cleanup = false;

        let cmd = RunTestCommand::for_test(&config, &TestDescriptor::new("tests/t1"));
        assert_eq!(
            &args(&cmd)[6..],
            ["tests/t1", "-v", "--host=x86_64-linux", "--target=arm-elf", "--disable-cleanup"]
        );
        assert!(cmd.command_line().starts_with("run-test -d ALL,"));
    }

    #[test]
    fn outcome_success_only_on_zero_exit() {
        let ok = ProcessOutcome::Exited { code: Some(0), output: String::new() };
        let failed = ProcessOutcome::Exited { code: Some(1), output: String::new() };
        let killed = ProcessOutcome::Exited { code: None, output: String::new() };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
        assert!(!ProcessOutcome::LaunchFailed("x".into()).success());
    }

    #[tokio::test]
    async fn missing_program_is_a_launch_failure() {
        let mut config = sample_config();
        config.run_test_program = PathBuf::from("/definitely/not/here/run-test");
        let executor = ProcessExecutor::new(Arc::new(config));
        let outcome = executor.execute(&TestDescriptor::new("tests/t1")).await;
        assert!(matches!(outcome, ProcessOutcome::LaunchFailed(msg) if msg.contains("failed to launch")));
    }
}
