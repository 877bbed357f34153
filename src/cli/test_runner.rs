//! Testsuite run orchestration
//!
//! Discover → clean the output dir → run every test on the bounded pool → collect →
//! write `discs` and `report`.
//!
//! ## TestReporter Trait
//!
//! Console output goes through the `TestReporter` trait so progress reporting stays separate
//! from execution. Custom output formats implement the trait.
//!
//! ## I/O Boundaries
//!
//! Discovery and execution are injected (`TestDiscovery`, `TestExecutor`) so the whole
//! pipeline can run against a fixed test list or a fake `run-test`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::discovery::{FsTestDiscovery, TestDiscovery};
use crate::error::{DriverError, DriverResult};
use crate::output_dir::prepare_output_dir;
use crate::report::ReportDiff;
use crate::results::{ResultCollector, ResultRecord};
use crate::runner::{MainLoop, ProcessExecutor, TestExecutor};

use super::{CliResult, ExitCode};

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting testsuite progress.
pub trait TestReporter {
    /// Called when test discovery begins
    fn on_discovery_start(&mut self, _root: &Path) {}

    /// Called when test collection is complete
    fn on_collection_complete(&mut self, test_count: usize);

    /// Called as each test's result is recorded
    fn on_test_complete(&mut self, record: &ResultRecord);

    /// Called with the `.diff` content of a test when `--diffs` is on
    fn on_diff(&mut self, _record: &ResultRecord, _diff: &str) {}

    /// Called once the report has been written
    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// Summary of a testsuite run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Default console reporter
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, test_count: usize) {
        if test_count == 0 {
            eprintln!("No tests collected");
        } else {
            tracing::info!("collected {test_count} test(s)");
        }
    }

    fn on_test_complete(&mut self, record: &ResultRecord) {
        let status = if record.status.is_failure() {
            format!("\x1b[31m{}\x1b[0m", record.status)
        } else {
            format!("\x1b[32m{}\x1b[0m", record.status)
        };
        match &record.message {
            Some(msg) => println!("{:<60} {} {}", record.name, status, msg),
            None => println!("{:<60} {}", record.name, status),
        }

        // Print run-test's own output for failures
        if self.verbose && record.status.is_failure() && !record.output.trim().is_empty() {
            println!("{}", record.output.trim_end());
        }
    }

    fn on_diff(&mut self, _record: &ResultRecord, diff: &str) {
        println!("{}", diff.trim_end());
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("\x1b[32m{} passed\x1b[0m", summary.passed));
        }
        if summary.failed > 0 {
            parts.push(format!("\x1b[31m{} failed\x1b[0m", summary.failed));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        eprintln!(
            "====== {} in {:.2}s ======",
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

// ============================================================================
// Orchestration
// ============================================================================

/// Run the testsuite described by `config` with real `run-test` subprocesses.
///
/// Individual test failures do not make this fail: they are in the report.
pub fn run_testsuite(config: Config) -> CliResult<ExitCode> {
    if !config.run_test.is_empty() {
        // User wants to run only one test
        println!("Running only test '{}'", config.run_test);
    }

    let mut reporter = ConsoleReporter::new(config.verbose);
    let config = Arc::new(config);
    let executor = Arc::new(ProcessExecutor::new(Arc::clone(&config)));

    run_testsuite_with(&config, &FsTestDiscovery, executor, &mut reporter)?;
    Ok(ExitCode::SUCCESS)
}

/// Full pipeline with injected discovery, executor and reporter.
///
/// Owns a tokio runtime for the duration of the run, so it must not be called from inside
/// one.
#[tracing::instrument(skip_all, fields(output_dir = %config.output_dir.display(), jobs = config.jobs))]
pub fn run_testsuite_with<D, E, R>(
    config: &Config,
    discovery: &D,
    executor: Arc<E>,
    reporter: &mut R,
) -> DriverResult<TestSummary>
where
    D: TestDiscovery,
    E: TestExecutor,
    R: TestReporter,
{
    let start_time = Instant::now();

    reporter.on_discovery_start(&config.tests_dir);
    let tests = discovery.discover(&config.tests_dir, &config.run_test);
    reporter.on_collection_complete(tests.len());

    prepare_output_dir(&config.output_dir)?;

    let main_loop = MainLoop::new(config.jobs)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(main_loop.jobs().clamp(1, 16))
        .enable_all()
        .build()
        .map_err(DriverError::Runtime)?;

    let mut collector = ResultCollector::new(&config.output_dir);
    let mut passed = 0;
    let mut failed = 0;

    runtime.block_on(main_loop.run(tests, executor, |test, outcome| {
        let record = collector.collect(test, outcome)?;
        if record.status.is_failure() {
            failed += 1;
        } else {
            passed += 1;
        }
        reporter.on_test_complete(&record);

        if config.view_diffs {
            if let Some(diff) = collector.diff_for(&record.name) {
                reporter.on_diff(&record, &diff);
            }
        }
        Ok(())
    }))?;

    write_report(config)?;

    let summary = TestSummary {
        total: collector.collected(),
        passed,
        failed,
        duration: start_time.elapsed(),
    };
    tracing::info!(
        total = summary.total,
        failed = summary.failed,
        "report written to {}",
        config.report_file().display()
    );
    reporter.on_run_complete(&summary);
    Ok(summary)
}

/// Write `discs` and the `report` diffed against `--old-result-dir`.
fn write_report(config: &Config) -> DriverResult<()> {
    let discs_file = config.discs_file();
    fs::write(&discs_file, config.discs.space_joined()).map_err(|e| DriverError::io("cannot write", &discs_file, e))?;

    ReportDiff::new(&config.output_dir, config.old_result_dir.as_deref())?.write_txt(&config.report_file())
}
