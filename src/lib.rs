#![forbid(unsafe_code)]
//! Regression testsuite driver
//!
//! Discovers test directories under `tests/`, runs one `run-test` subprocess per test
//! with the platform discriminants, collects each outcome into a `results` file and
//! renders a text report diffed against an optional previous run.
//!
//! ## Pipeline
//!
//! 1. [`cli`] parses options into a [`config::Config`].
//! 2. [`discovery`] expands `tests/*` and applies the single-test filter.
//! 3. [`output_dir`] clears artifacts left by the previous run.
//! 4. [`runner`] launches the tests on a bounded pool.
//! 5. [`results`] records each outcome as it arrives.
//! 6. [`report`] writes `discs` and `report`.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod discs;
pub mod error;
pub mod output_dir;
pub mod report;
pub mod results;
pub mod runner;
pub mod version;

pub use config::{BuildEnv, Config};
pub use discovery::{FsTestDiscovery, TestDescriptor, TestDiscovery, filter_list};
pub use discs::{Discriminants, TargetInfo};
pub use error::{DriverError, DriverResult};
pub use output_dir::prepare_output_dir;
pub use report::ReportDiff;
pub use results::{ResultCollector, ResultRecord, TestStatus};
pub use runner::{MainLoop, ProcessExecutor, ProcessOutcome, RunTestCommand, TestExecutor};
