//! Test outcomes and the `results` file.
//!
//! `run-test` writes `<output-dir>/<name>.result` whose first line is `STATUS[:message]`.
//! The collector turns that (or, when it is missing, the exit status of the process) into a
//! [`ResultRecord`] and appends `name:STATUS[:message]` to `<output-dir>/results`.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::discovery::TestDescriptor;
use crate::error::{DriverError, DriverResult};
use crate::output_dir::RESULTS_FILE;
use crate::runner::ProcessOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestStatus {
    Ok,
    /// Expected failure that failed.
    XFail,
    /// Expected failure that passed.
    UOk,
    Diff,
    Failed,
    Crash,
    Dead,
    Problem,
    InvalidTest,
}

impl TestStatus {
    pub const ALL: [TestStatus; 9] = [
        TestStatus::Ok,
        TestStatus::XFail,
        TestStatus::UOk,
        TestStatus::Diff,
        TestStatus::Failed,
        TestStatus::Crash,
        TestStatus::Dead,
        TestStatus::Problem,
        TestStatus::InvalidTest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Ok => "OK",
            TestStatus::XFail => "XFAIL",
            TestStatus::UOk => "UOK",
            TestStatus::Diff => "DIFF",
            TestStatus::Failed => "FAILED",
            TestStatus::Crash => "CRASH",
            TestStatus::Dead => "DEAD",
            TestStatus::Problem => "PROBLEM",
            TestStatus::InvalidTest => "INVALID_TEST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|st| st.as_str().eq_ignore_ascii_case(s))
    }

    pub fn is_failure(self) -> bool {
        !matches!(self, TestStatus::Ok | TestStatus::XFail)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Separator between the name, status and message of a `results` line.
pub const FIELD_SEPARATOR: char = ':';

/// Recorded outcome of one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub name: String,
    pub status: TestStatus,
    pub message: Option<String>,
    /// `None` for records read back from a results file, or when the process was killed.
    pub exit_code: Option<i32>,
    /// Captured stdout + stderr of `run-test`.
    pub output: String,
}

impl ResultRecord {
    pub fn new(name: impl Into<String>, status: TestStatus, message: Option<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.filter(|m| !m.is_empty()),
            exit_code: None,
            output: String::new(),
        }
    }

    /// Parse the `STATUS[:message]` body of a `.result` file or results line.
    ///
    /// Unknown statuses become `PROBLEM` with the raw text as the message.
    pub fn from_status_text(name: impl Into<String>, text: &str) -> Self {
        let text = text.trim();
        let (status, message) = match text.split_once(FIELD_SEPARATOR) {
            Some((status, message)) => (status, Some(message.trim().to_string())),
            None => (text, None),
        };
        match TestStatus::parse(status) {
            Some(status) => Self::new(name, status, message),
            None => Self::new(name, TestStatus::Problem, Some(format!("unknown status: {text}"))),
        }
    }

    /// One line of the `results` file, without the newline.
    pub fn to_line(&self) -> String {
        match &self.message {
            Some(m) => format!("{}:{}:{}", self.name, self.status, m.replace('\n', " ")),
            None => format!("{}:{}", self.name, self.status),
        }
    }

    pub fn from_line(line: &str) -> Option<Self> {
        let (name, rest) = line.split_once(FIELD_SEPARATOR)?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::from_status_text(name, rest))
    }
}

/// Read every record of a `results` file. A missing file is an empty result set.
pub fn load_results(path: &Path) -> DriverResult<Vec<ResultRecord>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(DriverError::io("cannot read", path, e)),
    };
    Ok(text.lines().filter_map(ResultRecord::from_line).collect())
}

/// Single writer of the `results` file.
pub struct ResultCollector {
    output_dir: PathBuf,
    results_file: PathBuf,
    collected: usize,
}

impl ResultCollector {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let results_file = output_dir.join(RESULTS_FILE);
        Self {
            output_dir,
            results_file,
            collected: 0,
        }
    }

    pub fn results_file(&self) -> &Path {
        &self.results_file
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    /// Record the outcome of `test` and append it to the results file.
    pub fn collect(&mut self, test: &TestDescriptor, outcome: ProcessOutcome) -> DriverResult<ResultRecord> {
        let name = test.name();
        let mut record = match self.read_result_file(&name) {
            Some(text) => ResultRecord::from_status_text(&name, &text),
            None => crash_record(&name, &outcome),
        };
        if let ProcessOutcome::Exited { code, output } = outcome {
            record.exit_code = code;
            record.output = output;
        }

        self.append(&record)?;
        self.collected += 1;
        Ok(record)
    }

    /// Content of `<name>.diff`, if `run-test` produced one.
    pub fn diff_for(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.output_dir.join(format!("{name}.diff"))).ok()
    }

    fn read_result_file(&self, name: &str) -> Option<String> {
        let text = fs::read_to_string(self.output_dir.join(format!("{name}.result"))).ok()?;
        let first = text.lines().next()?.trim();
        (!first.is_empty()).then(|| first.to_string())
    }

    fn append(&self, record: &ResultRecord) -> DriverResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.results_file)
            .map_err(|e| DriverError::io("cannot open", &self.results_file, e))?;
        writeln!(file, "{}", record.to_line()).map_err(|e| DriverError::io("cannot write", &self.results_file, e))
    }
}

fn crash_record(name: &str, outcome: &ProcessOutcome) -> ResultRecord {
    let message = match outcome {
        ProcessOutcome::Exited { code: Some(0), .. } => "cannot read result file".to_string(),
        ProcessOutcome::Exited { code: Some(code), .. } => format!("process exited with status {code}"),
        ProcessOutcome::Exited { code: None, .. } => "process killed by signal".to_string(),
        ProcessOutcome::LaunchFailed(err) => err.clone(),
    };
    tracing::warn!(test = %name, "no result file: {message}");
    ResultRecord::new(name, TestStatus::Crash, Some(message))
}
