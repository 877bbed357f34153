//! Text report of a run, diffed against an optional previous run.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{DriverError, DriverResult};
use crate::output_dir::RESULTS_FILE;
use crate::results::{ResultRecord, TestStatus, load_results};

/// Current results compared with those of an older result directory.
#[derive(Debug, Clone, Default)]
pub struct ReportDiff {
    current: Vec<ResultRecord>,
    /// `None` when no old result dir was given.
    old: Option<Vec<ResultRecord>>,
}

impl ReportDiff {
    /// Load `<result_dir>/results` and, if given, `<old_result_dir>/results`.
    pub fn new(result_dir: &Path, old_result_dir: Option<&Path>) -> DriverResult<Self> {
        let current = load_results(&result_dir.join(RESULTS_FILE))?;
        let old = match old_result_dir {
            Some(dir) => Some(load_results(&dir.join(RESULTS_FILE))?),
            None => None,
        };
        Ok(Self::from_records(current, old))
    }

    pub fn from_records(current: Vec<ResultRecord>, old: Option<Vec<ResultRecord>>) -> Self {
        Self { current, old }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResultRecord> {
        self.current.iter().filter(|r| r.status.is_failure())
    }

    /// Number of tests per status, in [`TestStatus::ALL`] order, zero counts omitted.
    pub fn counts(&self) -> Vec<(TestStatus, usize)> {
        TestStatus::ALL
            .into_iter()
            .map(|st| (st, self.current.iter().filter(|r| r.status == st).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    /// Render the report. Empty when there is nothing to report on.
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        if !self.current.is_empty() {
            let mut summary = String::from("Summary\n");
            for (status, count) in self.counts() {
                let _ = writeln!(summary, "  {:<13}{}", status.as_str(), count);
            }
            let _ = writeln!(summary, "  {:<13}{}", "Total", self.current.len());
            sections.push(summary);

            let failures: Vec<String> = self.failures().map(describe).collect();
            push_section(&mut sections, "Failures", failures);
        }

        if let Some(old) = &self.old {
            self.push_comparison(&mut sections, old);
        }

        sections.join("\n")
    }

    fn push_comparison(&self, sections: &mut Vec<String>, old: &[ResultRecord]) {
        let current = by_name(&self.current);
        let old = by_name(old);

        let mut new_failures = Vec::new();
        let mut fixed = Vec::new();
        let mut changed = Vec::new();
        let mut added = Vec::new();

        for (name, now) in &current {
            let Some(before) = old.get(name) else {
                added.push(describe(now));
                continue;
            };
            if now.status == before.status {
                continue;
            }
            let line = format!("{} (was {})", describe(now), before.status);
            match (before.status.is_failure(), now.status.is_failure()) {
                (false, true) => new_failures.push(line),
                (true, false) => fixed.push(line),
                _ => changed.push(line),
            }
        }

        let removed: Vec<String> = old
            .iter()
            .filter(|(name, _)| !current.contains_key(*name))
            .map(|(name, before)| format!("{name} (was {})", before.status))
            .collect();

        push_section(sections, "New failures", new_failures);
        push_section(sections, "Fixed", fixed);
        push_section(sections, "Status changes", changed);
        push_section(sections, "New tests", added);
        push_section(sections, "Removed tests", removed);
    }

    /// Render into `path`.
    pub fn write_txt(&self, path: &Path) -> DriverResult<()> {
        fs::write(path, self.render()).map_err(|e| DriverError::io("cannot write", path, e))
    }
}

fn by_name(records: &[ResultRecord]) -> BTreeMap<&str, &ResultRecord> {
    records.iter().map(|r| (r.name.as_str(), r)).collect()
}

fn describe(record: &ResultRecord) -> String {
    match &record.message {
        Some(m) => format!("{}: {}: {}", record.name, record.status, m),
        None => format!("{}: {}", record.name, record.status),
    }
}

fn push_section(sections: &mut Vec<String>, title: &str, lines: Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let mut section = format!("{title}\n");
    for line in lines {
        let _ = writeln!(section, "  {line}");
    }
    sections.push(section);
}
