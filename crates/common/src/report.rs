//! Consolidated run report: the orchestrator's roll-up over every suite

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::SuiteReport;

/// Orchestrator-level status of one scheduled suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuiteStatus {
    NotRun,
    Running,
    Passed,
    Failed,
    Warning,
    Skipped,
}

impl std::fmt::Display for SuiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuiteStatus::NotRun => write!(f, "NOT_RUN"),
            SuiteStatus::Running => write!(f, "RUNNING"),
            SuiteStatus::Passed => write!(f, "PASSED"),
            SuiteStatus::Failed => write!(f, "FAILED"),
            SuiteStatus::Warning => write!(f, "WARNING"),
            SuiteStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Per-suite detail in the consolidated report.
///
/// A suite whose own orchestration crashed before producing a report (a
/// structural failure, e.g. the browser never launched) carries the raw
/// error string instead of a `SuiteReport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuiteDetail {
    Report(SuiteReport),
    Crashed { error: String },
}

/// Roll-up of one full orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    pub timestamp: String,
    pub overall: SuiteStatus,
    /// True when any suite recorded warnings. Warnings never change
    /// `overall`; they are flagged here and per suite in `summary`.
    #[serde(default)]
    pub has_warnings: bool,
    /// Every scheduled suite has exactly one entry here, crashed or not.
    pub summary: BTreeMap<String, SuiteStatus>,
    pub details: BTreeMap<String, SuiteDetail>,
}

impl ConsolidatedReport {
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            overall: SuiteStatus::NotRun,
            has_warnings: false,
            summary: BTreeMap::new(),
            details: BTreeMap::new(),
        }
    }

    /// Mark a suite scheduled but not yet (or never) run.
    pub fn schedule(&mut self, suite: &str) {
        self.summary.insert(suite.to_string(), SuiteStatus::NotRun);
    }

    pub fn record_report(&mut self, suite: &str, report: SuiteReport) {
        let status = if !report.is_passing() {
            SuiteStatus::Failed
        } else if report.has_warnings() {
            SuiteStatus::Warning
        } else {
            SuiteStatus::Passed
        };
        self.summary.insert(suite.to_string(), status);
        self.details
            .insert(suite.to_string(), SuiteDetail::Report(report));
    }

    pub fn record_crash(&mut self, suite: &str, error: String) {
        self.summary.insert(suite.to_string(), SuiteStatus::Failed);
        self.details
            .insert(suite.to_string(), SuiteDetail::Crashed { error });
    }

    pub fn record_skipped(&mut self, suite: &str) {
        self.summary.insert(suite.to_string(), SuiteStatus::Skipped);
    }

    /// Overall state: FAILED if any suite failed, PASSED otherwise.
    /// Warnings set `has_warnings` but never demote a passing run.
    pub fn finalize(&mut self) -> SuiteStatus {
        let any_failed = self.summary.values().any(|s| *s == SuiteStatus::Failed);
        self.has_warnings = self
            .summary
            .values()
            .any(|s| *s == SuiteStatus::Warning);
        self.overall = if any_failed {
            SuiteStatus::Failed
        } else {
            SuiteStatus::Passed
        };
        self.overall
    }
}

impl Default for ConsolidatedReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{SuiteReport, TestResult, TestStatus};

    fn passing_report(suite: &str) -> SuiteReport {
        let results = vec![TestResult {
            name: "ok".into(),
            status: TestStatus::Passed,
            duration_ms: 1,
            error: None,
            details: None,
            screenshot: None,
        }];
        SuiteReport::from_results(suite, &results, 1)
    }

    #[test]
    fn scheduled_but_crashed_suite_keeps_exactly_one_summary_entry() {
        let mut report = ConsolidatedReport::new();
        report.schedule("api");
        report.schedule("e2e");
        report.record_report("api", passing_report("api"));
        report.record_crash("e2e", "browser failed to launch".into());

        assert_eq!(report.summary.len(), 2);
        assert_eq!(report.summary["api"], SuiteStatus::Passed);
        assert_eq!(report.summary["e2e"], SuiteStatus::Failed);
        match &report.details["e2e"] {
            SuiteDetail::Crashed { error } => assert!(error.contains("launch")),
            SuiteDetail::Report(_) => panic!("expected crashed detail"),
        }
        assert_eq!(report.finalize(), SuiteStatus::Failed);
    }

    #[test]
    fn warning_only_run_still_finalizes_passed() {
        let mut report = ConsolidatedReport::new();
        let results = vec![TestResult {
            name: "soft".into(),
            status: TestStatus::Warning,
            duration_ms: 1,
            error: None,
            details: Some("optional affordance missing".into()),
            screenshot: None,
        }];
        report.record_report("compat", SuiteReport::from_results("compat", &results, 1));
        report.record_report("api", passing_report("api"));

        assert_eq!(report.finalize(), SuiteStatus::Passed);
        assert!(report.has_warnings);
        assert_eq!(report.summary["compat"], SuiteStatus::Warning);
    }

    #[test]
    fn failure_outranks_warnings_in_the_overall() {
        let mut report = ConsolidatedReport::new();
        report.record_crash("e2e", "browser failed to launch".into());
        let results = vec![TestResult {
            name: "soft".into(),
            status: TestStatus::Warning,
            duration_ms: 1,
            error: None,
            details: None,
            screenshot: None,
        }];
        report.record_report("compat", SuiteReport::from_results("compat", &results, 1));

        assert_eq!(report.finalize(), SuiteStatus::Failed);
        assert!(report.has_warnings);
    }
}
