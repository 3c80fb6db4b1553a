//! Test result model and the per-suite result accumulator

use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::Result;

/// Terminal status of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Passed,
    Failed,
    Warning,
    Error,
    Skipped,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "PASSED"),
            TestStatus::Failed => write!(f, "FAILED"),
            TestStatus::Warning => write!(f, "WARNING"),
            TestStatus::Error => write!(f, "ERROR"),
            TestStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Outcome of one named test case, finalized exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

/// What a successful test body resolves to.
///
/// Failures are expressed by returning `Err` from the body; the recorder
/// classifies those as FAILED with the error text.
#[derive(Debug, Clone, Default)]
pub struct CaseOutcome {
    warn: Option<String>,
    details: Option<String>,
    screenshot: Option<PathBuf>,
}

impl CaseOutcome {
    /// Plain pass.
    pub fn pass() -> Self {
        Self::default()
    }

    /// Soft mismatch: recorded as WARNING, never flips the suite to FAILED.
    pub fn warn(reason: impl Into<String>) -> Self {
        Self {
            warn: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }
}

/// Ordered accumulator for one suite run.
///
/// Owned by the suite that created it and handed back to the orchestrator;
/// never a process-wide singleton, so two runs in one process cannot
/// contaminate each other.
#[derive(Debug)]
pub struct SuiteRecorder {
    suite: String,
    results: Vec<TestResult>,
    started: Instant,
}

impl SuiteRecorder {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            results: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn suite_name(&self) -> &str {
        &self.suite
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Run one test body to completion, time it, classify the outcome, and
    /// record exactly one result. A failing body never aborts the suite;
    /// the caller simply moves on to the next case.
    pub async fn run_case<Fut>(&mut self, name: impl Into<String>, body: Fut) -> &TestResult
    where
        Fut: Future<Output = Result<CaseOutcome>>,
    {
        let name = name.into();
        let start = Instant::now();
        let outcome = body.await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(out) => {
                let status = if out.warn.is_some() {
                    TestStatus::Warning
                } else {
                    TestStatus::Passed
                };
                match status {
                    TestStatus::Warning => warn!(
                        suite = %self.suite,
                        "⚠ {} ({} ms): {}",
                        name,
                        duration_ms,
                        out.warn.as_deref().unwrap_or("")
                    ),
                    _ => info!(suite = %self.suite, "✓ {} ({} ms)", name, duration_ms),
                }
                TestResult {
                    name,
                    status,
                    duration_ms,
                    error: None,
                    details: out.warn.or(out.details),
                    screenshot: out.screenshot,
                }
            }
            Err(e) => {
                error!(suite = %self.suite, "✗ {} ({} ms): {}", name, duration_ms, e);
                TestResult {
                    name,
                    status: TestStatus::Failed,
                    duration_ms,
                    error: Some(e.to_string()),
                    details: None,
                    screenshot: None,
                }
            }
        };

        self.results.push(result);
        self.results.last().expect("just pushed")
    }

    /// Record a case that was not attempted.
    pub fn record_skipped(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.results.push(TestResult {
            name: name.into(),
            status: TestStatus::Skipped,
            duration_ms: 0,
            error: None,
            details: Some(reason.into()),
            screenshot: None,
        });
    }

    /// Finalize into an immutable report.
    pub fn into_report(self) -> SuiteReport {
        let total_duration_ms = self.started.elapsed().as_millis() as u64;
        SuiteReport::from_results(&self.suite, &self.results, total_duration_ms)
    }
}

/// Aggregate over one suite's results, written once at suite completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub timestamp: String,
    pub total_duration_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub errors: usize,
    pub skipped: usize,
    pub summary: SuiteSummary,
    pub results: Vec<TestResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub success_rate_percent: f64,
    pub average_duration_ms: u64,
}

impl SuiteReport {
    /// Derive summary statistics from an immutable result list.
    ///
    /// Pure function of its input: calling it twice over the same list
    /// yields identical statistics.
    pub fn from_results(suite: &str, results: &[TestResult], total_duration_ms: u64) -> Self {
        let count = |s: TestStatus| results.iter().filter(|r| r.status == s).count();
        let passed = count(TestStatus::Passed);
        let failed = count(TestStatus::Failed);
        let warnings = count(TestStatus::Warning);
        let errors = count(TestStatus::Error);
        let skipped = count(TestStatus::Skipped);
        let total = results.len();

        let success_rate_percent = if total == 0 {
            0.0
        } else {
            (passed as f64 / total as f64) * 100.0
        };
        let average_duration_ms = if total == 0 {
            0
        } else {
            results.iter().map(|r| r.duration_ms).sum::<u64>() / total as u64
        };

        Self {
            suite: suite.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            total_duration_ms,
            total,
            passed,
            failed,
            warnings,
            errors,
            skipped,
            summary: SuiteSummary {
                success_rate_percent,
                average_duration_ms,
            },
            results: results.to_vec(),
        }
    }

    /// A suite passes when nothing failed or errored; warnings are surfaced
    /// for human review but do not flip the status.
    pub fn is_passing(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;

    fn result(name: &str, status: TestStatus, duration_ms: u64) -> TestResult {
        TestResult {
            name: name.to_string(),
            status,
            duration_ms,
            error: None,
            details: None,
            screenshot: None,
        }
    }

    #[tokio::test]
    async fn one_failing_case_does_not_suppress_siblings() {
        let mut rec = SuiteRecorder::new("isolation");

        rec.run_case("first", async { Ok(CaseOutcome::pass()) }).await;
        rec.run_case("second", async {
            Err(HarnessError::assertion("boom"))
        })
        .await;
        rec.run_case("third", async { Ok(CaseOutcome::pass()) }).await;

        let report = rec.into_report();
        assert_eq!(report.total, 3);
        assert_eq!(report.results[0].status, TestStatus::Passed);
        assert_eq!(report.results[1].status, TestStatus::Failed);
        assert_eq!(report.results[1].error.as_deref(), Some("assertion failed: boom"));
        assert_eq!(report.results[2].status, TestStatus::Passed);
    }

    #[tokio::test]
    async fn warning_outcome_does_not_fail_the_suite() {
        let mut rec = SuiteRecorder::new("warnings");
        rec.run_case("soft", async {
            Ok(CaseOutcome::warn("hamburger menu not found on desktop viewport"))
        })
        .await;

        let report = rec.into_report();
        assert!(report.is_passing());
        assert!(report.has_warnings());
        assert_eq!(report.results[0].status, TestStatus::Warning);
        assert!(report.results[0].details.as_deref().unwrap().contains("hamburger"));
    }

    #[test]
    fn summary_is_a_pure_function_of_the_result_list() {
        let results = vec![
            result("a", TestStatus::Passed, 100),
            result("b", TestStatus::Failed, 200),
            result("c", TestStatus::Passed, 300),
            result("d", TestStatus::Warning, 400),
        ];

        let first = SuiteReport::from_results("api", &results, 1000);
        let second = SuiteReport::from_results("api", &results, 1000);

        assert_eq!(first.passed, 2);
        assert_eq!(first.failed, 1);
        assert_eq!(first.warnings, 1);
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.summary.success_rate_percent, 50.0);
        assert_eq!(first.summary.average_duration_ms, 250);
    }

    #[test]
    fn empty_suite_reports_zero_rate_without_dividing() {
        let report = SuiteReport::from_results("empty", &[], 0);
        assert_eq!(report.total, 0);
        assert_eq!(report.summary.success_rate_percent, 0.0);
        assert_eq!(report.summary.average_duration_ms, 0);
    }
}
