//! Report generator
//!
//! Writes one timestamped JSON artifact per suite plus the consolidated
//! roll-up, returning paths so the orchestrator can cross-reference them.
//! Summary statistics are derived in `givebridge_common::SuiteReport` as a
//! pure function of the result list; this module only persists.

use std::path::{Path, PathBuf};

use tracing::info;

use givebridge_common::{ConsolidatedReport, HarnessError, Result, SuiteReport};

pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Persist one suite's report. Never mutates its input.
    pub fn write_suite(&self, report: &SuiteReport) -> Result<PathBuf> {
        let filename = format!("{}-report-{}.json", report.suite, timestamp_slug());
        self.write_json(&filename, report)
    }

    /// Persist the consolidated roll-up for one orchestrator run.
    pub fn write_consolidated(&self, report: &ConsolidatedReport) -> Result<PathBuf> {
        let filename = format!("consolidated-report-{}.json", timestamp_slug());
        self.write_json(&filename, report)
    }

    fn write_json<T: serde::Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.report_dir).map_err(|e| {
            HarnessError::ReportWrite(format!(
                "cannot create {}: {e}",
                self.report_dir.display()
            ))
        })?;

        let path = self.report_dir.join(filename);
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json)
            .map_err(|e| HarnessError::ReportWrite(format!("cannot write {}: {e}", path.display())))?;

        info!("report written: {}", path.display());
        Ok(path)
    }
}

fn timestamp_slug() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%S%3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use givebridge_common::{TestResult, TestStatus};

    fn sample_report() -> SuiteReport {
        let results = vec![
            TestResult {
                name: "a".into(),
                status: TestStatus::Passed,
                duration_ms: 10,
                error: None,
                details: None,
                screenshot: None,
            },
            TestResult {
                name: "b".into(),
                status: TestStatus::Failed,
                duration_ms: 30,
                error: Some("boom".into()),
                details: None,
                screenshot: None,
            },
        ];
        SuiteReport::from_results("api", &results, 40)
    }

    #[test]
    fn written_report_round_trips_with_identical_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let report = sample_report();

        let path = writer.write_suite(&report).unwrap();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("api-report-"));

        let loaded: SuiteReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.total, report.total);
        assert_eq!(loaded.passed, report.passed);
        assert_eq!(loaded.failed, report.failed);
        assert_eq!(loaded.summary, report.summary);
    }

    #[test]
    fn unwritable_directory_is_a_named_report_error() {
        let writer = ReportWriter::new("/dev/null/not-a-dir");
        let err = writer.write_suite(&sample_report()).unwrap_err();
        assert!(err.to_string().contains("report write failed"));
    }
}
