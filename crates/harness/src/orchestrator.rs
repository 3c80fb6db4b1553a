//! Top-level orchestrator
//!
//! Sequences the suites in a fixed order behind the environment gate and
//! produces the consolidated report. Suites run strictly one after another
//! so a run never races the backend against itself.

use std::path::PathBuf;

use tracing::{error, info};

use givebridge_common::{
    ConsolidatedReport, HarnessConfig, HarnessError, Result, SuiteReport, SuiteStatus,
};

use crate::report::ReportWriter;
use crate::{api, probe, suites};

/// Pseudo-suite key used in the consolidated report when the environment
/// gate itself fails.
pub const ENVIRONMENT_KEY: &str = "environment";

/// Which suites to run; all on by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuitePlan {
    pub skip_api: bool,
    pub skip_integration: bool,
    pub skip_e2e: bool,
    pub skip_crossbrowser: bool,
    pub skip_performance: bool,
    pub skip_security: bool,
}

impl SuitePlan {
    fn skips(&self, suite: &str) -> bool {
        match suite {
            api::SUITE_NAME => self.skip_api,
            suites::integration::SUITE_NAME => self.skip_integration,
            suites::journey::SUITE_NAME => self.skip_e2e,
            suites::compat::SUITE_NAME => self.skip_crossbrowser,
            suites::perf::SUITE_NAME => self.skip_performance,
            suites::security::SUITE_NAME => self.skip_security,
            _ => false,
        }
    }
}

/// Fixed execution order. The API suite runs first so backend breakage is
/// reported before any browser time is spent on it.
pub const SUITE_ORDER: &[&str] = &[
    api::SUITE_NAME,
    suites::integration::SUITE_NAME,
    suites::journey::SUITE_NAME,
    suites::compat::SUITE_NAME,
    suites::perf::SUITE_NAME,
    suites::security::SUITE_NAME,
];

/// What one full run produced
#[derive(Debug)]
pub struct RunSummary {
    pub overall: SuiteStatus,
    pub consolidated: ConsolidatedReport,
    pub consolidated_path: Option<PathBuf>,
}

impl RunSummary {
    /// The sole externally observable contract for CI integration.
    pub fn exit_code(&self) -> i32 {
        match self.overall {
            SuiteStatus::Failed => 1,
            _ => 0,
        }
    }
}

pub struct Orchestrator {
    config: HarnessConfig,
    writer: ReportWriter,
}

impl Orchestrator {
    pub fn new(config: HarnessConfig) -> Self {
        let writer = ReportWriter::new(config.report_dir.clone());
        Self { config, writer }
    }

    pub async fn run(&self, plan: &SuitePlan) -> Result<RunSummary> {
        let mut consolidated = ConsolidatedReport::new();

        for &suite in SUITE_ORDER {
            if plan.skips(suite) {
                consolidated.record_skipped(suite);
            } else {
                consolidated.schedule(suite);
            }
        }

        // Fail-fast gate: no suite runs against a partially-up stack
        if let Err(e) = probe::check_servers(&self.config).await {
            error!("environment gate failed: {e}");
            consolidated.record_crash(ENVIRONMENT_KEY, e.to_string());
            consolidated.finalize();
            let path = self.write_consolidated(&consolidated);
            return Ok(RunSummary {
                overall: consolidated.overall,
                consolidated,
                consolidated_path: path,
            });
        }

        for &suite in SUITE_ORDER {
            if plan.skips(suite) {
                info!("suite {suite}: skipped by flag");
                continue;
            }

            info!("suite {suite}: running");
            consolidated
                .summary
                .insert(suite.to_string(), SuiteStatus::Running);

            // Structural failures stop at this boundary; later suites
            // still run.
            match self.run_one(suite).await {
                Ok(report) => match self.writer.write_suite(&report) {
                    Ok(path) => {
                        info!(
                            "suite {suite}: {}/{} passed ({})",
                            report.passed,
                            report.total,
                            path.display()
                        );
                        consolidated.record_report(suite, report);
                    }
                    Err(e) => {
                        error!("suite {suite}: report write failed: {e}");
                        consolidated.record_crash(suite, e.to_string());
                    }
                },
                Err(e) => {
                    error!("suite {suite}: crashed: {e}");
                    consolidated.record_crash(suite, e.to_string());
                }
            }
        }

        consolidated.finalize();
        let path = self.write_consolidated(&consolidated);

        Ok(RunSummary {
            overall: consolidated.overall,
            consolidated,
            consolidated_path: path,
        })
    }

    async fn run_one(&self, suite: &str) -> Result<SuiteReport> {
        match suite {
            s if s == api::SUITE_NAME => api::run_suite(&self.config).await,
            s if s == suites::integration::SUITE_NAME => {
                suites::integration::run_suite(&self.config).await
            }
            s if s == suites::journey::SUITE_NAME => suites::journey::run_suite(&self.config).await,
            s if s == suites::compat::SUITE_NAME => suites::compat::run_suite(&self.config).await,
            s if s == suites::perf::SUITE_NAME => suites::perf::run_suite(&self.config).await,
            s if s == suites::security::SUITE_NAME => suites::security::run_suite(&self.config).await,
            other => Err(HarnessError::InvalidConfig(format!("unknown suite '{other}'"))),
        }
    }

    /// Losing the consolidated artifact should not hide the run's outcome;
    /// the summary still reaches the console.
    fn write_consolidated(&self, consolidated: &ConsolidatedReport) -> Option<PathBuf> {
        match self.writer.write_consolidated(consolidated) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("consolidated report write failed: {e}");
                None
            }
        }
    }
}
