//! Console summary rendering

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use givebridge_common::{SuiteDetail, SuiteStatus};
use givebridge_harness::RunSummary;

fn colored_status(status: SuiteStatus) -> String {
    let text = status.to_string();
    match status {
        SuiteStatus::Passed => text.green().to_string(),
        SuiteStatus::Failed => text.red().bold().to_string(),
        SuiteStatus::Warning => text.yellow().to_string(),
        SuiteStatus::Running => text.cyan().to_string(),
        SuiteStatus::NotRun | SuiteStatus::Skipped => text.dimmed().to_string(),
    }
}

/// Print the per-suite roll-up table and the overall verdict.
pub fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Suite", "Status", "Passed", "Failed", "Warnings", "Duration"]);

    for (suite, status) in &summary.consolidated.summary {
        let (passed, failed, warnings, duration) = match summary.consolidated.details.get(suite) {
            Some(SuiteDetail::Report(report)) => (
                report.passed.to_string(),
                report.failed.to_string(),
                report.warnings.to_string(),
                format!("{} ms", report.total_duration_ms),
            ),
            Some(SuiteDetail::Crashed { error }) => {
                let reason: String = error.chars().take(60).collect();
                ("-".into(), reason, "-".into(), "-".into())
            }
            None => ("-".into(), "-".into(), "-".into(), "-".into()),
        };
        table.add_row(vec![
            suite.clone(),
            colored_status(*status),
            passed,
            failed,
            warnings,
            duration,
        ]);
    }

    println!("{table}");
    println!();
    if summary.consolidated.has_warnings && summary.overall == SuiteStatus::Passed {
        println!(
            "Overall: {} {}",
            colored_status(summary.overall),
            "(with warnings)".yellow()
        );
    } else {
        println!("Overall: {}", colored_status(summary.overall));
    }

    if let Some(path) = &summary.consolidated_path {
        println!("Consolidated report: {}", path.display());
    }

    // Warnings deserve eyeballs even when the run passes
    for (suite, detail) in &summary.consolidated.details {
        if let SuiteDetail::Report(report) = detail {
            for result in report.results.iter().filter(|r| r.details.is_some()) {
                if matches!(result.status, givebridge_common::TestStatus::Warning) {
                    println!(
                        "  {} {suite}/{}: {}",
                        "warning:".yellow(),
                        result.name,
                        result.details.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }
}
