//! Performance probe
//!
//! Coarse per-page load-time checks. Timings come from the browser's own
//! navigation entry so Node startup overhead never pollutes the measurement.
//! Over-budget pages are warnings; a page that fails to load is a failure.

use givebridge_common::{CaseOutcome, HarnessConfig, Result, SuiteRecorder, SuiteReport};

use crate::browser::{BrowserSession, Script};
use crate::suites::primary_profile;

pub const SUITE_NAME: &str = "performance";

const NAV_TIMING_JS: &str = "\
    const entry = performance.getEntriesByType('navigation')[0]; \
    return entry ? Math.round(entry.duration) : -1;";

pub async fn run_suite(config: &HarnessConfig) -> Result<SuiteReport> {
    let session = BrowserSession::launch(SUITE_NAME, primary_profile(config)?, config)?;
    let mut rec = SuiteRecorder::new(SUITE_NAME);

    for page in &config.critical_pages {
        rec.run_case(
            format!("load budget: {page}"),
            check_page_budget(&session, page, config.page_budget_ms),
        )
        .await;
    }

    Ok(rec.into_report())
}

async fn check_page_budget(
    session: &BrowserSession,
    page: &str,
    budget_ms: u64,
) -> Result<CaseOutcome> {
    let label = format!("perf{}", page.replace('/', "-"));
    let outcome = session
        .run(&label, Script::new().goto(page).eval("nav_ms", NAV_TIMING_JS))
        .await?;
    outcome.ensure_ok()?;

    let nav_ms = outcome.i64_value("nav_ms").unwrap_or(-1);
    Ok(classify_load_time(page, nav_ms, budget_ms))
}

pub fn classify_load_time(page: &str, nav_ms: i64, budget_ms: u64) -> CaseOutcome {
    if nav_ms < 0 {
        return CaseOutcome::warn(format!("{page}: no navigation timing entry available"));
    }
    if nav_ms as u64 > budget_ms {
        return CaseOutcome::warn(format!(
            "{page} loaded in {nav_ms} ms, over the {budget_ms} ms budget"
        ));
    }
    CaseOutcome::pass().with_details(format!("loaded in {nav_ms} ms"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use givebridge_common::TestStatus;

    async fn status_of(outcome: CaseOutcome) -> TestStatus {
        let mut rec = SuiteRecorder::new(SUITE_NAME);
        rec.run_case("probe", async move { Ok(outcome) }).await;
        rec.into_report().results[0].status
    }

    #[tokio::test]
    async fn within_budget_passes() {
        assert_eq!(status_of(classify_load_time("/", 1200, 8000)).await, TestStatus::Passed);
    }

    #[tokio::test]
    async fn over_budget_warns_instead_of_failing() {
        assert_eq!(status_of(classify_load_time("/", 9000, 8000)).await, TestStatus::Warning);
    }

    #[tokio::test]
    async fn missing_timing_entry_warns() {
        assert_eq!(status_of(classify_load_time("/", -1, 8000)).await, TestStatus::Warning);
    }
}
