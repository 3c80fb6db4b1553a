//! Cross-browser/device compatibility suite
//!
//! Replays the critical page set across every configured browser profile.
//! Each (profile, page) pair is one independent result; a broken pair never
//! skips the rest of the matrix. Layout heuristics (overflow, tiny text) are
//! environment-sensitive, so their thresholds come from configuration.

use serde_json::Value;

use givebridge_common::{
    BrowserProfile, CaseOutcome, HarnessConfig, HarnessError, Result, SuiteRecorder, SuiteReport,
};

use crate::browser::{BrowserSession, Script};

pub const SUITE_NAME: &str = "crossbrowser";

/// Layout metrics collected in one round trip per page load.
fn layout_metrics_js(min_font_px: f64) -> String {
    format!(
        "const broken = [...document.images].filter(i => i.complete && i.naturalWidth === 0).length; \
         let tiny = 0; \
         for (const el of document.querySelectorAll('p, a, span, li, button, label')) {{ \
           const size = parseFloat(getComputedStyle(el).fontSize); \
           if (el.innerText.trim() && size > 0 && size < {min_font_px}) tiny++; \
         }} \
         return {{ \
           hasNav: !!document.querySelector('nav, header, [role=navigation]'), \
           hasFooter: !!document.querySelector('footer, [role=contentinfo]'), \
           hasMenuToggle: !!document.querySelector('[aria-label*=menu], [aria-label*=Menu], .hamburger, .menu-toggle, button.MuiIconButton-root'), \
           brokenImages: broken, \
           tinyText: tiny, \
           scrollWidth: document.documentElement.scrollWidth, \
           viewportWidth: window.innerWidth \
         }};"
    )
}

pub async fn run_suite(config: &HarnessConfig) -> Result<SuiteReport> {
    let mut rec = SuiteRecorder::new(SUITE_NAME);

    for profile in &config.profiles {
        // A profile whose session cannot launch still yields one recorded
        // result per page, keeping the matrix count intact.
        let session = match BrowserSession::launch(SUITE_NAME, profile, config) {
            Ok(s) => s,
            Err(e) => {
                let reason = e.to_string();
                for page in &config.critical_pages {
                    let reason = reason.clone();
                    rec.run_case(pair_name(page, profile), async move {
                        Err(HarnessError::Browser(reason))
                    })
                    .await;
                }
                continue;
            }
        };

        for page in &config.critical_pages {
            rec.run_case(
                pair_name(page, profile),
                check_page(&session, profile, page, config),
            )
            .await;
        }
    }

    Ok(rec.into_report())
}

fn pair_name(page: &str, profile: &BrowserProfile) -> String {
    format!("{page} @ {}", profile.name)
}

async fn check_page(
    session: &BrowserSession,
    profile: &BrowserProfile,
    page: &str,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    let test_label = format!("page{}", page.replace('/', "-"));
    let outcome = session
        .run(
            &test_label,
            Script::new()
                .goto(page)
                .eval("layout", &layout_metrics_js(config.min_font_px))
                .screenshot("loaded"),
        )
        .await?;
    outcome.ensure_ok()?;

    let layout = outcome
        .value("layout")
        .cloned()
        .unwrap_or(Value::Null);

    classify_layout(&layout, profile, config).map(|result| {
        match outcome.first_screenshot() {
            Some(shot) => result.with_screenshot(shot),
            None => result,
        }
    })
}

/// Turn raw layout metrics into a pass/warn/fail classification.
pub fn classify_layout(
    layout: &Value,
    profile: &BrowserProfile,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    let flag = |key: &str| layout.get(key).and_then(Value::as_bool).unwrap_or(false);
    let count = |key: &str| layout.get(key).and_then(Value::as_i64).unwrap_or(0);

    if layout.is_null() {
        return Err(HarnessError::assertion("layout metrics were not collected"));
    }
    if !flag("hasNav") {
        return Err(HarnessError::assertion("navigation landmark missing"));
    }
    if !flag("hasFooter") {
        return Err(HarnessError::assertion("footer landmark missing"));
    }

    let broken = count("brokenImages");
    if broken > 0 {
        return Err(HarnessError::assertion(format!("{broken} broken image(s)")));
    }

    let scroll_width = count("scrollWidth");
    let viewport_width = i64::from(profile.viewport.width);
    let tolerance = i64::from(config.overflow_tolerance_px);
    if scroll_width > viewport_width + tolerance {
        return Err(HarnessError::assertion(format!(
            "horizontal overflow: scrollWidth {scroll_width} exceeds viewport {viewport_width} by more than {tolerance}px"
        )));
    }

    // Soft checks: surfaced for review, never flip the pair to FAILED
    let is_narrow = profile.viewport.width < 768;
    if is_narrow && !flag("hasMenuToggle") {
        return Ok(CaseOutcome::warn(format!(
            "no mobile menu toggle found at {}px width",
            profile.viewport.width
        )));
    }
    let tiny = count("tinyText");
    if tiny > 0 {
        return Ok(CaseOutcome::warn(format!(
            "{tiny} element(s) render text below {}px",
            config.min_font_px
        )));
    }

    Ok(CaseOutcome::pass())
}
