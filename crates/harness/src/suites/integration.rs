//! Frontend-backend integration suite
//!
//! End-to-end cross-checks: the browser-rendered UI must reflect true
//! backend state, not just render without crashing.

use serde_json::Value;

use givebridge_common::{
    CaseOutcome, HarnessConfig, HarnessError, Result, SuiteRecorder, SuiteReport,
};

use crate::api::ListingBody;
use crate::browser::{BrowserSession, Script};
use crate::suites::{primary_profile, VALIDATION_INDICATORS};

pub const SUITE_NAME: &str = "integration";

pub async fn run_suite(config: &HarnessConfig) -> Result<SuiteReport> {
    let session = BrowserSession::launch(SUITE_NAME, primary_profile(config)?, config)?;
    let client = reqwest::Client::new();
    let mut rec = SuiteRecorder::new(SUITE_NAME);

    rec.run_case(
        "homepage renders with live backend data",
        check_homepage(&session, &client, config),
    )
    .await;
    rec.run_case(
        "blog page reflects backend blog list",
        check_blog_consistency(&session, &client, config),
    )
    .await;
    rec.run_case(
        "empty form submit shows validation indicators",
        check_empty_form_validation(&session),
    )
    .await;
    rec.run_case(
        "malformed email shows field-scoped validation",
        check_bad_email_validation(&session),
    )
    .await;
    rec.run_case(
        "login stores a session token",
        check_login_persists_token(&session, config),
    )
    .await;

    Ok(rec.into_report())
}

async fn backend_listing(
    client: &reqwest::Client,
    config: &HarnessConfig,
    endpoint: &str,
) -> Result<Vec<Value>> {
    let body: Value = client
        .get(format!("{}/{endpoint}", config.api_base()))
        .send()
        .await?
        .json()
        .await?;
    ListingBody::decode(endpoint, &body)
}

async fn check_homepage(
    session: &BrowserSession,
    client: &reqwest::Client,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    // Both halves must answer for the page to count as integrated
    let blogs = backend_listing(client, config, "blogs").await?;

    let outcome = session
        .run(
            "homepage",
            Script::new()
                .goto("/")
                .eval("has_nav", "return !!document.querySelector('nav, header, [role=navigation]');")
                .eval("body_text_len", "return document.body.innerText.trim().length;")
                .screenshot("landing"),
        )
        .await?;
    outcome.ensure_ok()?;

    if outcome.bool_value("has_nav") != Some(true) {
        return Err(HarnessError::assertion("homepage has no navigation landmark"));
    }
    if outcome.i64_value("body_text_len").unwrap_or(0) < 50 {
        return Err(HarnessError::assertion(
            "homepage rendered almost no text; likely a blank bundle",
        ));
    }

    let mut result = CaseOutcome::pass().with_details(format!("backend lists {} blog(s)", blogs.len()));
    if let Some(shot) = outcome.first_screenshot() {
        result = result.with_screenshot(shot);
    }
    Ok(result)
}

async fn check_blog_consistency(
    session: &BrowserSession,
    client: &reqwest::Client,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    let backend_blogs = backend_listing(client, config, "blogs").await?;

    let outcome = session
        .run(
            "blog-listing",
            Script::new().goto("/blogs").eval(
                "rendered_cards",
                "return document.querySelectorAll('article, .blog-card, .MuiCard-root, [data-testid=blog-card]').length;",
            ),
        )
        .await?;
    outcome.ensure_ok()?;

    let rendered = outcome.i64_value("rendered_cards").unwrap_or(0);
    if backend_blogs.is_empty() {
        return Ok(CaseOutcome::pass().with_details("backend has no blogs; nothing to render"));
    }
    if rendered == 0 {
        return Err(HarnessError::assertion(format!(
            "backend lists {} blog(s) but the page rendered none",
            backend_blogs.len()
        )));
    }
    Ok(CaseOutcome::pass().with_details(format!(
        "backend {} blog(s), page rendered {rendered} card(s)",
        backend_blogs.len()
    )))
}

async fn check_empty_form_validation(session: &BrowserSession) -> Result<CaseOutcome> {
    let outcome = session
        .run(
            "empty-register-submit",
            Script::new()
                .goto("/register")
                .click("button[type=submit], input[type=submit]")
                .sleep(500)
                .eval(
                    "indicators",
                    &format!("return document.querySelectorAll('{VALIDATION_INDICATORS}').length;"),
                ),
        )
        .await?;
    outcome.ensure_ok()?;

    if outcome.i64_value("indicators").unwrap_or(0) == 0 {
        return Err(HarnessError::assertion(
            "empty registration submit produced no visible validation indicator",
        ));
    }
    Ok(CaseOutcome::pass())
}

async fn check_bad_email_validation(session: &BrowserSession) -> Result<CaseOutcome> {
    let outcome = session
        .run(
            "bad-email-register",
            Script::new()
                .goto("/register")
                .fill("input[name=email], input[type=email]", "not-an-email")
                .click("button[type=submit], input[type=submit]")
                .sleep(500)
                .eval(
                    "field_invalid",
                    "const f = document.querySelector('input[name=email], input[type=email]'); \
                     return !!(f && (!f.checkValidity() || f.getAttribute('aria-invalid') === 'true' \
                     || f.closest('.Mui-error, .error, .invalid')));",
                ),
        )
        .await?;
    outcome.ensure_ok()?;

    if outcome.bool_value("field_invalid") != Some(true) {
        return Err(HarnessError::assertion(
            "malformed email produced no field-scoped validation indicator",
        ));
    }
    Ok(CaseOutcome::pass())
}

async fn check_login_persists_token(
    session: &BrowserSession,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    let outcome = session
        .run(
            "login-token",
            Script::new()
                .goto("/login")
                .fill_form([
                    ("input[name=email], input[type=email]", config.admin_email.as_str()),
                    (
                        "input[name=password], input[type=password]",
                        config.admin_password.as_str(),
                    ),
                ])
                .click("button[type=submit], input[type=submit]")
                .sleep(2_000)
                .eval("url", "return window.location.pathname;")
                .eval(
                    "token",
                    "return localStorage.getItem('token') || localStorage.getItem('x-auth-token') || '';",
                ),
        )
        .await?;
    outcome.ensure_ok()?;

    let url = outcome.string_value("url").unwrap_or("/login");
    let token = outcome.string_value("token").unwrap_or("");

    // A login that merely looks successful but stores no session is the bug
    // class this test exists to catch.
    if token.is_empty() {
        if url == "/login" {
            return Err(HarnessError::assertion(
                "login did not redirect and no session token stored",
            ));
        }
        return Err(HarnessError::assertion(format!(
            "redirected to {url} but no session token stored"
        )));
    }
    Ok(CaseOutcome::pass().with_details(format!("redirected to {url}")))
}
