//! Security probe
//!
//! Authorization behavior on both boundaries: API routes must reject
//! token-less callers, the admin surface must bounce sessionless browsers,
//! and hardening headers are checked softly (their absence is a warning,
//! not a failure).

use std::time::Duration;

use givebridge_common::{
    CaseOutcome, HarnessConfig, HarnessError, Result, SuiteRecorder, SuiteReport,
};

use crate::api::{protected_route_outcome, registration_validation_outcome};
use crate::browser::{BrowserSession, Script};
use crate::suites::primary_profile;

pub const SUITE_NAME: &str = "security";

/// API routes expected to reject a token-less caller.
const PROTECTED_ROUTES: &[(&str, &str)] = &[
    ("GET", "auth/me"),
    ("POST", "blogs"),
    ("POST", "products"),
    ("DELETE", "blogs/000000000000000000000000"),
];

/// Hardening headers checked on the frontend response.
const HARDENING_HEADERS: &[&str] = &["x-frame-options", "x-content-type-options"];

pub async fn run_suite(config: &HarnessConfig) -> Result<SuiteReport> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let mut rec = SuiteRecorder::new(SUITE_NAME);

    for &(method, route) in PROTECTED_ROUTES {
        rec.run_case(
            format!("token-less {method} /api/{route} is rejected"),
            check_protected_api(&client, config, method, route),
        )
        .await;
    }

    rec.run_case(
        "unknown API route returns 404",
        check_unknown_route(&client, config),
    )
    .await;
    rec.run_case(
        "malformed registration is rejected",
        check_registration_validation(&client, config),
    )
    .await;
    rec.run_case(
        "admin surface bounces sessionless browsers",
        check_admin_redirect(config),
    )
    .await;
    rec.run_case(
        "frontend sends hardening headers",
        check_hardening_headers(&client, config),
    )
    .await;

    Ok(rec.into_report())
}

async fn check_protected_api(
    client: &reqwest::Client,
    config: &HarnessConfig,
    method: &str,
    route: &str,
) -> Result<CaseOutcome> {
    let url = format!("{}/{route}", config.api_base());
    let resp = match method {
        "POST" => client.post(&url).json(&serde_json::json!({})).send().await?,
        "DELETE" => client.delete(&url).send().await?,
        _ => client.get(&url).send().await?,
    };
    protected_route_outcome(&format!("{method} /api/{route}"), resp.status())
}

async fn check_unknown_route(
    client: &reqwest::Client,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    let url = format!("{}/definitely-not-a-route-7ac1", config.api_base());
    let resp = client.get(&url).send().await?;
    let status = resp.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        Ok(CaseOutcome::pass())
    } else {
        Err(HarnessError::assertion(format!(
            "unknown route answered {status} instead of 404"
        )))
    }
}

async fn check_registration_validation(
    client: &reqwest::Client,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    let resp = client
        .post(format!("{}/auth/register", config.api_base()))
        .json(&serde_json::json!({
            "name": "Invalid Input Check",
            "email": "not-an-email",
            "password": "123"
        }))
        .send()
        .await?;
    registration_validation_outcome(resp.status())
}

async fn check_admin_redirect(config: &HarnessConfig) -> Result<CaseOutcome> {
    let session = BrowserSession::launch(SUITE_NAME, primary_profile(config)?, config)?;
    let outcome = session
        .run(
            "admin-no-session",
            Script::new()
                .goto("/admin")
                .sleep(1_000)
                .eval("url", "return window.location.pathname;")
                .eval(
                    "admin_content",
                    "return !!document.querySelector('[data-testid=admin-panel], .admin-dashboard, .admin-panel');",
                ),
        )
        .await?;
    outcome.ensure_ok()?;

    let landed = outcome.string_value("url").unwrap_or("/admin");
    let shows_admin = outcome.bool_value("admin_content") == Some(true);
    if landed.starts_with("/admin") && shows_admin {
        return Err(HarnessError::assertion(
            "admin panel rendered without any session",
        ));
    }
    Ok(CaseOutcome::pass().with_details(format!("landed on {landed}")))
}

async fn check_hardening_headers(
    client: &reqwest::Client,
    config: &HarnessConfig,
) -> Result<CaseOutcome> {
    let resp = client.get(&config.frontend_url).send().await?;
    let missing: Vec<&str> = HARDENING_HEADERS
        .iter()
        .copied()
        .filter(|h| !resp.headers().contains_key(*h))
        .collect();

    if missing.is_empty() {
        Ok(CaseOutcome::pass())
    } else {
        Ok(CaseOutcome::warn(format!(
            "missing non-critical header(s): {}",
            missing.join(", ")
        )))
    }
}
