//! Scenario suites
//!
//! Each suite is a fixed-order list of named test bodies run through a
//! [`SuiteRecorder`](givebridge_common::SuiteRecorder); a failing body is
//! recorded and the runner always proceeds to the next case. One broken page
//! must not hide information about all the others.

pub mod compat;
pub mod integration;
pub mod journey;
pub mod perf;
pub mod security;

use givebridge_common::{BrowserProfile, HarnessConfig, HarnessError, Result};

/// The profile scenario suites drive when they are not iterating the whole
/// matrix: the first configured profile, which defaults to desktop.
pub fn primary_profile(config: &HarnessConfig) -> Result<&BrowserProfile> {
    config.profiles.first().ok_or_else(|| {
        HarnessError::InvalidConfig("no browser profiles configured".into())
    })
}

/// Unique throwaway identity for registration flows, so reruns never collide
/// with an account created by an earlier run.
pub fn unique_email() -> String {
    format!(
        "verifier+{}@givebridge.test",
        chrono::Utc::now().format("%Y%m%d%H%M%S%3f")
    )
}

/// Permissive selector for form validation indicators across the frontend's
/// form components.
pub const VALIDATION_INDICATORS: &str =
    "[role=alert], .error, .error-message, .Mui-error, .invalid-feedback, input:invalid";
