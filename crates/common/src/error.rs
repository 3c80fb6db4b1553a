//! Error types for the verification harness

use thiserror::Error;

/// Result type alias using the harness error
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Harness error taxonomy
///
/// Environmental errors propagate to the orchestrator; structural errors are
/// caught at the suite boundary; test-level errors are caught at the case
/// boundary and become a single FAILED result.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("{side} server unreachable at {url}: {reason}")]
    ServerUnreachable {
        side: &'static str,
        url: String,
        reason: String,
    },

    #[error("Playwright not found. Install with: npx playwright install")]
    BrowserNotFound,

    #[error("browser error: {0}")]
    Browser(String),

    #[error("step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("unrecognized listing-response shape: {0}")]
    UnrecognizedListing(String),

    #[error("unexpected status {status} from {endpoint} (expected {expected})")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        expected: String,
    },

    #[error("timeout waiting for: {0}")]
    Timeout(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("report write failed: {0}")]
    ReportWrite(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HarnessError {
    /// Convenience constructor for assertion failures inside test bodies.
    pub fn assertion(msg: impl Into<String>) -> Self {
        HarnessError::AssertionFailed(msg.into())
    }
}
