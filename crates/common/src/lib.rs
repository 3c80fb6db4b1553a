//! Result model, configuration, and error taxonomy shared by the
//! verification crates.

pub mod config;
pub mod error;
pub mod report;
pub mod result;

// Re-export commonly used types
pub use config::{BrowserKind, BrowserProfile, HarnessConfig, Viewport};
pub use error::{HarnessError, Result};
pub use report::{ConsolidatedReport, SuiteDetail, SuiteStatus};
pub use result::{CaseOutcome, SuiteRecorder, SuiteReport, TestResult, TestStatus};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
