//! GiveBridge verification harness
//!
//! A test orchestration engine for the GiveBridge community platform:
//! independent suite runners coordinated by a top-level orchestrator that
//! sequences them, aggregates results, and emits timestamped JSON reports.
//!
//! ```text
//! Orchestrator
//!   ├── probe::check_servers()            (fail-fast gate)
//!   ├── api::run_suite()                  (REST boundary, no browser)
//!   ├── suites::integration::run_suite()  (UI reflects backend state)
//!   ├── suites::journey::run_suite()      (register → login → donate → …)
//!   ├── suites::compat::run_suite()       (profile × page matrix)
//!   ├── suites::perf::run_suite()         (load budgets)
//!   ├── suites::security::run_suite()     (authz boundaries)
//!   └── ReportWriter                      (per-suite + consolidated JSON)
//! ```
//!
//! Both servers are external collaborators reached over plain HTTP; the
//! harness owns nothing but its own bookkeeping and browser processes.

pub mod api;
pub mod browser;
pub mod orchestrator;
pub mod probe;
pub mod report;
pub mod suites;

pub use browser::{BrowserSession, Script, SessionOutcome};
pub use orchestrator::{Orchestrator, RunSummary, SuitePlan, SUITE_ORDER};
pub use report::ReportWriter;
