//! Orchestrator-level behavior that needs no live GiveBridge stack.

use givebridge_common::{HarnessConfig, SuiteStatus};
use givebridge_harness::{Orchestrator, SuitePlan, SUITE_ORDER};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn test_config(frontend: &str, backend: &str, report_dir: &std::path::Path) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.frontend_url = frontend.to_string();
    config.backend_url = backend.to_string();
    config.report_dir = report_dir.to_path_buf();
    config.screenshot_dir = report_dir.join("screenshots");
    config.probe_timeout_ms = 1_000;
    config
}

/// Minimal HTTP responder so the environment gate can pass in tests.
async fn spawn_stub_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
    let addr = listener.local_addr().expect("stub server addr");
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                    .await;
            });
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn unreachable_backend_fails_fast_with_no_suite_entered() {
    let dir = tempfile::tempdir().unwrap();
    // Port 9 (discard) is never listening locally
    let config = test_config("http://127.0.0.1:9", "http://127.0.0.1:9", dir.path());

    let summary = Orchestrator::new(config)
        .run(&SuitePlan::default())
        .await
        .unwrap();

    assert_eq!(summary.overall, SuiteStatus::Failed);
    assert_eq!(summary.exit_code(), 1);

    // Every scheduled suite is present and untouched; only the environment
    // pseudo-suite carries the failure.
    for &suite in SUITE_ORDER {
        assert_eq!(summary.consolidated.summary[suite], SuiteStatus::NotRun);
    }
    let running_or_passed = summary
        .consolidated
        .summary
        .values()
        .filter(|s| matches!(s, SuiteStatus::Running | SuiteStatus::Passed))
        .count();
    assert_eq!(running_or_passed, 0);
    assert_eq!(
        summary.consolidated.summary["environment"],
        SuiteStatus::Failed
    );
}

#[tokio::test]
async fn gate_failure_still_writes_a_consolidated_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config("http://127.0.0.1:9", "http://127.0.0.1:9", dir.path());

    let summary = Orchestrator::new(config)
        .run(&SuitePlan::default())
        .await
        .unwrap();

    let path = summary.consolidated_path.expect("consolidated report path");
    let raw = std::fs::read_to_string(path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["overall"], "FAILED");
    assert!(parsed["details"]["environment"]["error"]
        .as_str()
        .unwrap()
        .contains("unreachable"));
}

#[tokio::test]
async fn fully_skipped_plan_passes_through_a_healthy_gate() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_stub_server().await;
    let config = test_config(&base, &base, dir.path());

    let plan = SuitePlan {
        skip_api: true,
        skip_integration: true,
        skip_e2e: true,
        skip_crossbrowser: true,
        skip_performance: true,
        skip_security: true,
    };
    let summary = Orchestrator::new(config).run(&plan).await.unwrap();

    assert_eq!(summary.overall, SuiteStatus::Passed);
    assert_eq!(summary.exit_code(), 0);
    for &suite in SUITE_ORDER {
        assert_eq!(summary.consolidated.summary[suite], SuiteStatus::Skipped);
    }
}
