//! Security suite coverage against a stub stack.

use givebridge_common::{HarnessConfig, TestStatus};
use givebridge_harness::suites::security;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Minimal HTTP responder that answers 200 to everything.
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
async fn suite_covers_unknown_routes_and_registration_validation() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_stub_server().await;
    let mut config = HarnessConfig::default();
    config.frontend_url = base.clone();
    config.backend_url = base;
    config.report_dir = dir.path().to_path_buf();
    config.screenshot_dir = dir.path().join("screenshots");

    let report = security::run_suite(&config).await.unwrap();

    // A stub that blindly answers 200 must trip both hard checks: the
    // unknown route never 404s and the malformed registration is accepted.
    let unknown = report
        .results
        .iter()
        .find(|r| r.name == "unknown API route returns 404")
        .expect("unknown-route case recorded");
    assert_eq!(unknown.status, TestStatus::Failed);
    assert!(unknown.error.as_deref().unwrap_or("").contains("instead of 404"));

    let registration = report
        .results
        .iter()
        .find(|r| r.name == "malformed registration is rejected")
        .expect("registration case recorded");
    assert_eq!(registration.status, TestStatus::Failed);
    assert!(registration
        .error
        .as_deref()
        .unwrap_or("")
        .contains("accepted invalid registration"));
}
