//! Environment prober
//!
//! Confirms both servers answer before any suite runs. Every suite assumes a
//! fully-up stack, so a probe failure is fatal to the whole run.

use std::time::Duration;

use tracing::info;

use givebridge_common::{HarnessConfig, HarnessError, Result};

/// Probe the frontend and backend base URLs.
///
/// The error names which side and URL did not respond, so a CI log line is
/// enough to know what to restart.
pub async fn check_servers(config: &HarnessConfig) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.probe_timeout_ms))
        .build()?;

    probe_one(&client, "frontend", &config.frontend_url).await?;
    probe_one(&client, "backend", &config.backend_url).await?;

    info!(
        "environment ready: frontend={} backend={}",
        config.frontend_url, config.backend_url
    );
    Ok(())
}

async fn probe_one(client: &reqwest::Client, side: &'static str, url: &str) -> Result<()> {
    match client.get(url).send().await {
        // Any HTTP answer counts as "up"; route semantics are the suites'
        // concern, reachability is ours.
        Ok(_) => Ok(()),
        Err(e) => Err(HarnessError::ServerUnreachable {
            side,
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}
