//! GiveBridge verification CLI
//!
//! Runs the full suite sequence against a live GiveBridge stack and exits
//! 0 only when the overall run passed. `--skip-<suite>` flags omit a suite;
//! no flag means run everything.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use givebridge_common::{BrowserKind, HarnessConfig};
use givebridge_harness::{Orchestrator, SuitePlan};

mod output;

#[derive(Parser, Debug)]
#[command(name = "givebridge-verify")]
#[command(version = givebridge_common::VERSION)]
#[command(about = "Verification harness for the GiveBridge platform")]
struct Args {
    /// Skip the HTTP API verification suite
    #[arg(long, alias = "skip-unit")]
    skip_api: bool,

    /// Skip the frontend-backend integration suite
    #[arg(long)]
    skip_integration: bool,

    /// Skip the end-to-end journey suite
    #[arg(long)]
    skip_e2e: bool,

    /// Skip the cross-browser/device compatibility suite
    #[arg(long)]
    skip_crossbrowser: bool,

    /// Skip the performance probe
    #[arg(long)]
    skip_performance: bool,

    /// Skip the security probe
    #[arg(long)]
    skip_security: bool,

    /// Frontend base URL
    #[arg(long)]
    frontend_url: Option<String>,

    /// Backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Optional YAML configuration file (profiles, pages, thresholds)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for JSON reports
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run browsers headless (pass `--headless false` for a visible window)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, num_args = 1)]
    headless: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn plan(&self) -> SuitePlan {
        SuitePlan {
            skip_api: self.skip_api,
            skip_integration: self.skip_integration,
            skip_e2e: self.skip_e2e,
            skip_crossbrowser: self.skip_crossbrowser,
            skip_performance: self.skip_performance,
            skip_security: self.skip_security,
        }
    }

    fn apply_to(&self, config: &mut HarnessConfig) -> anyhow::Result<()> {
        if let Some(url) = &self.frontend_url {
            config.frontend_url = url.clone();
        }
        if let Some(url) = &self.backend_url {
            config.backend_url = url.clone();
        }
        if let Some(output) = &self.output {
            config.report_dir = output.join("reports");
            config.screenshot_dir = output.join("screenshots");
        }
        config.browser = self.browser.parse::<BrowserKind>()?;
        config.headless = self.headless;
        Ok(())
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(args: Args) -> anyhow::Result<i32> {
    let mut config =
        HarnessConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply_to(&mut config)?;

    let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
    let summary = rt
        .block_on(Orchestrator::new(config).run(&args.plan()))
        .context("running verification suites")?;

    output::print_summary(&summary);
    Ok(summary.exit_code())
}
