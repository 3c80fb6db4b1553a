//! Browser session driver
//!
//! Owns the lifecycle of headless-browser work for one suite. Scenario code
//! composes a [`Script`] of ordered steps; [`BrowserSession::run`] generates
//! a Playwright Node script from it, executes it as a subprocess, and decodes
//! the JSON outcome the script prints on its last stdout line. All steps on
//! one page are strictly sequential; distinct profiles always get distinct
//! sessions, so nothing mutable is shared between them.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use givebridge_common::{BrowserKind, BrowserProfile, HarnessConfig, HarnessError, Result};

/// Marker prefixing the JSON outcome line in script stdout.
const RESULT_MARKER: &str = "GBVERIFY_RESULT";

/// Wait condition applied after navigation
#[derive(Debug, Clone)]
pub enum WaitUntil {
    /// Block until the network goes idle.
    NetworkIdle,
    /// Block until a selector becomes visible.
    Selector(String),
}

/// One ordered step in a browser scenario
#[derive(Debug, Clone)]
pub enum Step {
    Goto { path: String, wait: WaitUntil },
    Fill { selector: String, value: String },
    Click { selector: String },
    WaitForSelector { selector: String, timeout_ms: u64 },
    /// Best-effort capture: a failure here is logged browser-side and never
    /// fails the scenario.
    Screenshot { label: String },
    /// Evaluate a JS expression on the page; the result lands in
    /// [`SessionOutcome::values`] under `key`.
    Eval { key: String, js: String },
    Sleep { ms: u64 },
}

impl Step {
    fn name(&self) -> String {
        match self {
            Step::Goto { path, .. } => format!("goto:{path}"),
            Step::Fill { selector, .. } => format!("fill:{selector}"),
            Step::Click { selector } => format!("click:{selector}"),
            Step::WaitForSelector { selector, .. } => format!("wait:{selector}"),
            Step::Screenshot { label } => format!("screenshot:{label}"),
            Step::Eval { key, .. } => format!("eval:{key}"),
            Step::Sleep { ms } => format!("sleep:{ms}ms"),
        }
    }
}

/// Ordered list of steps for one scenario run
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn goto(mut self, path: impl Into<String>) -> Self {
        self.steps.push(Step::Goto {
            path: path.into(),
            wait: WaitUntil::NetworkIdle,
        });
        self
    }

    pub fn goto_and_wait(mut self, path: impl Into<String>, selector: impl Into<String>) -> Self {
        self.steps.push(Step::Goto {
            path: path.into(),
            wait: WaitUntil::Selector(selector.into()),
        });
        self
    }

    pub fn fill(mut self, selector: impl Into<String>, value: impl Into<String>) -> Self {
        self.steps.push(Step::Fill {
            selector: selector.into(),
            value: value.into(),
        });
        self
    }

    /// Populate fields in the given order; each missing field fails loudly
    /// rather than being skipped.
    pub fn fill_form<I, S, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<String>,
    {
        for (selector, value) in fields {
            self.steps.push(Step::Fill {
                selector: selector.into(),
                value: value.into(),
            });
        }
        self
    }

    pub fn click(mut self, selector: impl Into<String>) -> Self {
        self.steps.push(Step::Click {
            selector: selector.into(),
        });
        self
    }

    pub fn wait_for(mut self, selector: impl Into<String>, timeout_ms: u64) -> Self {
        self.steps.push(Step::WaitForSelector {
            selector: selector.into(),
            timeout_ms,
        });
        self
    }

    pub fn screenshot(mut self, label: impl Into<String>) -> Self {
        self.steps.push(Step::Screenshot {
            label: label.into(),
        });
        self
    }

    pub fn eval(mut self, key: impl Into<String>, js: impl Into<String>) -> Self {
        self.steps.push(Step::Eval {
            key: key.into(),
            js: js.into(),
        });
        self
    }

    pub fn sleep(mut self, ms: u64) -> Self {
        self.steps.push(Step::Sleep { ms });
        self
    }
}

/// Outcome of one step as reported from the browser side
#[derive(Debug, Clone, Deserialize)]
pub struct StepOutcome {
    pub name: String,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decoded result of one script run
#[derive(Debug, Clone, Deserialize)]
pub struct SessionOutcome {
    #[serde(default)]
    pub steps: Vec<StepOutcome>,
    #[serde(default)]
    pub values: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub screenshots: Vec<PathBuf>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SessionOutcome {
    /// Hard-fail the calling test if any step failed browser-side.
    pub fn ensure_ok(&self) -> Result<()> {
        if let Some(failed) = self.steps.iter().find(|s| !s.ok) {
            return Err(HarnessError::StepFailed {
                step: failed.name.clone(),
                reason: failed
                    .error
                    .clone()
                    .or_else(|| self.error.clone())
                    .unwrap_or_else(|| "unknown browser error".to_string()),
            });
        }
        if let Some(error) = &self.error {
            return Err(HarnessError::Browser(error.clone()));
        }
        Ok(())
    }

    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn string_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    pub fn i64_value(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|v| v.as_i64())
    }

    pub fn bool_value(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(|v| v.as_bool())
    }

    pub fn first_screenshot(&self) -> Option<&Path> {
        self.screenshots.first().map(PathBuf::as_path)
    }
}

/// One logical browser page context bound to a profile
pub struct BrowserSession {
    suite: String,
    base_url: String,
    profile: BrowserProfile,
    browser: BrowserKind,
    headless: bool,
    screenshot_dir: PathBuf,
    navigation_timeout_ms: u64,
    field_timeout_ms: u64,
}

impl BrowserSession {
    /// Create a session for one suite and profile. Verifies the Playwright
    /// runtime is installed and prepares the screenshot directory.
    pub fn launch(suite: &str, profile: &BrowserProfile, config: &HarnessConfig) -> Result<Self> {
        ensure_browser_runtime()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self {
            suite: suite.to_string(),
            base_url: config.frontend_url.trim_end_matches('/').to_string(),
            profile: profile.clone(),
            browser: config.browser,
            headless: config.headless,
            screenshot_dir: config.screenshot_dir.clone(),
            navigation_timeout_ms: config.navigation_timeout_ms,
            field_timeout_ms: config.field_timeout_ms,
        })
    }

    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }

    /// Execute a scenario script and decode its outcome.
    ///
    /// The subprocess gets a wall-clock budget derived from the per-step
    /// timeouts; exceeding it surfaces as a normal test failure, never a
    /// hang.
    pub async fn run(&self, test: &str, script: Script) -> Result<SessionOutcome> {
        let source = self.render_script(test, &script);
        let scratch = tempfile::tempdir()?;
        let script_path = scratch.path().join("scenario.js");
        std::fs::write(&script_path, &source)?;

        debug!(suite = %self.suite, test, "running browser script: {}", script_path.display());

        let budget = self.script_budget(&script);
        let output = tokio::time::timeout(
            budget,
            Command::new("node")
                .arg(&script_path)
                .current_dir(scratch.path())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output(),
        )
        .await
        .map_err(|_| {
            HarnessError::Timeout(format!(
                "browser scenario '{test}' exceeded {} ms",
                budget.as_millis()
            ))
        })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let outcome = extract_outcome(&stdout).ok_or_else(|| {
            let stderr = String::from_utf8_lossy(&output.stderr);
            HarnessError::Browser(format!(
                "no result line in browser output\nstdout: {stdout}\nstderr: {stderr}"
            ))
        })?;

        if let Some(error) = &outcome.error {
            debug!(suite = %self.suite, test, "browser-side error: {error}");
        }
        Ok(outcome)
    }

    fn script_budget(&self, script: &Script) -> Duration {
        let per_step: u64 = script
            .steps()
            .iter()
            .map(|s| match s {
                Step::Goto { .. } => self.navigation_timeout_ms,
                Step::Fill { .. } | Step::Click { .. } => self.field_timeout_ms,
                Step::WaitForSelector { timeout_ms, .. } => *timeout_ms,
                Step::Sleep { ms } => *ms,
                Step::Screenshot { .. } | Step::Eval { .. } => self.field_timeout_ms,
            })
            .sum();
        // Browser launch overhead on top of the step budgets
        Duration::from_millis(per_step + 30_000)
    }

    /// Collision-free artifact path: suite, test, and profile name are all
    /// embedded in the filename.
    fn screenshot_path(&self, test: &str, label: &str) -> PathBuf {
        let ts = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        self.screenshot_dir.join(format!(
            "{}-{}-{}-{}-{}.png",
            sanitize(&self.suite),
            sanitize(test),
            sanitize(&self.profile.name),
            sanitize(label),
            ts
        ))
    }

    /// Generate the Playwright Node source for a script.
    pub fn render_script(&self, test: &str, script: &Script) -> String {
        let mut js = String::new();

        js.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const out = {{ steps: [], values: {{}}, screenshots: [], error: null }};
  let browser = null;
  try {{
    browser = await {engine}.launch({{ headless: {headless} }});
    const context = await browser.newContext({{
      viewport: {{ width: {width}, height: {height} }},
      userAgent: '{ua}'
    }});
    const page = await context.newPage();
    const baseUrl = '{base_url}';
"#,
            engine = self.browser.as_str(),
            headless = self.headless,
            width = self.profile.viewport.width,
            height = self.profile.viewport.height,
            ua = js_str(&self.profile.user_agent),
            base_url = js_str(&self.base_url),
        ));

        for (i, step) in script.steps().iter().enumerate() {
            js.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            js.push_str(&self.step_to_js(test, step));
        }

        js.push_str(&format!(
            r#"
  }} catch (err) {{
    out.error = String((err && err.message) || err);
  }} finally {{
    if (browser) {{ await browser.close().catch(() => {{}}); }}
    console.log('{marker} ' + JSON.stringify(out));
  }}
}})();
"#,
            marker = RESULT_MARKER
        ));

        js
    }

    fn step_to_js(&self, test: &str, step: &Step) -> String {
        let name = js_str(&step.name());
        let body = match step {
            Step::Goto { path, wait } => {
                let goto = format!(
                    "await page.goto(baseUrl + '{}', {{ waitUntil: 'domcontentloaded', timeout: {} }});",
                    js_str(path),
                    self.navigation_timeout_ms
                );
                match wait {
                    WaitUntil::NetworkIdle => format!(
                        "{goto}\n      await page.waitForLoadState('networkidle', {{ timeout: {} }});",
                        self.navigation_timeout_ms
                    ),
                    WaitUntil::Selector(selector) => format!(
                        "{goto}\n      await page.waitForSelector('{}', {{ timeout: {} }});",
                        js_str(selector),
                        self.navigation_timeout_ms
                    ),
                }
            }
            Step::Fill { selector, value } => format!(
                "await page.fill('{}', '{}', {{ timeout: {} }});",
                js_str(selector),
                js_str(value),
                self.field_timeout_ms
            ),
            Step::Click { selector } => format!(
                "await page.click('{}', {{ timeout: {} }});",
                js_str(selector),
                self.field_timeout_ms
            ),
            Step::WaitForSelector { selector, timeout_ms } => format!(
                "await page.waitForSelector('{}', {{ timeout: {} }});",
                js_str(selector),
                timeout_ms
            ),
            Step::Sleep { ms } => format!("await page.waitForTimeout({ms});"),
            Step::Eval { key, js } => format!(
                "out.values['{}'] = await page.evaluate(() => {{ {} }});",
                js_str(key),
                js
            ),
            Step::Screenshot { label } => {
                // Best-effort: a capture failure must never mask the real
                // test failure.
                let path = self.screenshot_path(test, label);
                return format!(
                    r#"    try {{
      await page.screenshot({{ path: '{path}', fullPage: true }});
      out.screenshots.push('{path}');
      out.steps.push({{ name: '{name}', ok: true }});
    }} catch (err) {{
      console.error('screenshot failed: ' + ((err && err.message) || err));
      out.steps.push({{ name: '{name}', ok: true, error: 'screenshot skipped' }});
    }}
"#,
                    path = js_str(&path.to_string_lossy()),
                );
            }
        };

        format!(
            r#"    try {{
      {body}
      out.steps.push({{ name: '{name}', ok: true }});
    }} catch (err) {{
      out.steps.push({{ name: '{name}', ok: false, error: String((err && err.message) || err) }});
      throw err;
    }}
"#,
        )
    }
}

/// Verify the Playwright runtime is available before any suite tries to
/// launch a browser.
pub fn ensure_browser_runtime() -> Result<()> {
    let status = std::process::Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(s) if s.success() => Ok(()),
        _ => Err(HarnessError::BrowserNotFound),
    }
}

/// Pull the outcome JSON off the marker line, ignoring any other stdout the
/// page or Playwright produced.
fn extract_outcome(stdout: &str) -> Option<SessionOutcome> {
    let re = Regex::new(&format!(r"(?m)^{RESULT_MARKER} (.+)$")).ok()?;
    let captures = re.captures_iter(stdout).last()?;
    serde_json::from_str(captures.get(1)?.as_str()).ok()
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn js_str(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use givebridge_common::{HarnessConfig, Viewport};

    fn session() -> BrowserSession {
        let config = HarnessConfig::default();
        BrowserSession {
            suite: "compat".into(),
            base_url: config.frontend_url.clone(),
            profile: BrowserProfile {
                name: "mobile-iphone".into(),
                viewport: Viewport { width: 390, height: 844 },
                user_agent: "Test UA 'quoted'".into(),
            },
            browser: config.browser,
            headless: true,
            screenshot_dir: config.screenshot_dir.clone(),
            navigation_timeout_ms: 30_000,
            field_timeout_ms: 5_000,
        }
    }

    #[test]
    fn rendered_script_carries_viewport_and_user_agent() {
        let script = Script::new()
            .goto("/login")
            .fill("input[name=email]", "user@example.com")
            .click("button[type=submit]")
            .eval("token", "return localStorage.getItem('token');");

        let js = session().render_script("login-flow", &script);

        assert!(js.contains("width: 390, height: 844"));
        assert!(js.contains("userAgent: 'Test UA \\'quoted\\''"));
        assert!(js.contains("page.goto(baseUrl + '/login'"));
        assert!(js.contains("page.fill('input[name=email]', 'user@example.com'"));
        assert!(js.contains("out.values['token']"));
        assert!(js.contains(RESULT_MARKER));
    }

    #[test]
    fn screenshot_step_is_wrapped_best_effort() {
        let js = session().render_script("home", &Script::new().goto("/").screenshot("landing"));
        assert!(js.contains("screenshot failed"));
        // The best-effort catch records the step as ok and does not rethrow
        assert!(js.contains("ok: true, error: 'screenshot skipped'"));
    }

    #[test]
    fn fill_form_preserves_iteration_order() {
        let script = Script::new().fill_form([
            ("input[name=name]", "Asha"),
            ("input[name=email]", "asha@example.com"),
            ("input[name=password]", "Secret!234"),
        ]);
        let names: Vec<String> = script.steps().iter().map(Step::name).collect();
        assert_eq!(
            names,
            vec![
                "fill:input[name=name]",
                "fill:input[name=email]",
                "fill:input[name=password]"
            ]
        );
    }

    #[test]
    fn outcome_extraction_survives_noisy_stdout() {
        let stdout = format!(
            "console noise\nfrom the page\n{RESULT_MARKER} {}\n",
            r#"{"steps":[{"name":"goto:/","ok":true}],"values":{"token":"abc"},"screenshots":[],"error":null}"#
        );
        let outcome = extract_outcome(&stdout).unwrap();
        assert!(outcome.ensure_ok().is_ok());
        assert_eq!(outcome.string_value("token"), Some("abc"));
    }

    #[test]
    fn failed_step_becomes_a_hard_error() {
        let stdout = format!(
            "{RESULT_MARKER} {}",
            r#"{"steps":[{"name":"fill:input[name=email]","ok":false,"error":"no element matches"}],"values":{},"screenshots":[],"error":"no element matches"}"#
        );
        let outcome = extract_outcome(&stdout).unwrap();
        let err = outcome.ensure_ok().unwrap_err();
        assert!(err.to_string().contains("fill:input[name=email]"));
        assert!(err.to_string().contains("no element matches"));
    }
}
