//! Harness configuration
//!
//! Defaults cover a local GiveBridge stack (frontend on 3000, API on 5000).
//! A `verify.yaml` file and `GIVEBRIDGE_*` environment variables override
//! them. Layout thresholds are tuning knobs, not constants: headless
//! rendering metrics differ from real browsers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Browser engine used for scenario suites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chromium" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" => Ok(BrowserKind::Webkit),
            other => Err(HarnessError::InvalidConfig(format!(
                "unknown browser '{other}' (expected chromium, firefox, or webkit)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A named device/browser class simulated by the compatibility suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserProfile {
    pub name: String,
    pub viewport: Viewport,
    pub user_agent: String,
}

/// Full harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Frontend base URL (the React app)
    pub frontend_url: String,

    /// Backend base URL (the REST API, without the /api prefix)
    pub backend_url: String,

    /// Per-server probe timeout in milliseconds
    pub probe_timeout_ms: u64,

    /// Navigation timeout (goto + wait condition)
    pub navigation_timeout_ms: u64,

    /// Per-field timeout when filling forms
    pub field_timeout_ms: u64,

    /// Mean-latency threshold for the API latency check
    pub latency_threshold_ms: u64,

    /// Page-load budget for the performance probe
    pub page_budget_ms: u64,

    /// Horizontal scrollWidth may exceed the viewport by this many pixels
    pub overflow_tolerance_px: u32,

    /// Text below this size is flagged as a legibility warning
    pub min_font_px: f64,

    /// Directory for JSON report artifacts
    pub report_dir: PathBuf,

    /// Directory for screenshot artifacts
    pub screenshot_dir: PathBuf,

    /// Known-good admin account used by login-dependent checks
    pub admin_email: String,
    pub admin_password: String,

    pub browser: BrowserKind,
    pub headless: bool,

    /// Profiles iterated by the compatibility suite
    pub profiles: Vec<BrowserProfile>,

    /// Frontend routes replayed across every profile
    pub critical_pages: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://127.0.0.1:3000".to_string(),
            backend_url: "http://127.0.0.1:5000".to_string(),
            probe_timeout_ms: 5_000,
            navigation_timeout_ms: 30_000,
            field_timeout_ms: 5_000,
            latency_threshold_ms: 5_000,
            page_budget_ms: 8_000,
            overflow_tolerance_px: 20,
            min_font_px: 12.0,
            report_dir: PathBuf::from("verify-results/reports"),
            screenshot_dir: PathBuf::from("verify-results/screenshots"),
            admin_email: "admin@givebridge.test".to_string(),
            admin_password: "AdminPass!234".to_string(),
            browser: BrowserKind::Chromium,
            headless: true,
            profiles: default_profiles(),
            critical_pages: default_pages(),
        }
    }
}

fn default_profiles() -> Vec<BrowserProfile> {
    let ua_desktop = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                      (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    let ua_ipad = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
                   (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    let ua_iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
                     (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    let ua_android = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
                      (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

    vec![
        BrowserProfile {
            name: "desktop-chrome".into(),
            viewport: Viewport { width: 1920, height: 1080 },
            user_agent: ua_desktop.into(),
        },
        BrowserProfile {
            name: "laptop".into(),
            viewport: Viewport { width: 1366, height: 768 },
            user_agent: ua_desktop.into(),
        },
        BrowserProfile {
            name: "tablet-ipad".into(),
            viewport: Viewport { width: 768, height: 1024 },
            user_agent: ua_ipad.into(),
        },
        BrowserProfile {
            name: "mobile-iphone".into(),
            viewport: Viewport { width: 390, height: 844 },
            user_agent: ua_iphone.into(),
        },
        BrowserProfile {
            name: "mobile-android".into(),
            viewport: Viewport { width: 360, height: 800 },
            user_agent: ua_android.into(),
        },
    ]
}

fn default_pages() -> Vec<String> {
    ["/", "/login", "/register", "/donate", "/marketplace", "/blogs"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl HarnessConfig {
    /// Load from an optional YAML file, then apply environment overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                serde_yaml::from_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("GIVEBRIDGE_FRONTEND_URL") {
            self.frontend_url = url;
        }
        if let Ok(url) = std::env::var("GIVEBRIDGE_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Ok(email) = std::env::var("GIVEBRIDGE_ADMIN_EMAIL") {
            self.admin_email = email;
        }
        if let Ok(password) = std::env::var("GIVEBRIDGE_ADMIN_PASSWORD") {
            self.admin_password = password;
        }
    }

    /// Profile names double as report grouping keys and artifact filename
    /// components, so duplicates would silently merge results.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for profile in &self.profiles {
            if !seen.insert(profile.name.as_str()) {
                return Err(HarnessError::InvalidConfig(format!(
                    "duplicate browser profile name '{}'",
                    profile.name
                )));
            }
        }
        if self.profiles.is_empty() {
            return Err(HarnessError::InvalidConfig(
                "at least one browser profile is required".into(),
            ));
        }
        if self.critical_pages.is_empty() {
            return Err(HarnessError::InvalidConfig(
                "at least one critical page is required".into(),
            ));
        }
        Ok(())
    }

    /// Backend API root, e.g. `http://127.0.0.1:5000/api`.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.backend_url.trim_end_matches('/'))
    }

    /// Absolute frontend URL for a route path.
    pub fn page_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.frontend_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        HarnessConfig::default().validate().unwrap();
    }

    #[test]
    fn duplicate_profile_names_are_rejected() {
        let mut config = HarnessConfig::default();
        let mut dup = config.profiles[0].clone();
        dup.viewport = Viewport { width: 100, height: 100 };
        config.profiles.push(dup);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate browser profile"));
    }

    #[test]
    fn yaml_overrides_merge_onto_defaults() {
        let yaml = r#"
frontend_url: http://127.0.0.1:4000
overflow_tolerance_px: 32
critical_pages:
  - /
  - /donate
"#;
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.frontend_url, "http://127.0.0.1:4000");
        assert_eq!(config.overflow_tolerance_px, 32);
        assert_eq!(config.critical_pages, vec!["/", "/donate"]);
        // Untouched fields keep their defaults
        assert_eq!(config.backend_url, "http://127.0.0.1:5000");
        assert_eq!(config.profiles.len(), 5);
    }

    #[test]
    fn api_base_and_page_url_normalize_slashes() {
        let mut config = HarnessConfig::default();
        config.backend_url = "http://localhost:5000/".into();
        config.frontend_url = "http://localhost:3000/".into();
        assert_eq!(config.api_base(), "http://localhost:5000/api");
        assert_eq!(config.page_url("/donate"), "http://localhost:3000/donate");
        assert_eq!(config.page_url("donate"), "http://localhost:3000/donate");
    }
}
