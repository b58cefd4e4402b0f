//! Run-scoped state and the `.env` side file
//!
//! Some side effects should happen once per test run, e.g. recording the
//! browser version the UI scenarios ran against. The "already done" flag
//! lives in a [`RunSession`] owned by the run's orchestrator, so each run
//! (and each unit test) starts clean.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::Result;

/// Dotenv key the detected browser version is stored under
pub const BROWSER_VERSION_VAR: &str = "BROWSER_VERSION";

/// Tag marking API scenarios, which never launch a browser
pub const API_TAG: &str = "@api";

/// Tag marking UI scenarios
pub const UI_TAG: &str = "@ui";

static USER_AGENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:Chrome|Chromium|CriOS|Edg|OPR)/([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+|[0-9]+\.[0-9]+\.[0-9]+|[0-9]+\.[0-9]+)",
        r"Firefox/([0-9]+\.[0-9]+(?:\.[0-9]+)?)",
        r"Version/([0-9]+\.[0-9]+(?:\.[0-9]+)?).*Safari",
        r"([0-9]+\.[0-9]+\.[0-9]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("user agent pattern compiles"))
    .collect()
});

/// Extract the browser version from a user-agent string.
pub fn detect_browser_version(user_agent: &str) -> Option<String> {
    USER_AGENT_PATTERNS
        .iter()
        .find_map(|re| re.captures(user_agent))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Set `key=value` in a dotenv file.
///
/// Existing assignments of `key` and blank lines are dropped; the new
/// assignment goes last. A missing file is created.
pub fn update_dot_env_key(path: &Path, key: &str, value: &str) -> Result<()> {
    let text = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let prefix = format!("{}=", key);
    let mut lines: Vec<String> = text
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with(&prefix))
        .map(str::to_string)
        .collect();
    lines.push(format!("{}={}", key, value));

    std::fs::write(path, lines.join("\n"))?;
    Ok(())
}

pub fn is_api_scenario<S: AsRef<str>>(tags: &[S]) -> bool {
    tags.iter().any(|t| t.as_ref() == API_TAG)
}

pub fn is_ui_scenario<S: AsRef<str>>(tags: &[S]) -> bool {
    tags.iter().any(|t| t.as_ref() == UI_TAG)
}

/// State shared by the scenarios of one run
#[derive(Debug, Clone)]
pub struct RunSession {
    dotenv_path: PathBuf,
    browser_version_recorded: bool,
}

impl RunSession {
    pub fn new(dotenv_path: impl Into<PathBuf>) -> Self {
        Self {
            dotenv_path: dotenv_path.into(),
            browser_version_recorded: false,
        }
    }

    pub fn dotenv_path(&self) -> &Path {
        &self.dotenv_path
    }

    pub fn browser_version_recorded(&self) -> bool {
        self.browser_version_recorded
    }

    /// Write `BROWSER_VERSION` unless this session already did.
    ///
    /// Returns whether the file was written. A failed write leaves the flag
    /// unset so a later scenario can try again.
    pub fn record_browser_version(&mut self, version: &str) -> Result<bool> {
        if self.browser_version_recorded {
            debug!("Browser version already recorded for this run");
            return Ok(false);
        }
        update_dot_env_key(&self.dotenv_path, BROWSER_VERSION_VAR, version)?;
        self.browser_version_recorded = true;
        info!(browser_version = version, "Detected and wrote BROWSER_VERSION to .env");
        Ok(true)
    }

    /// Record the browser version for a starting scenario.
    ///
    /// Only `@ui` scenarios record; the version is read from the page's user
    /// agent, `unknown` if it cannot be determined.
    pub fn observe_scenario<S: AsRef<str>>(
        &mut self,
        tags: &[S],
        user_agent: Option<&str>,
    ) -> Result<bool> {
        if !is_ui_scenario(tags) || self.browser_version_recorded {
            return Ok(false);
        }
        let version = user_agent
            .and_then(detect_browser_version)
            .unwrap_or_else(|| "unknown".to_string());
        self.record_browser_version(&version)
    }
}
