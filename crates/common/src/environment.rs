//! Allure environment report
//!
//! Collects facts about the machine and browser a run executes on and writes
//! them to `environment.properties`, which Allure shows on the report front
//! page.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::browser::DisplayResolution;
use crate::env;
use crate::properties::ENVIRONMENT_FILE;
use crate::Result;

/// Facts shown in the report's Environment widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentReport {
    pub host_name: String,
    /// Windows domain; empty elsewhere
    pub domain: String,
    pub username: String,
    pub os_version: String,
    pub playwright_version: String,
    pub browser_name: String,
    pub display_resolution: DisplayResolution,
}

impl EnvironmentReport {
    /// Gather facts from the current process environment.
    pub fn collect() -> Self {
        Self::collect_with(|name| std::env::var(name).ok())
    }

    /// Gather facts, reading variables through `lookup`.
    pub fn collect_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host_name = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let username = lookup("USER")
            .or_else(|| lookup("USERNAME"))
            .unwrap_or_else(|| "unknown".to_string());

        let display_resolution = lookup("DISPLAY_RESOLUTION")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        Self {
            host_name,
            domain: env::parse_string_env(lookup("USERDOMAIN").as_deref()).unwrap_or_default(),
            username,
            os_version: format!(
                "{} {} ({})",
                std::env::consts::OS,
                std::env::consts::ARCH,
                std::env::consts::FAMILY
            ),
            playwright_version: env::parse_string_env(lookup("PLAYWRIGHT_VERSION").as_deref())
                .unwrap_or_else(|| "unknown".to_string()),
            browser_name: lookup("BROWSER")
                .map(|b| b.trim().to_lowercase())
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "chromium".to_string()),
            display_resolution,
        }
    }

    /// Ordered `(key, value)` pairs as they appear in the file
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Host Name", self.host_name.clone()),
            ("Domain", self.domain.clone()),
            ("Username", self.username.clone()),
            ("OS Version", self.os_version.clone()),
            ("Playwright Version", self.playwright_version.clone()),
            ("Browser Name", self.browser_name.clone()),
            ("Display Resolution", self.display_resolution.to_string()),
        ]
    }

    pub fn to_properties_string(&self) -> String {
        self.properties()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write `environment.properties` into `results_dir`, creating it if needed.
    pub fn write_to(&self, results_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(results_dir)?;
        let path = results_dir.join(ENVIRONMENT_FILE);
        std::fs::write(&path, self.to_properties_string())?;
        info!("Environment report written to: {}", path.display());
        Ok(path)
    }
}
