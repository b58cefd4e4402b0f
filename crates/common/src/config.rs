//! Framework configuration
//!
//! Settings come from an optional `qaflow.toml`, then the usual environment
//! variables (`BROWSER`, `HEADLESS`, `DEFAULT_TIMEOUT`, `LOG_LEVEL`) win.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::{Browser, DisplayResolution};
use crate::env::{self, DEFAULT_TIMEOUT};
use crate::logging::LogLevel;
use crate::properties::ENVIRONMENT_FILE;
use crate::session::RunSession;
use crate::Result;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "qaflow.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Browser for UI scenarios
    pub browser: Browser,

    /// Run browsers without a window
    pub headless: bool,

    /// Step and hook timeout in milliseconds
    pub default_timeout_ms: u64,

    pub log_level: LogLevel,

    /// Allure results directory
    pub results_dir: PathBuf,

    /// Directory holding `execution.log`
    pub logs_dir: PathBuf,

    /// Dotenv file that receives the detected browser version
    pub dotenv_path: PathBuf,

    /// Replace environment.properties in place after reconciling
    pub overwrite_existing: bool,

    /// Display size for contexts that are not maximized
    pub display_resolution: Option<DisplayResolution>,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            browser: Browser::default(),
            headless: true,
            default_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            log_level: LogLevel::default(),
            results_dir: PathBuf::from("allure-results"),
            logs_dir: PathBuf::from("logs"),
            dotenv_path: PathBuf::from(".env"),
            overwrite_existing: true,
            display_resolution: None,
        }
    }
}

impl FrameworkConfig {
    /// Load from a TOML file, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load, then apply environment overrides from the current process.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(env::var);
        Ok(config)
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("BROWSER") {
            self.browser = Browser::resolve(Some(&raw));
        }
        if let Some(raw) = lookup("HEADLESS") {
            self.headless = env::parse_boolean_env(Some(&raw), self.headless);
        }
        if let Some(raw) = lookup("DEFAULT_TIMEOUT") {
            self.default_timeout_ms = env::resolve_timeout(Some(&raw)).as_millis() as u64;
        }
        if let Some(raw) = lookup("LOG_LEVEL") {
            self.log_level = LogLevel::from_env_value(Some(&raw));
        }
        if let Some(res) = lookup("DISPLAY_RESOLUTION").and_then(|raw| raw.parse().ok()) {
            self.display_resolution = Some(res);
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn resolution(&self) -> DisplayResolution {
        self.display_resolution.unwrap_or_default()
    }

    /// `<results_dir>/environment.properties`
    pub fn environment_file(&self) -> PathBuf {
        self.results_dir.join(ENVIRONMENT_FILE)
    }

    /// Fresh session writing to `dotenv_path`, resolved against `cwd`.
    pub fn run_session(&self, cwd: &Path) -> RunSession {
        RunSession::new(cwd.join(&self.dotenv_path))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = FrameworkConfig::default();
        assert_eq!(config.browser, Browser::Chromium);
        assert_eq!(config.default_timeout(), Duration::from_secs(60));
        assert_eq!(
            config.environment_file(),
            PathBuf::from("allure-results/environment.properties")
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = FrameworkConfig::load(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, FrameworkConfig::default());
    }

    #[test]
    fn test_load_partial_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "browser = \"firefox\"\nresults_dir = \"out/allure\"\noverwrite_existing = false\n",
        )
        .unwrap();

        let config = FrameworkConfig::load(&path).unwrap();
        assert_eq!(config.browser, Browser::Firefox);
        assert_eq!(config.results_dir, PathBuf::from("out/allure"));
        assert!(!config.overwrite_existing);
        assert!(config.headless);
    }

    #[test]
    fn test_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "headless = \"sometimes\"").unwrap();
        assert!(matches!(
            FrameworkConfig::load(&path),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BROWSER", "safari"),
            ("HEADLESS", "no"),
            ("DEFAULT_TIMEOUT", "15"),
            ("LOG_LEVEL", "warning"),
            ("DISPLAY_RESOLUTION", "1280x720"),
        ]
        .into_iter()
        .collect();

        let mut config = FrameworkConfig::default();
        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.browser, Browser::Webkit);
        assert!(!config.headless);
        assert_eq!(config.default_timeout(), Duration::from_secs(15));
        assert_eq!(config.log_level, LogLevel::Warning);
        assert_eq!(config.resolution(), DisplayResolution { width: 1280, height: 720 });
    }

    #[test]
    fn test_run_session_uses_configured_dotenv() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("config")).unwrap();
        let config = FrameworkConfig {
            dotenv_path: PathBuf::from("config/.env.test"),
            ..Default::default()
        };

        let mut session = config.run_session(tmp.path());
        assert_eq!(session.dotenv_path(), tmp.path().join("config/.env.test"));
        assert!(session.record_browser_version("121.0").unwrap());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("config/.env.test")).unwrap(),
            "BROWSER_VERSION=121.0"
        );
    }

    #[test]
    fn test_save_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(CONFIG_FILE);
        let config = FrameworkConfig {
            browser: Browser::Edge,
            dotenv_path: PathBuf::from("config/.env.test"),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(FrameworkConfig::load(&path).unwrap(), config);
    }
}
