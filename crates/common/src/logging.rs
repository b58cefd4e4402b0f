//! Logging setup shared by the binaries

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{Error, Result};

/// Log file written inside the logs directory
pub const LOG_FILE: &str = "execution.log";

/// Verbosity as configured through `LOG_LEVEL`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    All,
    #[default]
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// `all|info|warning|error`; anything else, including unset, is debug.
    pub fn from_env_value(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("all") => LogLevel::All,
            Some("info") => LogLevel::Info,
            Some("warning") => LogLevel::Warning,
            Some("error") => LogLevel::Error,
            _ => LogLevel::Debug,
        }
    }

    /// Directive understood by `EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::All => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Install the global subscriber: console output, plus `execution.log` under
/// `logs_dir` when given. `RUST_LOG` overrides `level`.
///
/// Returns the log file path, if one was opened.
pub fn init(level: LogLevel, logs_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let (file_layer, log_path) = match logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(LOG_FILE);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::InvalidConfig(format!("logging already initialized: {}", e)))?;

    if let Some(path) = &log_path {
        tracing::debug!(log_file = %path.display(), level = level.as_filter(), "Logger initialized");
    }
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("all"), LogLevel::All; "all")]
    #[test_case(Some("INFO"), LogLevel::Info; "info upper")]
    #[test_case(Some("warning"), LogLevel::Warning; "warning")]
    #[test_case(Some("error"), LogLevel::Error; "error")]
    #[test_case(Some("debug"), LogLevel::Debug; "debug")]
    #[test_case(Some("verbose"), LogLevel::Debug; "unknown")]
    #[test_case(None, LogLevel::Debug; "unset")]
    fn test_level_from_env(raw: Option<&str>, expected: LogLevel) {
        assert_eq!(LogLevel::from_env_value(raw), expected);
    }

    #[test]
    fn test_filter_directives() {
        assert_eq!(LogLevel::All.as_filter(), "trace");
        assert_eq!(LogLevel::Warning.as_filter(), "warn");
    }
}
