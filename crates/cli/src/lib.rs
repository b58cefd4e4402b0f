//! qaflow CLI
//!
//! Command-line tools run around a test run: `allure-env` before it,
//! `clean-env` after it.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use qaflow_common::{logging, FrameworkConfig, LogLevel};

/// Options shared by every binary
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Framework configuration file
    #[arg(long, default_value = qaflow_common::config::CONFIG_FILE)]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "plain")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load configuration (file, then environment) relative to `cwd`.
    pub fn load_config(&self, cwd: &Path) -> Result<FrameworkConfig> {
        let path = cwd.join(&self.config);
        FrameworkConfig::load_with_env(&path)
            .with_context(|| format!("cannot load configuration from {}", path.display()))
    }

    /// Install logging at `level`, or debug with `--verbose`.
    pub fn init_logging(&self, level: LogLevel, logs_dir: Option<&Path>) -> Result<()> {
        let level = if self.verbose { LogLevel::Debug } else { level };
        logging::init(level, logs_dir)?;
        Ok(())
    }
}

/// Print the error and map it to the failure exit code.
pub fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{:#}", e);
            output::print_error(&format!("Error: {:#}", e));
            2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_exit_code_success() {
        assert_eq!(exit_code(Ok(())), 0);
    }

    #[test]
    fn test_exit_code_failure() {
        assert_eq!(exit_code(Err(anyhow!("environment.properties not found"))), 2);
    }

    #[test]
    fn test_exit_code_missing_file() {
        let err = qaflow_common::Error::FileNotFound {
            path: PathBuf::from("allure-results/environment.properties"),
        };
        assert_eq!(exit_code(Err(err.into())), 2);
    }
}
