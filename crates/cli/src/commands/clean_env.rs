//! clean-env command
//!
//! Collapses duplicate keys in Allure's `environment.properties`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use qaflow_common::{FrameworkConfig, PropertiesReconciler, ReconcileReport};

use crate::output::{print_item, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Args, Debug, Clone, Default)]
pub struct CleanEnvArgs {
    /// Properties file, relative to the working directory
    /// [default: <results_dir>/environment.properties]
    pub path: Option<PathBuf>,

    /// Never replace the live file: write only if it no longer exists
    #[arg(long)]
    pub keep_existing: bool,
}

/// Report display wrapper
#[derive(Serialize)]
pub struct ReportDisplay {
    pub path: String,
    pub backup: String,
    pub keys: usize,
    pub duplicates_removed: usize,
    pub written: bool,
}

impl From<&ReconcileReport> for ReportDisplay {
    fn from(r: &ReconcileReport) -> Self {
        Self {
            path: r.path.display().to_string(),
            backup: r.backup_path.display().to_string(),
            keys: r.keys,
            duplicates_removed: r.duplicates_removed,
            written: r.written,
        }
    }
}

impl TableDisplay for ReportDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["File", "Backup", "Keys", "Duplicates Removed", "Written"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.path.clone(),
            self.backup.clone(),
            self.keys.to_string(),
            self.duplicates_removed.to_string(),
            self.written.to_string(),
        ]
    }
}

const UNTOUCHED_WARNING: &str = "environment.properties left untouched: \
     --keep-existing was given or overwrite_existing = false is configured.";

/// Resolve the target file against `cwd`.
pub fn resolve_path(args: &CleanEnvArgs, config: &FrameworkConfig, cwd: &Path) -> PathBuf {
    match &args.path {
        Some(path) => cwd.join(path),
        None => cwd.join(config.environment_file()),
    }
}

pub fn execute(
    args: CleanEnvArgs,
    config: &FrameworkConfig,
    cwd: &Path,
    format: OutputFormat,
) -> Result<ReconcileReport> {
    let path = resolve_path(&args, config, cwd);
    debug!("Reconciling {}", path.display());

    let overwrite = config.overwrite_existing && !args.keep_existing;
    let report = PropertiesReconciler::new()
        .overwrite_existing(overwrite)
        .reconcile(&path)
        .with_context(|| format!("environment.properties not cleaned: {}", path.display()))?;

    if report.written {
        print_success("Cleaned environment.properties, duplicates collapsed.");
    } else {
        print_warning(UNTOUCHED_WARNING);
    }
    print_item(&ReportDisplay::from(&report), format);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_path_from_config() {
        let config = FrameworkConfig::default();
        let path = resolve_path(&CleanEnvArgs::default(), &config, Path::new("/work"));
        assert_eq!(path, PathBuf::from("/work/allure-results/environment.properties"));
    }

    #[test]
    fn test_explicit_path_is_relative_to_cwd() {
        let args = CleanEnvArgs {
            path: Some(PathBuf::from("out/env.properties")),
            ..Default::default()
        };
        let path = resolve_path(&args, &FrameworkConfig::default(), Path::new("/work"));
        assert_eq!(path, PathBuf::from("/work/out/env.properties"));
    }

    #[test]
    fn test_execute_cleans_file() {
        let tmp = TempDir::new().unwrap();
        let results = tmp.path().join("allure-results");
        std::fs::create_dir_all(&results).unwrap();
        std::fs::write(
            results.join("environment.properties"),
            "Browser Name=chromium\nBrowserVersionChromium=120.0\nBrowserVersion=119.0",
        )
        .unwrap();

        let report = execute(
            CleanEnvArgs::default(),
            &FrameworkConfig::default(),
            tmp.path(),
            OutputFormat::Json,
        )
        .unwrap();

        assert!(report.written);
        assert_eq!(
            std::fs::read_to_string(&report.path).unwrap(),
            "Browser Name=chromium\nBrowserVersion=120.0"
        );
    }

    #[test]
    fn test_configured_keep_existing_leaves_file() {
        let tmp = TempDir::new().unwrap();
        let results = tmp.path().join("allure-results");
        std::fs::create_dir_all(&results).unwrap();
        let original = "Host Name=a\nHost Name=b";
        std::fs::write(results.join("environment.properties"), original).unwrap();

        let config = FrameworkConfig {
            overwrite_existing: false,
            ..Default::default()
        };
        let report = execute(CleanEnvArgs::default(), &config, tmp.path(), OutputFormat::Plain).unwrap();

        assert!(!report.written);
        assert_eq!(std::fs::read_to_string(&report.path).unwrap(), original);
        assert!(UNTOUCHED_WARNING.contains("--keep-existing"));
        assert!(UNTOUCHED_WARNING.contains("overwrite_existing = false"));
    }

    #[test]
    fn test_execute_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        let err = execute(
            CleanEnvArgs::default(),
            &FrameworkConfig::default(),
            tmp.path(),
            OutputFormat::Plain,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<qaflow_common::Error>(),
            Some(qaflow_common::Error::FileNotFound { .. })
        ));
    }
}
