//! allure-env command
//!
//! Writes the environment report at the start of a run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use qaflow_common::{EnvironmentReport, FrameworkConfig};

use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Args, Debug, Clone, Default)]
pub struct AllureEnvArgs {
    /// Allure results directory [default: from configuration]
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct EnvironmentDisplay {
    pub file: String,
    pub properties: Vec<(String, String)>,
}

impl TableDisplay for EnvironmentDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["File", "Properties"]
    }

    fn row(&self) -> Vec<String> {
        let props = self
            .properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n");
        vec![self.file.clone(), props]
    }
}

pub fn execute(
    args: AllureEnvArgs,
    config: &FrameworkConfig,
    cwd: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let results_dir = cwd.join(args.results_dir.unwrap_or_else(|| config.results_dir.clone()));

    info!("========== Test Run Started ==========");
    let report = EnvironmentReport::collect();
    let path = report
        .write_to(&results_dir)
        .with_context(|| format!("cannot write environment report to {}", results_dir.display()))?;

    let display = EnvironmentDisplay {
        file: path.display().to_string(),
        properties: report
            .properties()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    };
    print_item(&display, format);

    Ok(path)
}
