//! clean-env: collapse duplicate keys in Allure's environment.properties
//!
//! Exit codes: 0 on success, 2 when the file is missing or anything fails.

use anyhow::Result;
use clap::Parser;

use qaflow_cli::commands::clean_env::{self, CleanEnvArgs};
use qaflow_cli::{exit_code, GlobalArgs};

#[derive(Parser)]
#[command(name = "clean-env")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: CleanEnvArgs,

    #[command(flatten)]
    global: GlobalArgs,
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = cli.global.load_config(&cwd)?;
    cli.global
        .init_logging(config.log_level, Some(&cwd.join(&config.logs_dir)))?;
    clean_env::execute(cli.args, &config, &cwd, cli.global.format)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(exit_code(run(cli)));
}
