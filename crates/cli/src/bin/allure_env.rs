//! allure-env: write the environment report for a new test run

use anyhow::Result;
use clap::Parser;

use qaflow_cli::commands::allure_env::{self, AllureEnvArgs};
use qaflow_cli::{exit_code, GlobalArgs};

#[derive(Parser)]
#[command(name = "allure-env")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: AllureEnvArgs,

    #[command(flatten)]
    global: GlobalArgs,
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = cli.global.load_config(&cwd)?;
    cli.global
        .init_logging(config.log_level, Some(&cwd.join(&config.logs_dir)))?;
    allure_env::execute(cli.args, &config, &cwd, cli.global.format)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(exit_code(run(cli)));
}
