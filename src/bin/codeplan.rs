//! Codeplan CLI Binary
//!
//! Command-line interface for the plan-driven code change pipeline.

use anyhow::Context;
use clap::Parser;
use codeplan::logging::init_logging;
use codeplan::tooling::cli::{Cli, CliContext};
use std::process;

fn run(cli: Cli) -> anyhow::Result<String> {
    let context = CliContext::new(cli.workspace.clone(), cli.config.clone())
        .context("failed to load configuration")?;
    init_logging(Some(&cli.logging_config(&context.config().logging)))
        .context("failed to initialize logging")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let output = runtime.block_on(context.execute(&cli.command))?;
    Ok(output)
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
