use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod ledger;
mod scenario;
mod token;

use cli::Cli;
use cli::context::{init_tracing, load_configuration};

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone())?;
    init_tracing(&config.global.logging)?;
    cli::run(cli, config).await
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    run().await
}
