use anyhow::Result;
use clap::Parser;
use colored::*;

mod aggregate;
mod api;
mod cli;
mod config;
mod extract;
mod pipeline;
mod reference;
mod timestamp;
mod workbook;

use cli::commands::{PipelineKind, handle_inspect_command, handle_pipeline_command};
use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let reference = cli.reference.as_deref();
    match cli.command {
        Commands::Qsa(args) => handle_pipeline_command(PipelineKind::Qsa, args, reference).await,
        Commands::Monitor(args) => handle_pipeline_command(PipelineKind::Monitor, args, reference).await,
        Commands::Weight(args) => handle_pipeline_command(PipelineKind::Weight, args, reference).await,
        Commands::Inspect(args) => handle_inspect_command(args),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("{} failed to load .env: {}", "warning:".yellow(), e);
        }
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);
    log::debug!("Starting bitable-cli {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        log::error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
