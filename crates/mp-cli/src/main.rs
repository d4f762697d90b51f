//! Metapool CLI - session-scoped meta-analysis workflows

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{clean, compute, create, init, ls, plot, report, show, upload};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Init(args) => init::execute(args, &cli.global).await,
        cli::Commands::Create(args) => create::execute(args, &cli.global).await,
        cli::Commands::Upload(args) => upload::execute(args, &cli.global).await,
        cli::Commands::Compute(args) => compute::execute(args, &cli.global).await,
        cli::Commands::Plot(args) => plot::execute(args, &cli.global).await,
        cli::Commands::Report(args) => report::execute(args, &cli.global).await,
        cli::Commands::Show(args) => show::execute(args, &cli.global).await,
        cli::Commands::Ls(args) => ls::execute(args, &cli.global).await,
        cli::Commands::Clean(args) => clean::execute(args, &cli.global).await,
    }
}
