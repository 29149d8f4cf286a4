use anyhow::Result;
use clap::{Args, Subcommand};

use crate::args::BaseArgs;

pub mod api;
pub mod filter;
pub mod shape;

mod list;
mod view;

#[derive(Debug, Clone, Args)]
pub struct TracesArgs {
    #[command(subcommand)]
    command: TracesCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum TracesCommand {
    /// List traces matching a filter as a summary table
    List(list::ListArgs),
    /// Fetch a single trace and show its spans
    View(view::ViewArgs),
}

pub async fn run(base: BaseArgs, args: TracesArgs) -> Result<()> {
    match args.command {
        TracesCommand::List(list) => list::run(base, list).await,
        TracesCommand::View(view) => view::run(base, view).await,
    }
}
