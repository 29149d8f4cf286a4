use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use tracing_subscriber::EnvFilter;

mod args;
mod env;
mod http;
mod projects;
mod status;
mod traces;
mod ui;

use crate::args::CLIArgs;

const DEFAULT_DEV_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+dev");
const CLI_VERSION: &str = match option_env!("TQ_VERSION_STRING") {
    Some(version) => version,
    None => DEFAULT_DEV_VERSION,
};

#[derive(Debug, Parser)]
#[command(name = "tq", about = "Cloud Trace query CLI", version = CLI_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List and inspect traces
    Traces(CLIArgs<traces::TracesArgs>),
    /// List accessible projects
    Projects(CLIArgs<projects::ProjectsArgs>),
    /// Verify connectivity to the trace service
    Status(CLIArgs<status::StatusArgs>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let argv: Vec<OsString> = std::env::args_os().collect();
    env::bootstrap_from_args(&argv)?;
    init_tracing();
    let cli = Cli::parse_from(argv);

    match cli.command {
        Commands::Traces(cmd) => traces::run(cmd.base, cmd.args).await?,
        Commands::Projects(cmd) => projects::run(cmd.base, cmd.args).await?,
        Commands::Status(cmd) => status::run(cmd.base, cmd.args).await?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
