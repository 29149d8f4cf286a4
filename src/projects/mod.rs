use anyhow::Result;
use clap::{Args, Subcommand};

use crate::args::BaseArgs;
use crate::http::ApiClient;
use crate::ui::select_project_interactive;

pub mod api;

mod list;

#[derive(Debug, Clone, Args)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    command: ProjectsCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum ProjectsCommand {
    /// List accessible projects
    List(list::ListArgs),
}

pub async fn run(base: BaseArgs, args: ProjectsArgs) -> Result<()> {
    match args.command {
        ProjectsCommand::List(list) => list::run(base, list).await,
    }
}

/// Resolve the project to query: the explicit flag/env value when set,
/// otherwise an interactive selection over the visible projects.
pub async fn resolve_project(base: &BaseArgs) -> Result<String> {
    if let Some(project) = base.project() {
        return Ok(project);
    }
    let client = ApiClient::for_resources(base)?;
    select_project_interactive(&client).await
}
