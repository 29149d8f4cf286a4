use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

pub const DEFAULT_API_URL: &str = "https://cloudtrace.googleapis.com";
pub const DEFAULT_RESOURCE_API_URL: &str = "https://cloudresourcemanager.googleapis.com";

#[derive(Debug, Clone, Args)]
pub struct BaseArgs {
    /// Output as JSON
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    /// Project to query (or via TQ_PROJECT)
    #[arg(short = 'p', long, env = "TQ_PROJECT", hide_env_values = true, global = true)]
    pub project: Option<String>,

    /// Bearer token for the trace service (or via TQ_ACCESS_TOKEN)
    #[arg(long, env = "TQ_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Override trace API URL (or via TQ_API_URL)
    #[arg(long, env = "TQ_API_URL", hide_env_values = true, global = true)]
    pub api_url: Option<String>,

    /// Override resource-manager API URL (or via TQ_RESOURCE_API_URL)
    #[arg(
        long,
        env = "TQ_RESOURCE_API_URL",
        hide_env_values = true,
        global = true
    )]
    pub resource_api_url: Option<String>,

    /// Path to a .env file to load before running commands.
    #[arg(long, env = "TQ_ENV_FILE", hide_env_values = true)]
    pub env_file: Option<PathBuf>,
}

impl BaseArgs {
    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .context("missing access token: pass --token or set TQ_ACCESS_TOKEN")
    }

    /// Explicitly configured project, if any.
    pub fn project(&self) -> Option<String> {
        self.project
            .as_deref()
            .map(str::trim)
            .filter(|project| !project.is_empty())
            .map(str::to_string)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn resource_api_url(&self) -> &str {
        self.resource_api_url
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_API_URL)
    }
}

#[derive(Debug, Clone, Args)]
pub struct CLIArgs<T: Args> {
    #[command(flatten)]
    pub base: BaseArgs,

    #[command(flatten)]
    pub args: T,
}
