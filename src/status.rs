use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::args::BaseArgs;
use crate::http::ApiClient;
use crate::projects::resolve_project;
use crate::traces::api::{CloudTraceApi, TraceClient};
use crate::ui::{print_command_status, with_spinner, CommandStatus};

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {}

#[derive(Serialize)]
struct StatusOutput {
    project: String,
    ok: bool,
    error: Option<String>,
}

pub async fn run(base: BaseArgs, _args: StatusArgs) -> Result<()> {
    let project = resolve_project(&base).await?;
    let client = TraceClient::new(CloudTraceApi::new(ApiClient::for_traces(&base)?));

    let result = with_spinner("Testing connection...", client.test_connection(&project)).await;

    if base.json {
        let output = StatusOutput {
            project: project.clone(),
            ok: result.is_ok(),
            error: result.as_ref().err().map(|err| format!("{err:#}")),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        if result.is_err() {
            bail!("failed to run test query against project {project}");
        }
        return Ok(());
    }

    match result {
        Ok(()) => {
            print_command_status(
                CommandStatus::Success,
                &format!("Successfully queried traces from project {project}"),
            );
            Ok(())
        }
        Err(err) => {
            print_command_status(
                CommandStatus::Error,
                &format!("failed to run test query: {err:#}"),
            );
            bail!("connection test failed for project {project}")
        }
    }
}
