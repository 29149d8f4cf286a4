use std::fmt::Write as _;

use anyhow::Result;
use clap::Args;
use dialoguer::console;

use crate::args::BaseArgs;
use crate::http::ApiClient;
use crate::ui::{apply_column_padding, header, print_with_pager, styled_table, with_spinner};

use super::api;

#[derive(Debug, Clone, Args)]
pub struct ListArgs {}

pub async fn run(base: BaseArgs, _args: ListArgs) -> Result<()> {
    let client = ApiClient::for_resources(&base)?;
    let projects = with_spinner("Loading projects...", api::list_projects(&client)).await?;

    if base.json {
        println!("{}", serde_json::to_string(&projects)?);
        return Ok(());
    }

    let mut output = String::new();
    writeln!(
        output,
        "{} projects visible\n",
        console::style(projects.len())
    )?;

    let mut table = styled_table();
    table.set_header(vec![header("Project ID")]);
    apply_column_padding(&mut table, (0, 4));

    for project in &projects {
        table.add_row(vec![project]);
    }

    write!(output, "{table}")?;
    print_with_pager(&output)?;

    Ok(())
}
