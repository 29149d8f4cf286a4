use std::io::IsTerminal;

use anyhow::{bail, Result};
use dialoguer::{theme::ColorfulTheme, FuzzySelect};

use crate::{http::ApiClient, projects::api, ui::with_spinner};

/// Fuzzy select from a list of items. Requires TTY.
pub fn fuzzy_select<T: ToString>(prompt: &str, items: &[T]) -> Result<usize> {
    if !std::io::stdin().is_terminal() {
        bail!("interactive mode requires TTY; pass --project or set TQ_PROJECT");
    }

    if items.is_empty() {
        bail!("no items to select from");
    }

    let labels: Vec<String> = items.iter().map(|i| i.to_string()).collect();

    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(selection)
}

/// Interactive selector over the visible projects
pub async fn select_project_interactive(client: &ApiClient) -> Result<String> {
    // Bail before fetching anything; a non-interactive caller gets the
    // actionable error instead of a wasted listing call.
    if !std::io::stdin().is_terminal() {
        bail!("interactive mode requires TTY; pass --project or set TQ_PROJECT");
    }

    let mut projects = with_spinner("Loading projects...", api::list_projects(client)).await?;

    if projects.is_empty() {
        bail!("no projects visible to this token");
    }

    projects.sort();
    let selection = fuzzy_select("Select project", &projects)?;
    Ok(projects.swap_remove(selection))
}
