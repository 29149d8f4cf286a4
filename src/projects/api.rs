use anyhow::Result;
use serde::Deserialize;

use crate::http::ApiClient;

/// Lifecycle states that mean a project is going away and should not be
/// offered for querying.
const DELETION_STATES: [&str; 2] = ["DELETE_REQUESTED", "DELETE_IN_PROGRESS"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub lifecycle_state: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    projects: Vec<Project>,
}

/// List the IDs of all visible projects, excluding projects pending or
/// undergoing deletion.
pub async fn list_projects(client: &ApiClient) -> Result<Vec<String>> {
    let list: ListResponse = client.get("/v1/projects", &[]).await?;
    Ok(visible_project_ids(list.projects))
}

fn visible_project_ids(projects: Vec<Project>) -> Vec<String> {
    projects
        .into_iter()
        .filter(|p| !DELETION_STATES.contains(&p.lifecycle_state.as_str()))
        .map(|p| p.project_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, state: &str) -> Project {
        Project {
            project_id: id.to_string(),
            lifecycle_state: state.to_string(),
        }
    }

    #[test]
    fn visible_project_ids_excludes_deletion_states() {
        let projects = vec![
            project("active", "ACTIVE"),
            project("requested", "DELETE_REQUESTED"),
            project("in-progress", "DELETE_IN_PROGRESS"),
            project("unknown-state", "SOMETHING_ELSE"),
            project("stateless", ""),
        ];

        assert_eq!(
            visible_project_ids(projects),
            vec!["active", "unknown-state", "stateless"]
        );
    }

    #[test]
    fn visible_project_ids_handles_empty_input() {
        assert!(visible_project_ids(Vec::new()).is_empty());
    }
}
