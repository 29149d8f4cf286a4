use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

use crate::args::BaseArgs;

const USER_AGENT: &str = concat!("tq/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 400;

/// Thin wrapper around a reqwest client bound to one API host and one
/// bearer token. The inner connection pool is the only long-lived remote
/// resource; it is created once per process and released on drop.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Client for the trace query endpoint.
    pub fn for_traces(base: &BaseArgs) -> Result<Self> {
        Self::new(base.api_url(), base.token()?)
    }

    /// Client for the resource-manager endpoint (project listing).
    pub fn for_resources(base: &BaseArgs) -> Result<Self> {
        Self::new(base.resource_api_url(), base.token()?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response from {path}"))?;

        if !status.is_success() {
            bail!("{path} returned {status}: {}", error_snippet(&body));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("failed to decode response from {path}"))
    }
}

fn error_snippet(body: &str) -> &str {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_snippet_truncates_long_bodies() {
        let short = "not found";
        assert_eq!(error_snippet(short), "not found");

        let long = "x".repeat(1000);
        assert_eq!(error_snippet(&long).len(), MAX_ERROR_BODY_CHARS);
    }
}
