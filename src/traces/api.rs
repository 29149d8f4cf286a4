use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use urlencoding::encode;

use crate::http::ApiClient;

/// Hard ceiling on the page size the list endpoint accepts.
const MAX_PAGE_SIZE: usize = 1000;
/// Lookback window for the connectivity test query.
const TEST_CONNECTION_WINDOW_DAYS: i64 = 30;
/// Self-imposed deadline for the connectivity test, independent of any
/// caller-supplied timeout.
const TEST_CONNECTION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Bounded trace-listing request. The command layer guarantees
/// `limit > 0` and `from <= to` before this reaches the client.
#[derive(Debug, Clone)]
pub struct TracesQuery {
    pub project_id: String,
    /// Native filter string as produced by the filter translator.
    pub filter: String,
    pub limit: usize,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone)]
pub struct TraceQuery {
    pub project_id: String,
    pub trace_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub spans: Vec<TraceSpan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSpan {
    #[serde(default)]
    pub span_id: String,
    #[serde(default)]
    pub parent_span_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl TraceSpan {
    /// Label value, with absent keys reading as empty.
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start_time.unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// One page of listing results as returned by the remote service.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracePage {
    #[serde(default)]
    pub traces: Vec<Trace>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// The remote trace-query capability, abstracted at the page level so the
/// pagination logic above it stays testable without a live endpoint.
pub trait TraceApi {
    async fn list_page(
        &self,
        query: &TracesQuery,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<TracePage>;

    async fn get_trace(&self, query: &TraceQuery) -> Result<Trace>;
}

/// HTTP implementation of [`TraceApi`] against the Cloud Trace v1 REST
/// surface.
pub struct CloudTraceApi {
    client: ApiClient,
}

impl CloudTraceApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl TraceApi for CloudTraceApi {
    async fn list_page(
        &self,
        query: &TracesQuery,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<TracePage> {
        let path = format!("/v1/projects/{}/traces", encode(&query.project_id));
        let mut params: Vec<(&str, String)> = vec![
            (
                "startTime",
                query
                    .time_range
                    .from
                    .to_rfc3339_opts(SecondsFormat::Nanos, true),
            ),
            (
                "endTime",
                query
                    .time_range
                    .to
                    .to_rfc3339_opts(SecondsFormat::Nanos, true),
            ),
            ("orderBy", "start desc".to_string()),
            ("view", "ROOTSPAN".to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if !query.filter.is_empty() {
            params.push(("filter", query.filter.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.client.get(&path, &params).await
    }

    async fn get_trace(&self, query: &TraceQuery) -> Result<Trace> {
        let path = format!(
            "/v1/projects/{}/traces/{}",
            encode(&query.project_id),
            encode(&query.trace_id)
        );
        self.client.get(&path, &[]).await
    }
}

/// Bounded, paginated retrieval over any [`TraceApi`]. Stateless between
/// calls; each invocation owns its own cursor and accumulator, so one
/// client may serve concurrent queries.
pub struct TraceClient<A> {
    api: A,
}

impl<A: TraceApi> TraceClient<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Retrieve traces matching the query, up to `limit` entries, most
    /// recent first (ordering delegated to the service).
    ///
    /// Pagination stops at the page containing the limit-th entry. A page
    /// failure after at least one entry has been accumulated returns the
    /// partial result without error; the dropped failure is only
    /// observable as a warning event.
    pub async fn list_traces(&self, query: &TracesQuery) -> Result<Vec<Trace>> {
        let page_size = query.limit.min(MAX_PAGE_SIZE);
        let started = Instant::now();

        let mut entries: Vec<Trace> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = match self.api.list_page(query, page_size, page_token.as_deref()).await {
                Ok(page) => page,
                Err(err) if entries.is_empty() => return Err(err.context("list entries")),
                Err(err) => {
                    warn!(
                        error = %err,
                        fetched = entries.len(),
                        "error fetching traces page, returning partial results"
                    );
                    break;
                }
            };

            entries.extend(page.traces);
            if entries.len() >= query.limit {
                entries.truncate(query.limit);
                break;
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(
            count = entries.len(),
            elapsed = ?started.elapsed(),
            "finished listing traces"
        );
        Ok(entries)
    }

    /// Retrieve a single trace by ID. An empty response is an error, as is
    /// any remote failure.
    pub async fn get_trace(&self, query: &TraceQuery) -> Result<Trace> {
        let started = Instant::now();
        let trace = self.api.get_trace(query).await.context("trace query")?;
        if trace.trace_id.is_empty() {
            bail!("trace query: empty response for trace {}", query.trace_id);
        }
        info!(
            trace_id = %query.trace_id,
            elapsed = ?started.elapsed(),
            "finished getting trace"
        );
        Ok(trace)
    }

    /// Issue a one-entry listing over a fixed lookback window to validate
    /// connectivity and credentials for the project.
    pub async fn test_connection(&self, project_id: &str) -> Result<()> {
        let started = Instant::now();
        let now = Utc::now();
        let query = TracesQuery {
            project_id: project_id.to_string(),
            filter: String::new(),
            limit: 1,
            time_range: TimeRange {
                from: now - Duration::days(TEST_CONNECTION_WINDOW_DAYS),
                to: now,
            },
        };

        let result =
            tokio::time::timeout(TEST_CONNECTION_TIMEOUT, self.api.list_page(&query, 1, None))
                .await;
        info!(elapsed = ?started.elapsed(), "finished connection test");

        let page = match result {
            Err(_) => bail!("timeout"),
            Ok(page) => page.context("list entries")?,
        };
        if page.traces.is_empty() {
            bail!("no entries");
        }
        Ok(())
    }
}
