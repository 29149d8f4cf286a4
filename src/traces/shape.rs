use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::traces::api::{Trace, TraceSpan};

pub const SERVICE_PREFIX: &str = "service.";
pub const GAE_SERVICE_PREFIX: &str = "g.co/gae/app/";
pub const OTEL_SERVICE_KEY: &str = "service.name";
pub const GAE_SERVICE_KEY: &str = "g.co/gae/app/module";
pub const GAE_SERVICE_VERSION_KEY: &str = "g.co/gae/app/version";
pub const OTEL_METHOD_KEY: &str = "http.method";
pub const CLOUD_TRACE_METHOD_KEY: &str = "/http/method";
pub const HTTP_STATUS_CODE_KEY: &str = "/http/status_code";

/// Row-per-span detail view of a single trace. The serialized field
/// names are the contract the presentation layer binds to.
#[derive(Debug, Clone, Serialize)]
pub struct SpanRow {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
    #[serde(rename = "parentSpanID")]
    pub parent_span_id: String,
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "operationName")]
    pub operation_name: String,
    #[serde(rename = "serviceTags")]
    pub service_tags: Value,
    pub tags: Value,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    /// Milliseconds, microsecond precision. Negative values pass through.
    pub duration: f64,
}

/// Row-per-trace summary view, derived from each trace's root span only.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSummaryRow {
    #[serde(rename = "Trace ID")]
    pub trace_id: String,
    #[serde(rename = "Trace name")]
    pub trace_name: String,
    #[serde(rename = "Start time")]
    pub start_time: DateTime<Utc>,
    /// Milliseconds.
    #[serde(rename = "Latency")]
    pub latency_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
struct Tag {
    key: String,
    value: String,
}

/// Service name for a span: the standardized label with the legacy GAE
/// label as fallback. Absent and empty values are treated the same.
pub fn service_name(span: &TraceSpan) -> &str {
    let name = span.label(OTEL_SERVICE_KEY);
    if name.is_empty() {
        span.label(GAE_SERVICE_KEY)
    } else {
        name
    }
}

fn http_method(span: &TraceSpan) -> &str {
    let method = span.label(OTEL_METHOD_KEY);
    if method.is_empty() {
        span.label(CLOUD_TRACE_METHOD_KEY)
    } else {
        method
    }
}

/// Descriptive span name: `HTTP <method> <name>` when a method label is
/// present, otherwise just the span name.
pub fn operation_name(span: &TraceSpan) -> String {
    let method = http_method(span);
    if method.is_empty() {
        span.name.clone()
    } else {
        format!("HTTP {method} {}", span.name)
    }
}

/// Descriptive trace name: the operation name additionally prefixed with
/// the service name, each segment omitted when empty.
pub fn trace_name(span: &TraceSpan) -> String {
    let service = service_name(span);
    let service_part = if service.is_empty() {
        String::new()
    } else {
        format!("{service}: ")
    };

    let method = http_method(span);
    let method_part = if method.is_empty() {
        String::new()
    } else {
        format!("HTTP {method} ")
    };

    format!("{service_part}{method_part}{}", span.name)
}

/// Split span labels into service tags and span tags, serialized as JSON
/// arrays of `{key, value}` objects. An empty set serializes as `[]`.
fn partition_tags(span: &TraceSpan) -> anyhow::Result<(Value, Value)> {
    let mut service_tags: Vec<Tag> = Vec::new();
    let mut span_tags: Vec<Tag> = Vec::new();
    for (key, value) in &span.labels {
        let tag = Tag {
            key: key.clone(),
            value: value.clone(),
        };
        if key.starts_with(SERVICE_PREFIX) || key.starts_with(GAE_SERVICE_PREFIX) {
            service_tags.push(tag);
        } else {
            span_tags.push(tag);
        }
    }
    Ok((
        serde_json::to_value(service_tags)?,
        serde_json::to_value(span_tags)?,
    ))
}

fn duration_ms(span: &TraceSpan) -> f64 {
    (span.end().timestamp_micros() - span.start().timestamp_micros()) as f64 / 1000.0
}

/// Shape every span of a trace into detail rows, in input order. A span
/// whose tags cannot be shaped is dropped with a warning; the rest of the
/// trace is unaffected.
pub fn shape_spans(trace: &Trace) -> Vec<SpanRow> {
    let mut rows = Vec::with_capacity(trace.spans.len());
    for span in &trace.spans {
        let (service_tags, tags) = match partition_tags(span) {
            Ok(parts) => parts,
            Err(err) => {
                warn!(
                    error = %err,
                    span_id = %span.span_id,
                    "failed shaping span tags, skipping span"
                );
                continue;
            }
        };

        rows.push(SpanRow {
            trace_id: trace.trace_id.clone(),
            span_id: span.span_id.clone(),
            parent_span_id: span
                .parent_span_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| "0".to_string()),
            service_name: service_name(span).to_string(),
            operation_name: operation_name(span),
            service_tags,
            tags,
            start_time: span.start(),
            duration: duration_ms(span),
        });
    }
    rows
}

/// Shape traces into summary rows using each trace's first span as the
/// root. Traces without spans contribute no row.
pub fn shape_trace_table(traces: &[Trace]) -> Vec<TraceSummaryRow> {
    let mut rows = Vec::with_capacity(traces.len());
    for trace in traces {
        let Some(root) = trace.spans.first() else {
            warn!(trace_id = %trace.trace_id, "trace has no spans, skipping");
            continue;
        };

        rows.push(TraceSummaryRow {
            trace_id: trace.trace_id.clone(),
            trace_name: trace_name(root),
            start_time: root.start(),
            latency_ms: root.end().timestamp_millis() - root.start().timestamp_millis(),
        });
    }
    rows
}
