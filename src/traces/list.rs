use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use dialoguer::console;

use crate::args::BaseArgs;
use crate::http::ApiClient;
use crate::projects::resolve_project;
use crate::traces::api::{CloudTraceApi, TimeRange, TraceClient, TracesQuery};
use crate::traces::{filter, shape};
use crate::ui::{
    apply_column_padding, header, print_with_pager, styled_table, truncate, with_spinner,
};

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Friendly filter expression (for example: RootSpan:checkout MinLatency:100ms)
    #[arg(value_name = "FILTER")]
    filter: Vec<String>,

    /// Maximum number of traces to return
    #[arg(long, default_value_t = 50)]
    limit: usize,

    /// Relative lookback window (e.g. 30m, 1h, 7d)
    #[arg(long, default_value = "1h")]
    window: String,

    /// Absolute lower bound timestamp, RFC 3339 (overrides --window)
    #[arg(long)]
    since: Option<String>,

    /// Absolute upper bound timestamp, RFC 3339 (defaults to now)
    #[arg(long)]
    until: Option<String>,
}

pub async fn run(base: BaseArgs, args: ListArgs) -> Result<()> {
    if args.limit == 0 {
        bail!("--limit must be greater than 0");
    }

    // Translation happens before anything touches the network; a bad
    // filter never costs a remote call.
    let query_text = args.filter.join(" ");
    let native_filter = filter::translate(&query_text)?;
    let time_range = resolve_time_range(args.since.as_deref(), args.until.as_deref(), &args.window)?;

    let project_id = resolve_project(&base).await?;
    let client = TraceClient::new(CloudTraceApi::new(ApiClient::for_traces(&base)?));

    let query = TracesQuery {
        project_id: project_id.clone(),
        filter: native_filter,
        limit: args.limit,
        time_range,
    };
    let traces = with_spinner("Loading traces...", client.list_traces(&query)).await?;
    let rows = shape::shape_trace_table(&traces);

    if base.json {
        println!("{}", serde_json::to_string(&rows)?);
        return Ok(());
    }

    let mut output = String::new();
    writeln!(
        output,
        "{} traces found in {}\n",
        console::style(rows.len()),
        console::style(&project_id).bold()
    )?;

    let mut table = styled_table();
    table.set_header(vec![
        header("Trace ID"),
        header("Trace name"),
        header("Start time"),
        header("Latency"),
    ]);
    apply_column_padding(&mut table, (0, 4));

    for row in &rows {
        table.add_row(vec![
            row.trace_id.clone(),
            truncate(&row.trace_name, 60),
            row.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            format!("{} ms", row.latency_ms),
        ]);
    }

    write!(output, "{table}")?;
    print_with_pager(&output)?;

    Ok(())
}

fn resolve_time_range(
    since: Option<&str>,
    until: Option<&str>,
    window: &str,
) -> Result<TimeRange> {
    let to = match until {
        Some(ts) => parse_timestamp(ts)?,
        None => Utc::now(),
    };
    let from = match since {
        Some(ts) => parse_timestamp(ts)?,
        None => {
            let seconds = parse_duration_to_seconds(window)?;
            to - chrono::Duration::seconds(seconds as i64)
        }
    };
    if from > to {
        bail!("time range start {from} is after end {to}");
    }
    Ok(TimeRange { from, to })
}

fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp '{input}'"))
}

fn parse_duration_to_seconds(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("duration cannot be empty");
    }
    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(seconds);
    }

    // Split on the char boundary of the final character; the suffix may
    // be any Unicode scalar and must not panic mid-codepoint.
    let Some((suffix_start, unit)) = trimmed.char_indices().last() else {
        bail!("duration cannot be empty");
    };
    let value: u64 = trimmed[..suffix_start]
        .trim()
        .parse()
        .with_context(|| format!("invalid duration '{input}'"))?;
    let multiplier = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 60 * 60 * 24,
        _ => bail!("invalid duration '{input}'. expected suffix s/m/h/d"),
    };
    Ok(value.saturating_mul(multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_to_seconds_supports_units() {
        assert_eq!(parse_duration_to_seconds("90").expect("seconds"), 90);
        assert_eq!(parse_duration_to_seconds("15m").expect("minutes"), 900);
        assert_eq!(parse_duration_to_seconds("2h").expect("hours"), 7_200);
        assert_eq!(parse_duration_to_seconds("7d").expect("days"), 604_800);
    }

    #[test]
    fn parse_duration_to_seconds_rejects_unknown_suffix() {
        let err = parse_duration_to_seconds("5w").expect_err("should fail");
        assert!(err.to_string().contains("invalid duration"));

        // Multi-byte suffixes must produce the same error, not a panic.
        let err = parse_duration_to_seconds("5µ").expect_err("should fail");
        assert!(err.to_string().contains("invalid duration"));
    }

    #[test]
    fn resolve_time_range_uses_window_relative_to_until() {
        let range = resolve_time_range(None, Some("2025-01-01T01:00:00Z"), "1h")
            .expect("range from window");
        assert_eq!(
            range.from,
            parse_timestamp("2025-01-01T00:00:00Z").expect("timestamp")
        );
        assert_eq!(
            range.to,
            parse_timestamp("2025-01-01T01:00:00Z").expect("timestamp")
        );
    }

    #[test]
    fn resolve_time_range_prefers_since_over_window() {
        let range = resolve_time_range(
            Some("2025-01-01T00:00:00Z"),
            Some("2025-01-02T00:00:00Z"),
            "1h",
        )
        .expect("range from since");
        assert_eq!(
            range.from,
            parse_timestamp("2025-01-01T00:00:00Z").expect("timestamp")
        );
    }

    #[test]
    fn resolve_time_range_rejects_inverted_bounds() {
        let err = resolve_time_range(
            Some("2025-01-02T00:00:00Z"),
            Some("2025-01-01T00:00:00Z"),
            "1h",
        )
        .expect_err("should fail");
        assert!(err.to_string().contains("is after end"));
    }
}
