use std::fmt::Write as _;

use anyhow::Result;
use chrono::SecondsFormat;
use clap::Args;
use dialoguer::console;

use crate::args::BaseArgs;
use crate::http::ApiClient;
use crate::projects::resolve_project;
use crate::traces::api::{CloudTraceApi, TraceClient, TraceQuery};
use crate::traces::shape;
use crate::ui::{
    apply_column_padding, header, print_with_pager, styled_table, truncate, with_spinner,
};

#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Trace ID to fetch
    #[arg(long = "trace-id", value_name = "ID")]
    trace_id: String,
}

pub async fn run(base: BaseArgs, args: ViewArgs) -> Result<()> {
    let project_id = resolve_project(&base).await?;
    let client = TraceClient::new(CloudTraceApi::new(ApiClient::for_traces(&base)?));

    let query = TraceQuery {
        project_id,
        trace_id: args.trace_id.trim().to_string(),
    };
    let trace = with_spinner("Loading trace...", client.get_trace(&query)).await?;
    let rows = shape::shape_spans(&trace);

    if base.json {
        println!("{}", serde_json::to_string(&rows)?);
        return Ok(());
    }

    let mut output = String::new();
    writeln!(
        output,
        "{} spans in trace {}\n",
        console::style(rows.len()),
        console::style(&trace.trace_id).bold()
    )?;

    let mut table = styled_table();
    table.set_header(vec![
        header("Span ID"),
        header("Parent"),
        header("Service"),
        header("Operation"),
        header("Start time"),
        header("Duration"),
    ]);
    apply_column_padding(&mut table, (0, 4));

    for row in &rows {
        table.add_row(vec![
            row.span_id.clone(),
            row.parent_span_id.clone(),
            truncate(&row.service_name, 30),
            truncate(&row.operation_name, 60),
            row.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            format!("{:.3} ms", row.duration),
        ]);
    }

    write!(output, "{table}")?;
    print_with_pager(&output)?;

    Ok(())
}
