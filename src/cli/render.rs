// Plain-text rendering for the CLI
//
// Tables and detail blocks mirroring what the dashboard shows.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::client::ViewState;
use crate::registry::ExperimentRecord;

/// Shown in place of an empty table
pub const EMPTY_LIST: &str = "No experiments found. Create your first experiment!";

const HEADERS: [&str; 6] = ["NAME", "NAMESPACE", "TYPE", "STATUS", "START TIME", "END TIME"];

fn timestamp(value: Option<DateTime<Utc>>, missing: &str) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| missing.to_string())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Strings print bare, anything else as compact JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render records as an aligned table
#[must_use]
pub fn list_table(records: &[ExperimentRecord]) -> String {
    if records.is_empty() {
        return EMPTY_LIST.to_string();
    }

    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|record| {
            [
                or_dash(record.name()).to_string(),
                or_dash(record.namespace()).to_string(),
                or_dash(record.definition.experiment_type()).to_string(),
                record.status.to_string(),
                timestamp(record.start_time, "-"),
                timestamp(record.end_time, "-"),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    for line in std::iter::once(header.as_slice()).chain(rows.iter().map(|row| row.as_slice())) {
        let cells: Vec<String> = line
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// Render one record as a labelled block
#[must_use]
pub fn detail(record: &ExperimentRecord) -> String {
    let definition = &record.definition;
    let parameters = match definition.parameters() {
        Some(parameters) if !parameters.is_empty() => parameters
            .iter()
            .map(|(key, value)| format!("{}={}", key, plain(value)))
            .collect::<Vec<_>>()
            .join(", "),
        _ => "-".to_string(),
    };
    let message = if record.message.is_empty() {
        "No message"
    } else {
        record.message.as_str()
    };

    let lines = [
        format!("Experiment: {}", or_dash(record.name())),
        format!("Namespace:  {}", or_dash(record.namespace())),
        format!("Type:       {}", or_dash(definition.experiment_type())),
        format!("Status:     {}", record.status),
        format!(
            "Target:     {} {}",
            or_dash(definition.target_kind()),
            or_dash(definition.target_name())
        ),
        format!(
            "Duration:   {}",
            definition.get("duration").map_or_else(|| "-".to_string(), plain)
        ),
        format!("Parameters: {}", parameters),
        format!("Started:    {}", timestamp(record.start_time, "Not started")),
        format!("Completed:  {}", timestamp(record.end_time, "Not completed")),
        format!("Message:    {}", message),
    ];
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render a polled list, error banner first
#[must_use]
pub fn list_view(state: &ViewState<Vec<ExperimentRecord>>) -> String {
    let body = match &state.data {
        Some(records) => list_table(records),
        None if state.error.is_some() => String::new(),
        None => "Loading...\n".to_string(),
    };
    with_banner(state.error.as_deref(), body)
}

/// Render a polled detail view, error banner first
#[must_use]
pub fn detail_view(state: &ViewState<ExperimentRecord>) -> String {
    let body = match &state.data {
        Some(record) => detail(record),
        None if state.error.is_some() => String::new(),
        None => "Loading...\n".to_string(),
    };
    with_banner(state.error.as_deref(), body)
}

fn with_banner(error: Option<&str>, body: String) -> String {
    match error {
        Some(message) => format!("error: {}\n{}", message, body),
        None => body,
    }
}
