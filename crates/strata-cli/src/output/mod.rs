use serde::Serialize;
use serde_json::Value;
use strata_config::ConfigError;
use strata_core::errors::{CoreError, ErrorKind};
use strata_db::error::DatabaseError;
use strata_model::error::ModelError;
use strata_synthesis::SynthesisError;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Error payload for failures that are known to have changed nothing.
#[derive(Debug, Serialize)]
pub struct FailurePayload {
    pub error: ErrorKind,
    pub message: String,
    pub mutated: bool,
}

/// Taxonomy kind of the first Strata error in the chain.
pub fn error_kind(error: &anyhow::Error) -> Option<ErrorKind> {
    error.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<SynthesisError>() {
            Some(e.kind())
        } else if let Some(e) = cause.downcast_ref::<DatabaseError>() {
            Some(e.kind())
        } else if let Some(e) = cause.downcast_ref::<ModelError>() {
            Some(e.kind())
        } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
            Some(e.kind())
        } else {
            cause.downcast_ref::<CoreError>().map(CoreError::kind)
        }
    })
}

#[must_use]
pub fn failure_payload(error: &anyhow::Error) -> Option<FailurePayload> {
    let kind = error_kind(error)?;
    kind.is_no_op().then(|| FailurePayload {
        error: kind,
        message: format!("{error:#}"),
        mutated: false,
    })
}

/// Print a failed command on stderr: a JSON payload when nothing was
/// mutated, the plain error chain otherwise.
pub fn report_failure(error: &anyhow::Error) {
    match failure_payload(error).and_then(|payload| serde_json::to_string(&payload).ok()) {
        Some(json) => eprintln!("{json}"),
        None => eprintln!("strata error: {error:#}"),
    }
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let options = table_options();

    let value = serde_json::to_value(value)?;
    match value {
        Value::Array(items) => render_array_table(&items),
        Value::Object(map) => {
            let headers = ["key", "value"];
            let mut entries = map.into_iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let rows = entries
                .into_iter()
                .map(|(key, value)| vec![key, value_to_cell(&value)])
                .collect::<Vec<_>>();
            Ok(table::render_entity_table(&headers, &rows, options))
        }
        scalar => {
            let headers = ["value"];
            let rows = vec![vec![value_to_cell(&scalar)]];
            Ok(table::render_entity_table(&headers, &rows, options))
        }
    }
}

fn table_options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_array_table(items: &[Value]) -> anyhow::Result<String> {
    let options = table_options();

    if items.is_empty() {
        return Ok(String::from("(no rows)"));
    }

    if !items.iter().all(Value::is_object) {
        let headers = ["value"];
        let rows = items
            .iter()
            .map(|item| vec![value_to_cell(item)])
            .collect::<Vec<_>>();
        return Ok(table::render_entity_table(&headers, &rows, options));
    }

    let mut headers = Vec::<String>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    if headers.is_empty() {
        return Ok(String::from("(no columns)"));
    }
    headers.sort();

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| {
                    map.get(header)
                        .map_or_else(|| String::from("-"), value_to_cell)
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    Ok(table::render_entity_table(&header_refs, &rows, options))
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}
