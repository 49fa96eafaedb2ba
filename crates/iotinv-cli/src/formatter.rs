//! Output formatters for views and operation results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use iotinv_core::{CascadeResult, Choice, DanglingRef, RowSet, Topology, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format the rows of a view or raw query.
    fn format_rows(&self, rows: &RowSet) -> String;

    /// Format both topology views.
    fn format_topology(&self, topology: &Topology) -> String;

    /// Format the outcome of a cascade delete.
    fn format_deleted(&self, result: &CascadeResult) -> String;

    /// Format an integrity audit.
    fn format_dangling(&self, refs: &[DanglingRef]) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

/// Human readable summary of a cascade delete.
pub fn describe_deleted(result: &CascadeResult) -> String {
    let target = format!("{} #{}", capitalize(result.entity.name()), result.id);
    if !result.found {
        return format!("{}: nothing to delete", target);
    }
    match result.dependent_count() {
        0 => format!("{} deleted", target),
        1 => format!("{} deleted along with 1 dependent row", target),
        n => format!("{} deleted along with {} dependent rows", target, n),
    }
}

/// `ID | Label` table shown when the user picks a row.
pub fn choices_table(choices: &[Choice]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Label"]);
    for choice in choices {
        table.add_row(vec![choice.id.to_string(), choice.label.clone()]);
    }
    table.to_string()
}

/// Upper-case the first letter.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_rows(&self, rows: &RowSet) -> String {
        if rows.is_empty() {
            return "No rows".to_string();
        }

        let mut table = Table::new();
        let headers: Vec<Cell> = rows.columns.iter().map(Cell::new).collect();
        table.set_header(headers);
        for row in &rows.rows {
            let cells: Vec<Cell> = row.iter().map(|value| Cell::new(value.to_string())).collect();
            table.add_row(cells);
        }
        format!("{}\n{} row(s)", table, rows.len())
    }

    fn format_topology(&self, topology: &Topology) -> String {
        topology.render()
    }

    fn format_deleted(&self, result: &CascadeResult) -> String {
        describe_deleted(result)
    }

    fn format_dangling(&self, refs: &[DanglingRef]) -> String {
        if refs.is_empty() {
            return "No dangling references".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["Entity", "Row", "Field", "Missing"]);
        for r in refs {
            table.add_row(vec![
                r.entity.name().to_string(),
                r.row.clone(),
                r.field.to_string(),
                format!("{} #{}", r.parent.name(), r.parent_id),
            ]);
        }
        format!("{}\n{} dangling reference(s)", table, refs.len())
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_rows(&self, rows: &RowSet) -> String {
        let objects: Vec<serde_json::Value> = rows
            .rows
            .iter()
            .map(|row| {
                let obj = rows
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| (name.clone(), value_to_json(value)))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::to_string_pretty(&objects).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_topology(&self, topology: &Topology) -> String {
        serde_json::to_string_pretty(topology).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_deleted(&self, result: &CascadeResult) -> String {
        serde_json::json!({
            "entity": result.entity,
            "id": result.id,
            "found": result.found,
            "affected": result.affected_count(),
            "dependents": result.dependent_count(),
            "message": describe_deleted(result),
        })
        .to_string()
    }

    fn format_dangling(&self, refs: &[DanglingRef]) -> String {
        serde_json::to_string_pretty(refs).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({
            "message": message
        })
        .to_string()
    }
}

/// CSV formatter.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_rows(&self, rows: &RowSet) -> String {
        let mut output = rows
            .columns
            .iter()
            .map(|c| csv_field(c))
            .collect::<Vec<_>>()
            .join(",");
        output.push('\n');

        for row in &rows.rows {
            let cells: Vec<String> = row.iter().map(format_value_csv).collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }
        output
    }

    fn format_topology(&self, topology: &Topology) -> String {
        let mut output = String::from("view,depth,line\n");
        let views = [
            ("infrastructure", Some(&topology.infrastructure)),
            ("applications", topology.applications.as_ref()),
        ];
        for (view, lines) in views {
            for line in lines.into_iter().flatten() {
                let text = line.to_string();
                output.push_str(&format!(
                    "{},{},{}\n",
                    view,
                    line.depth(),
                    csv_field(text.trim_start())
                ));
            }
        }
        output
    }

    fn format_deleted(&self, result: &CascadeResult) -> String {
        format!(
            "entity,id,found,affected,dependents\n{},{},{},{},{}",
            result.entity.name(),
            result.id,
            result.found,
            result.affected_count(),
            result.dependent_count()
        )
    }

    fn format_dangling(&self, refs: &[DanglingRef]) -> String {
        let mut output = String::from("entity,row,field,parent,parent_id\n");
        for r in refs {
            output.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(r.entity.name()),
                csv_field(&r.row),
                r.field,
                csv_field(r.parent.name()),
                r.parent_id
            ));
        }
        output
    }

    fn format_error(&self, error: &str) -> String {
        format!("error\n\"{}\"", escape_csv(error))
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// Convert a Value to JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(b) => serde_json::Value::String(format!("<{} bytes>", b.len())),
    }
}

/// Format a Value for CSV output.
fn format_value_csv(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) => format!("\"{}\"", escape_csv(s)),
        _ => value.to_string(),
    }
}

/// Quote a field only when it needs it.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", escape_csv(s))
    } else {
        s.to_string()
    }
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    s.replace('"', "\"\"")
}
