//! Dot-command handling, available at every prompt.

use crate::formatter::OutputFormat;

/// Result of executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Exit the session.
    Exit,
    /// Output to display.
    Output(String),
    /// Change the output format.
    SetFormat(OutputFormat),
    /// Run the integrity audit.
    Check,
    /// Show history.
    ShowHistory,
    /// Clear screen.
    Clear,
}

/// Parse a dot-command.
pub fn handle_command(line: &str, format: OutputFormat) -> CommandResult {
    let line = line.trim();
    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match command.as_str() {
        ".exit" | ".quit" | ".q" => CommandResult::Exit,

        ".help" | ".h" | ".?" => CommandResult::Output(get_help()),

        ".clear" | ".cls" => CommandResult::Clear,

        ".check" => CommandResult::Check,

        ".history" => CommandResult::ShowHistory,

        ".format" => match arg.map(str::to_lowercase).as_deref() {
            Some("table") => CommandResult::SetFormat(OutputFormat::Table),
            Some("json") => CommandResult::SetFormat(OutputFormat::Json),
            Some("csv") => CommandResult::SetFormat(OutputFormat::Csv),
            Some(other) => CommandResult::Output(format!(
                "Unknown format '{}'. Use: table, json, csv",
                other
            )),
            None => CommandResult::Output(format!("Current format: {}", format)),
        },

        _ => CommandResult::Output(format!("Unknown command: {}", command)),
    }
}

/// Check if a line is a dot-command.
pub fn is_command(line: &str) -> bool {
    line.trim().starts_with('.')
}

/// Get help text for dot-commands.
fn get_help() -> String {
    r#"Commands
========

.format [type]        Get or set output format (table, json, csv)
.check                List rows pointing at missing parents
.history              Show input history
.clear                Clear the screen
.help                 Show this help message
.exit / .quit         Exit

Menus
=====
Pick an entry by number. 0 goes back; Ctrl-C or Ctrl-D cancels the
current prompt. When updating, leave a field blank to keep its value.
"#
    .to_string()
}
