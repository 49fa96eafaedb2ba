//! Interactive menu shell.

use std::io;
use std::path::PathBuf;

use iotinv_core::Store;

use crate::error::CliResult;
use crate::formatter::OutputFormat;
use crate::prompt::EditorPrompt;
use crate::session::Session;

/// Get the history file path.
fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".iotinv_history")
}

/// Run the interactive shell on `store`.
pub fn run(store: &Store, format: OutputFormat) -> CliResult<()> {
    let mut prompt = EditorPrompt::new()?;
    let hist_path = history_path();
    prompt.load_history(&hist_path);

    println!("IoT inventory - type .help for commands, .exit to quit");

    let mut session = Session::new(store, prompt, io::stdout(), format);
    let result = session.run();

    let (mut prompt, _) = session.into_parts();
    prompt.save_history(&hist_path);

    result
}
