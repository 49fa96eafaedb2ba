//! Line input for the menu session.

use std::path::Path;

use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Config, Editor};
use tracing::debug;

use crate::completer::IotinvHelper;
use crate::error::CliResult;

/// One read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A line of text, without its newline.
    Line(String),
    /// Ctrl-C: abandon the current prompt.
    Cancel,
    /// End of input.
    Eof,
}

/// Source of user input.
pub trait Prompt {
    /// Show `prompt` and read one line.
    fn read_line(&mut self, prompt: &str) -> CliResult<Input>;

    /// Previously entered lines, oldest first.
    fn history(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Interactive prompt backed by rustyline.
pub struct EditorPrompt {
    editor: Editor<IotinvHelper, DefaultHistory>,
}

impl EditorPrompt {
    /// Create an editor with dot-command completion.
    pub fn new() -> CliResult<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let mut editor: Editor<IotinvHelper, DefaultHistory> = Editor::with_config(config)?;
        editor.set_helper(Some(IotinvHelper::new()));
        Ok(Self { editor })
    }

    /// Load history from `path` if it exists.
    pub fn load_history(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        if let Err(e) = self.editor.load_history(path) {
            debug!(error = %e, path = %path.display(), "could not load history");
        }
    }

    /// Save history to `path`.
    pub fn save_history(&mut self, path: &Path) {
        if let Err(e) = self.editor.save_history(path) {
            debug!(error = %e, path = %path.display(), "could not save history");
        }
    }
}

impl Prompt for EditorPrompt {
    fn read_line(&mut self, prompt: &str) -> CliResult<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Cancel),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(err.into()),
        }
    }

    fn history(&self) -> Vec<String> {
        let history = self.editor.history();
        let mut entries = Vec::with_capacity(history.len());
        entries.extend(history.iter().cloned());
        entries
    }
}

/// Prompt that replays canned lines, then reports end of input.
#[cfg(test)]
pub struct ScriptedPrompt {
    lines: std::collections::VecDeque<String>,
    seen: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            seen: Vec::new(),
        }
    }

    /// Lines not consumed yet.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn read_line(&mut self, _prompt: &str) -> CliResult<Input> {
        match self.lines.pop_front() {
            Some(line) if line == "^C" => Ok(Input::Cancel),
            Some(line) => {
                self.seen.push(line.clone());
                Ok(Input::Line(line))
            }
            None => Ok(Input::Eof),
        }
    }

    fn history(&self) -> Vec<String> {
        self.seen.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompt() {
        let mut prompt = ScriptedPrompt::new(["1", "^C", "Lab"]);
        assert_eq!(prompt.read_line("> ").unwrap(), Input::Line("1".into()));
        assert_eq!(prompt.read_line("> ").unwrap(), Input::Cancel);
        assert_eq!(prompt.remaining(), 1);
        assert_eq!(prompt.read_line("> ").unwrap(), Input::Line("Lab".into()));
        assert_eq!(prompt.read_line("> ").unwrap(), Input::Eof);
        assert_eq!(prompt.history(), vec!["1", "Lab"]);
    }
}
