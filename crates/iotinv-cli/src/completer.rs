//! Tab completion for dot-commands.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// Dot-commands for completion.
const DOT_COMMANDS: &[&str] = &[
    ".check", ".clear", ".exit", ".format", ".help", ".history", ".quit",
];

/// Arguments of `.format`.
const FORMATS: &[&str] = &["csv", "json", "table"];

/// Line editor helper completing dot-commands and their arguments.
#[derive(Default)]
pub struct IotinvHelper;

impl IotinvHelper {
    pub fn new() -> Self {
        Self
    }

    /// Candidates for the text before the cursor, with the offset they replace from.
    fn candidates(line: &str) -> (usize, Vec<&'static str>) {
        let trimmed = line.trim_start();
        let offset = line.len() - trimmed.len();
        if !trimmed.starts_with('.') {
            return (0, Vec::new());
        }

        match trimmed.split_once(' ') {
            None => (
                offset,
                DOT_COMMANDS
                    .iter()
                    .copied()
                    .filter(|cmd| cmd.starts_with(trimmed))
                    .collect(),
            ),
            Some((".format", arg)) => {
                let arg = arg.trim_start();
                (
                    line.len() - arg.len(),
                    FORMATS
                        .iter()
                        .copied()
                        .filter(|f| f.starts_with(&arg.to_lowercase()))
                        .collect(),
                )
            }
            Some(_) => (0, Vec::new()),
        }
    }
}

impl Completer for IotinvHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = Self::candidates(&line[..pos]);
        let pairs = words
            .into_iter()
            .map(|w| Pair {
                display: w.to_string(),
                replacement: w.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for IotinvHelper {
    type Hint = String;
}

impl Highlighter for IotinvHelper {}

impl Validator for IotinvHelper {}

impl Helper for IotinvHelper {}
